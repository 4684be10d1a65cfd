//! Provider trait for fetching fundamentals snapshots.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::Result, types::RawSnapshot, types::Symbol};

/// A source of per-ticker fundamentals snapshots.
///
/// Implementations must fetch the profile, annual and quarterly income
/// statements, balance sheet and consensus estimates in a single logical
/// round, so the returned [`RawSnapshot`] is temporally consistent. The
/// pieces are never re-fetched independently.
#[async_trait]
pub trait SnapshotProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "Yahoo Finance"), used for
    /// log attribution.
    fn name(&self) -> &str;

    /// Fetches a full fundamentals snapshot for a symbol.
    ///
    /// Fails with a [`ScreenerError`](crate::ScreenerError) on an unknown
    /// symbol, a network failure, or a malformed upstream response.
    async fn fetch(&self, symbol: &Symbol) -> Result<RawSnapshot>;
}
