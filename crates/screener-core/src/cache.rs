//! Cache trait for storing fetched fundamentals snapshots.
//!
//! This module defines the [`SnapshotCache`] trait that provides a unified
//! interface over the cache backends (disk, SQLite, in-memory).

use async_trait::async_trait;
use std::time::Duration;

use crate::{
    error::Result,
    types::{CachedSnapshot, RawSnapshot, Symbol},
};

/// Trait for persisting fetched snapshots.
///
/// Backends store one durable record per symbol: the full [`RawSnapshot`]
/// plus its fetch timestamp. A `put` for an existing symbol atomically
/// supersedes the old record. Freshness is the caller's concern; `get`
/// returns whatever is stored and the caller checks the entry's age.
///
/// An unreadable record must be reported as a miss (`Ok(None)`), not as an
/// error: cache corruption only costs a re-fetch.
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    /// Retrieves the cached snapshot for a symbol, if any.
    async fn get(&self, symbol: &Symbol) -> Result<Option<CachedSnapshot>>;

    /// Stores a snapshot for a symbol, overwriting any existing record.
    async fn put(&self, symbol: &Symbol, snapshot: &RawSnapshot) -> Result<()>;

    /// Removes cache entries older than the given TTL.
    ///
    /// Returns the number of entries removed.
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize>;

    /// Clears all cached snapshots.
    async fn clear(&self) -> Result<()>;
}
