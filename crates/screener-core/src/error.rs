//! Error types for screener operations.
//!
//! This module defines [`ScreenerError`] which covers the failures that can
//! occur while fetching or caching fundamentals snapshots. Per-metric
//! degradation is not an error; it is modeled by
//! [`MetricGap`](crate::types::MetricGap).

use thiserror::Error;

/// Errors that can occur while fetching or caching snapshots.
///
/// Every variant is a per-ticker failure: the batch driver logs it and moves
/// on to the next symbol, so none of these abort a screening run.
#[derive(Error, Debug)]
pub enum ScreenerError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded at the upstream source.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// The requested symbol was not found upstream.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// Error parsing a provider response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error interacting with the snapshot cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

/// Result type alias using [`ScreenerError`].
pub type Result<T> = std::result::Result<T, ScreenerError>;
