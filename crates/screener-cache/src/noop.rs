//! No-op cache implementation.

use async_trait::async_trait;
use screener_core::{CachedSnapshot, RawSnapshot, Result, SnapshotCache, Symbol};
use std::time::Duration;
use tracing::trace;

/// A no-op cache that doesn't store anything.
///
/// `get` always returns `Ok(None)` and `put` returns `Ok(())`. Useful for
/// disabling caching or testing code paths without cache hits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl NoopCache {
    /// Create a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SnapshotCache for NoopCache {
    async fn get(&self, _symbol: &Symbol) -> Result<Option<CachedSnapshot>> {
        trace!("NoopCache: get called, returning None");
        Ok(None)
    }

    async fn put(&self, _symbol: &Symbol, _snapshot: &RawSnapshot) -> Result<()> {
        trace!("NoopCache: put called, doing nothing");
        Ok(())
    }

    async fn invalidate_stale(&self, _ttl: Duration) -> Result<usize> {
        trace!("NoopCache: invalidate_stale called, nothing to do");
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        trace!("NoopCache: clear called, nothing to do");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn never_stores_anything() {
        let cache = NoopCache::new();
        let symbol = Symbol::new("AAPL");

        cache.put(&symbol, &RawSnapshot::new(symbol.clone())).await.unwrap();
        assert!(cache.get(&symbol).await.unwrap().is_none());
        assert_eq!(cache.invalidate_stale(Duration::ZERO).await.unwrap(), 0);
    }
}
