//! In-memory cache implementation.

use async_trait::async_trait;
use screener_core::{CachedSnapshot, RawSnapshot, Result, SnapshotCache, Symbol};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Simple in-memory cache for testing and development.
///
/// Snapshots are stored in an `RwLock`-protected `HashMap` and are lost when
/// the cache is dropped. Entries are cloned on get/put operations.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<Symbol, CachedSnapshot>>,
}

impl InMemoryCache {
    /// Create a new empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotCache for InMemoryCache {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn get(&self, symbol: &Symbol) -> Result<Option<CachedSnapshot>> {
        let entries = self.entries.read().await;
        match entries.get(symbol) {
            Some(entry) => {
                debug!("Cache hit for snapshot");
                Ok(Some(entry.clone()))
            }
            None => {
                debug!("Cache miss for snapshot");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, snapshot), fields(symbol = %symbol))]
    async fn put(&self, symbol: &Symbol, snapshot: &RawSnapshot) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(symbol.clone(), CachedSnapshot::new(snapshot.clone()));
        debug!("Cached snapshot");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_stale(ttl));
        let removed = before - entries.len();

        if removed > 0 {
            debug!("Invalidated {} stale cache entries", removed);
        }
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        debug!("Cleared all cache entries");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache = InMemoryCache::new();
        let symbol = Symbol::new("AAPL");

        assert!(cache.get(&symbol).await.unwrap().is_none());

        let mut snapshot = RawSnapshot::new(symbol.clone());
        snapshot.profile.trailing_pe = Some(28.5);
        cache.put(&symbol, &snapshot).await.unwrap();

        let entry = cache.get(&symbol).await.unwrap().unwrap();
        assert_eq!(entry.snapshot.profile.trailing_pe, Some(28.5));
    }

    #[tokio::test]
    async fn invalidate_stale_respects_ttl() {
        let cache = InMemoryCache::new();
        let symbol = Symbol::new("NU");
        cache.put(&symbol, &RawSnapshot::new(symbol.clone())).await.unwrap();

        assert_eq!(
            cache
                .invalidate_stale(Duration::from_secs(3600))
                .await
                .unwrap(),
            0
        );
        assert_eq!(cache.invalidate_stale(Duration::ZERO).await.unwrap(), 1);
        assert!(cache.get(&symbol).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let cache = InMemoryCache::new();
        let symbol = Symbol::new("SABR");
        cache.put(&symbol, &RawSnapshot::new(symbol.clone())).await.unwrap();

        cache.clear().await.unwrap();
        assert!(cache.get(&symbol).await.unwrap().is_none());
    }
}
