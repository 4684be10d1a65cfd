//! Cached snapshot retrieval with provider rate limiting.

use rand::Rng;
use screener_core::{RawSnapshot, Result, SnapshotCache, SnapshotProvider, Symbol};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::config::ScreenerConfig;

/// Serves snapshots from the cache when they are still fresh and falls back
/// to the provider otherwise.
///
/// Every provider call is preceded by a randomized pause drawn uniformly
/// from the configured delay bounds, keeping request spacing irregular
/// enough to stay under upstream rate limits. Cache write failures are
/// logged and swallowed; the freshly fetched snapshot is still returned.
pub struct SnapshotLoader {
    provider: Arc<dyn SnapshotProvider>,
    cache: Arc<dyn SnapshotCache>,
    config: ScreenerConfig,
}

impl std::fmt::Debug for SnapshotLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotLoader")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SnapshotLoader {
    /// Create a loader from a provider, a cache backend and a configuration.
    #[must_use]
    pub fn new(
        provider: Arc<dyn SnapshotProvider>,
        cache: Arc<dyn SnapshotCache>,
        config: ScreenerConfig,
    ) -> Self {
        Self {
            provider,
            cache,
            config,
        }
    }

    /// Load the snapshot for a symbol, from the cache if fresh.
    ///
    /// A cached snapshot older than the configured lifetime is ignored and
    /// replaced by a fresh provider fetch. Repeated calls within the
    /// lifetime hit the provider exactly once.
    ///
    /// # Errors
    /// Returns an error when the cache lookup fails hard or the provider
    /// fetch fails. An unreadable cache record is a miss, not an error.
    #[instrument(skip(self), fields(symbol = %symbol, provider = self.provider.name()))]
    pub async fn load(&self, symbol: &Symbol) -> Result<RawSnapshot> {
        if let Some(entry) = self.cache.get(symbol).await? {
            if entry.is_stale(self.config.cache_ttl) {
                debug!("Cached snapshot expired, re-fetching");
            } else {
                debug!("Serving snapshot from cache");
                return Ok(entry.snapshot);
            }
        }

        self.pause().await;

        let snapshot = self.provider.fetch(symbol).await?;

        if let Err(e) = self.cache.put(symbol, &snapshot).await {
            warn!(error = %e, "Failed to cache snapshot");
        }

        Ok(snapshot)
    }

    /// Sleep for a uniformly random duration within the configured bounds.
    async fn pause(&self) {
        let (min, max) = (self.config.delay_min, self.config.delay_max);
        if max.is_zero() {
            return;
        }
        let secs = if min < max {
            rand::thread_rng().gen_range(min.as_secs_f64()..=max.as_secs_f64())
        } else {
            max.as_secs_f64()
        };
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }

    /// Drop every cached snapshot older than the configured lifetime and
    /// return how many records were removed.
    ///
    /// # Errors
    /// Returns an error when the backend cannot enumerate or delete records.
    pub async fn evict_expired(&self) -> Result<usize> {
        self.cache.invalidate_stale(self.config.cache_ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use screener_cache::{InMemoryCache, NoopCache};
    use screener_core::ScreenerError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SnapshotProvider for CountingProvider {
        fn name(&self) -> &str {
            "Counting"
        }

        async fn fetch(&self, symbol: &Symbol) -> Result<RawSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut snapshot = RawSnapshot::new(symbol.clone());
            snapshot.profile.trailing_pe = Some(20.0);
            Ok(snapshot)
        }
    }

    #[derive(Debug)]
    struct FailingProvider;

    #[async_trait]
    impl SnapshotProvider for FailingProvider {
        fn name(&self) -> &str {
            "Failing"
        }

        async fn fetch(&self, symbol: &Symbol) -> Result<RawSnapshot> {
            Err(ScreenerError::SymbolNotFound(symbol.to_string()))
        }
    }

    fn loader(provider: Arc<dyn SnapshotProvider>, cache: Arc<dyn SnapshotCache>) -> SnapshotLoader {
        SnapshotLoader::new(provider, cache, ScreenerConfig::new().without_delay())
    }

    #[tokio::test]
    async fn second_load_within_lifetime_skips_provider() {
        let provider = Arc::new(CountingProvider::default());
        let subject = loader(provider.clone(), Arc::new(InMemoryCache::new()));
        let symbol = Symbol::new("AAPL");

        subject.load(&symbol).await.unwrap();
        subject.load(&symbol).await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_lifetime_forces_refetch() {
        let provider = Arc::new(CountingProvider::default());
        let config = ScreenerConfig::new()
            .with_cache_ttl(Duration::ZERO)
            .without_delay();
        let subject = SnapshotLoader::new(
            provider.clone(),
            Arc::new(InMemoryCache::new()),
            config,
        );
        let symbol = Symbol::new("NVDA");

        subject.load(&symbol).await.unwrap();
        subject.load(&symbol).await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let subject = loader(Arc::new(FailingProvider), Arc::new(NoopCache::new()));

        let err = subject.load(&Symbol::new("NOPE")).await.unwrap_err();
        assert!(matches!(err, ScreenerError::SymbolNotFound(_)));
    }

    #[tokio::test]
    async fn fetched_snapshot_lands_in_cache() {
        let cache = Arc::new(InMemoryCache::new());
        let subject = loader(Arc::new(CountingProvider::default()), cache.clone());
        let symbol = Symbol::new("SHOP");

        subject.load(&symbol).await.unwrap();

        let entry = cache.get(&symbol).await.unwrap().unwrap();
        assert_eq!(entry.snapshot.profile.trailing_pe, Some(20.0));
    }
}
