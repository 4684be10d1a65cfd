//! Pipeline configuration.

use std::time::Duration;

/// Default snapshot lifetime before a re-fetch is required.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default bounds for the randomized pause before each provider call.
pub const DEFAULT_DELAY_MIN: Duration = Duration::from_millis(800);
/// See [`DEFAULT_DELAY_MIN`].
pub const DEFAULT_DELAY_MAX: Duration = Duration::from_millis(1400);

/// Configuration for the screening pipeline.
///
/// # Example
///
/// ```rust
/// use screener::ScreenerConfig;
/// use std::time::Duration;
///
/// let config = ScreenerConfig::new()
///     .with_cache_ttl(Duration::from_secs(3600))
///     .without_delay();
/// ```
#[derive(Debug, Clone)]
pub struct ScreenerConfig {
    /// How long a cached snapshot stays fresh.
    pub cache_ttl: Duration,
    /// Lower bound of the pause inserted before each provider call.
    pub delay_min: Duration,
    /// Upper bound of the pause inserted before each provider call.
    pub delay_max: Duration,
}

impl ScreenerConfig {
    /// Create a configuration with default settings: a 24 hour snapshot
    /// lifetime and a 0.8 to 1.4 second pre-fetch pause.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            delay_min: DEFAULT_DELAY_MIN,
            delay_max: DEFAULT_DELAY_MAX,
        }
    }

    /// Set the snapshot lifetime.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the bounds of the randomized pre-fetch pause.
    #[must_use]
    pub const fn with_delay(mut self, min: Duration, max: Duration) -> Self {
        self.delay_min = min;
        self.delay_max = max;
        self
    }

    /// Disable the pre-fetch pause entirely.
    #[must_use]
    pub const fn without_delay(mut self) -> Self {
        self.delay_min = Duration::ZERO;
        self.delay_max = Duration::ZERO;
        self
    }
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ScreenerConfig::default();
        assert_eq!(config.cache_ttl, Duration::from_secs(86_400));
        assert_eq!(config.delay_min, Duration::from_millis(800));
        assert_eq!(config.delay_max, Duration::from_millis(1400));
    }

    #[test]
    fn without_delay_zeroes_both_bounds() {
        let config = ScreenerConfig::new().without_delay();
        assert_eq!(config.delay_min, Duration::ZERO);
        assert_eq!(config.delay_max, Duration::ZERO);
    }
}
