//! Watchlist screening and ranking.

use screener_core::{grading, metrics, ScreenResult, Symbol};
use std::cmp::Ordering;
use tracing::{debug, warn};

use crate::loader::SnapshotLoader;

/// Tickers screened when no explicit watchlist is given.
pub const DEFAULT_WATCHLIST: &[&str] = &[
    "SMCI", "NU", "SHOP", "MELI", "NVDA", "TSM", "NICE", "SABR", "DAVA", "ON", "ADBE", "FIS",
    "NXPI",
];

/// Runs a watchlist through retrieval, metric derivation and grading.
#[derive(Debug)]
pub struct Screener {
    loader: SnapshotLoader,
}

impl Screener {
    /// Create a screener on top of a configured loader.
    #[must_use]
    pub const fn new(loader: SnapshotLoader) -> Self {
        Self { loader }
    }

    /// Screen every ticker in the watchlist and return the results ranked
    /// best-first.
    ///
    /// Tickers whose retrieval fails are logged and dropped; one bad symbol
    /// never aborts the run. The ranking sorts ascending by composite grade
    /// and pushes ungraded rows to the end, preserving watchlist order
    /// among ties.
    pub async fn screen(&self, watchlist: &[Symbol]) -> Vec<ScreenResult> {
        let mut results = Vec::with_capacity(watchlist.len());

        for symbol in watchlist {
            match self.loader.load(symbol).await {
                Ok(snapshot) => {
                    let derived = metrics::derive(&snapshot);
                    let grades = grading::grade(&derived);
                    debug!(symbol = %symbol, composite = ?grades.composite, "Screened");
                    results.push(ScreenResult {
                        symbol: symbol.clone(),
                        metrics: derived,
                        grades,
                    });
                }
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Skipping ticker");
                }
            }
        }

        rank(&mut results);
        results
    }

    /// Screen a single ticker.
    ///
    /// # Errors
    /// Returns the retrieval error instead of dropping the row.
    pub async fn screen_one(&self, symbol: &Symbol) -> screener_core::Result<ScreenResult> {
        let snapshot = self.loader.load(symbol).await?;
        let derived = metrics::derive(&snapshot);
        let grades = grading::grade(&derived);
        Ok(ScreenResult {
            symbol: symbol.clone(),
            metrics: derived,
            grades,
        })
    }

    /// Access the underlying loader.
    #[must_use]
    pub const fn loader(&self) -> &SnapshotLoader {
        &self.loader
    }
}

/// Stable ascending sort by composite grade; ungraded rows go last.
fn rank(results: &mut [ScreenResult]) {
    results.sort_by(|a, b| match (a.grades.composite, b.grades.composite) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Parse a watchlist of ticker strings into normalized symbols.
#[must_use]
pub fn parse_watchlist<I, S>(tickers: I) -> Vec<Symbol>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tickers
        .into_iter()
        .map(|t| Symbol::new(t.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScreenerConfig;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use screener_cache::NoopCache;
    use screener_core::{
        GradeSheet, IncomePeriod, RawSnapshot, Result, ScreenerError, SnapshotProvider,
    };
    use std::sync::Arc;

    /// Serves canned snapshots keyed by symbol; unknown symbols fail.
    #[derive(Debug, Default)]
    struct FixtureProvider {
        snapshots: std::collections::HashMap<String, RawSnapshot>,
    }

    impl FixtureProvider {
        fn with(mut self, snapshot: RawSnapshot) -> Self {
            self.snapshots
                .insert(snapshot.symbol.to_string(), snapshot);
            self
        }
    }

    #[async_trait]
    impl SnapshotProvider for FixtureProvider {
        fn name(&self) -> &str {
            "Fixture"
        }

        async fn fetch(&self, symbol: &Symbol) -> Result<RawSnapshot> {
            self.snapshots
                .get(symbol.as_str())
                .cloned()
                .ok_or_else(|| ScreenerError::SymbolNotFound(symbol.to_string()))
        }
    }

    fn annual(year: i32, eps: f64) -> IncomePeriod {
        IncomePeriod::new(NaiveDate::from_ymd_opt(year, 12, 31).unwrap()).with_diluted_eps(eps)
    }

    /// Four years of EPS history plus a trailing P/E, enough to grade.
    fn gradeable(symbol: &str, pe: f64) -> RawSnapshot {
        let mut snapshot = RawSnapshot::new(Symbol::new(symbol));
        snapshot.profile.trailing_pe = Some(pe);
        snapshot.income_annual = vec![
            annual(2025, 2.0),
            annual(2024, 1.5),
            annual(2023, 1.2),
            annual(2022, 1.0),
        ];
        snapshot
    }

    fn screener(provider: FixtureProvider) -> Screener {
        Screener::new(SnapshotLoader::new(
            Arc::new(provider),
            Arc::new(NoopCache::new()),
            ScreenerConfig::new().without_delay(),
        ))
    }

    #[tokio::test]
    async fn failed_tickers_are_dropped_not_fatal() {
        let subject = screener(FixtureProvider::default().with(gradeable("GOOD", 20.0)));
        let watchlist = parse_watchlist(["GOOD", "MISSING"]);

        let results = subject.screen(&watchlist).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].symbol.as_str(), "GOOD");
    }

    #[tokio::test]
    async fn results_rank_ascending_with_ungraded_last() {
        // A cheap stock (low P/E for the same growth) grades better than an
        // expensive one; an empty snapshot grades not at all.
        let provider = FixtureProvider::default()
            .with(gradeable("CHEAP", 15.0))
            .with(gradeable("DEAR", 60.0))
            .with(RawSnapshot::new(Symbol::new("EMPTY")));
        let subject = screener(provider);
        let watchlist = parse_watchlist(["EMPTY", "DEAR", "CHEAP"]);

        let results = subject.screen(&watchlist).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].symbol.as_str(), "CHEAP");
        assert_eq!(results[1].symbol.as_str(), "DEAR");
        assert_eq!(results[2].symbol.as_str(), "EMPTY");
        assert!(results[2].grades.composite.is_none());
    }

    #[tokio::test]
    async fn ranking_preserves_input_order_on_ties() {
        let provider = FixtureProvider::default()
            .with(gradeable("AAA", 20.0))
            .with(gradeable("BBB", 20.0));
        let subject = screener(provider);
        let watchlist = parse_watchlist(["BBB", "AAA"]);

        let results = subject.screen(&watchlist).await;

        assert_eq!(results[0].symbol.as_str(), "BBB");
        assert_eq!(results[1].symbol.as_str(), "AAA");
    }

    #[tokio::test]
    async fn screen_one_surfaces_the_error() {
        let subject = screener(FixtureProvider::default());

        let err = subject.screen_one(&Symbol::new("GONE")).await.unwrap_err();
        assert!(matches!(err, ScreenerError::SymbolNotFound(_)));
    }

    #[test]
    fn rank_handles_all_null_composites() {
        let mut rows = vec![
            ScreenResult {
                symbol: Symbol::new("A"),
                metrics: metrics::derive(&RawSnapshot::new(Symbol::new("A"))),
                grades: GradeSheet::default(),
            },
            ScreenResult {
                symbol: Symbol::new("B"),
                metrics: metrics::derive(&RawSnapshot::new(Symbol::new("B"))),
                grades: GradeSheet::default(),
            },
        ];
        rank(&mut rows);
        assert_eq!(rows[0].symbol.as_str(), "A");
    }

    #[test]
    fn default_watchlist_is_normalized() {
        let symbols = parse_watchlist(DEFAULT_WATCHLIST.iter().copied());
        assert_eq!(symbols.len(), 13);
        assert!(symbols.iter().all(|s| s.as_str() == s.as_str().to_uppercase()));
    }
}
