#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/lynchlab/screener/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # Example
//!
//! ```no_run
//! use screener::{parse_watchlist, Screener, ScreenerConfig, SnapshotLoader, DEFAULT_WATCHLIST};
//! use screener_cache::DiskCache;
//! use screener_yahoo::YahooProvider;
//! use std::sync::Arc;
//!
//! # async fn example() -> screener_core::Result<()> {
//! let loader = SnapshotLoader::new(
//!     Arc::new(YahooProvider::new()),
//!     Arc::new(DiskCache::new("stock_cache")?),
//!     ScreenerConfig::new(),
//! );
//!
//! let results = Screener::new(loader)
//!     .screen(&parse_watchlist(DEFAULT_WATCHLIST.iter().copied()))
//!     .await;
//!
//! for row in &results {
//!     println!("{}: {:?}", row.symbol, row.grades.composite);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod loader;
pub mod screen;

pub use config::ScreenerConfig;
pub use loader::SnapshotLoader;
pub use screen::{parse_watchlist, Screener, DEFAULT_WATCHLIST};

// Re-exported so callers can depend on this crate alone.
pub use screener_core::{
    DerivedMetrics, GradeSheet, MetricGap, MetricResult, RawSnapshot, Result, ScreenResult,
    ScreenerError, SnapshotCache, SnapshotProvider, Symbol,
};

#[cfg(feature = "yahoo")]
pub use screener_yahoo::YahooProvider;
