#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/lynchlab/screener/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for the fundamentals screener.
//!
//! This crate provides the foundational abstractions for screening equities
//! against a fundamentals checklist:
//!
//! - [`SnapshotProvider`](provider::SnapshotProvider) - Upstream fundamentals source
//! - [`SnapshotCache`](cache::SnapshotCache) - Snapshot persistence abstraction
//! - [`metrics`] - Pure derivation of valuation/growth metrics
//! - [`grading`] - Threshold-table grading and the composite grade

/// Cache trait for storing fetched snapshots.
pub mod cache;
/// Error types for screener operations.
pub mod error;
/// Threshold-table grading of derived metrics.
pub mod grading;
/// Pure metric derivation from a fundamentals snapshot.
pub mod metrics;
/// Provider trait for fetching fundamentals snapshots.
pub mod provider;
/// Core data types (Symbol, RawSnapshot, DerivedMetrics, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use cache::SnapshotCache;
pub use error::{Result, ScreenerError};
pub use provider::SnapshotProvider;
pub use types::{
    BalancePeriod, CachedSnapshot, CompanyProfile, ConsensusEstimates, DerivedMetrics, GradeSheet,
    IncomePeriod, MetricGap, MetricResult, RawSnapshot, ScreenResult, Symbol,
};
