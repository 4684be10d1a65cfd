#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/lynchlab/screener/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Snapshot cache implementations for the fundamentals screener.
//!
//! This crate provides implementations of the
//! [`SnapshotCache`] trait from `screener-core`:
//!
//! - [`DiskCache`] - One JSON file per ticker under a cache root directory
//! - [`SqliteCache`] - Persistent SQLite-backed cache (default, requires the `sqlite` feature)
//! - [`InMemoryCache`] - Simple in-memory cache for testing
//! - [`NoopCache`] - No-op cache that doesn't store anything
//!
//! All backends share the same contract: one durable record per normalized
//! ticker key, atomic overwrite on refresh, and unreadable records reported
//! as misses rather than errors.

/// JSON-file-per-ticker cache implementation.
pub mod disk;
/// In-memory cache implementation.
pub mod memory;
/// No-op cache implementation.
pub mod noop;

/// SQLite-based cache implementation.
#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export the trait for convenience
pub use screener_core::SnapshotCache;

// Re-export implementations
pub use disk::DiskCache;
pub use memory::InMemoryCache;
pub use noop::NoopCache;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCache;
