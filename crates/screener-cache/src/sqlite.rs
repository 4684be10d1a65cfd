//! SQLite-based cache implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use screener_core::{CachedSnapshot, RawSnapshot, Result, ScreenerError, SnapshotCache, Symbol};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// SQLite-based snapshot cache.
///
/// Stores one row per normalized ticker key in a single database file,
/// providing persistence across application restarts. The snapshot payload
/// is serialized as JSON; an `INSERT OR REPLACE` supersedes the old record
/// atomically.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Create a new SQLite cache at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation
    /// fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| ScreenerError::Cache(e.to_string()))?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory SQLite cache.
    ///
    /// Useful for testing; data is lost when the cache is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| ScreenerError::Cache(e.to_string()))?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ScreenerError::Cache(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS snapshot_cache (
                symbol TEXT NOT NULL PRIMARY KEY,
                fetched_at TEXT NOT NULL,
                payload TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| ScreenerError::Cache(e.to_string()))?;

        debug!("SQLite cache schema initialized");
        Ok(())
    }
}

#[async_trait]
impl SnapshotCache for SqliteCache {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn get(&self, symbol: &Symbol) -> Result<Option<CachedSnapshot>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ScreenerError::Cache(e.to_string()))?;

        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM snapshot_cache WHERE symbol = ?1",
                params![symbol.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ScreenerError::Cache(e.to_string()))?;

        let Some(payload) = payload else {
            debug!("Cache miss for snapshot");
            return Ok(None);
        };

        match serde_json::from_str::<CachedSnapshot>(&payload) {
            Ok(entry) => {
                debug!("Cache hit for snapshot");
                Ok(Some(entry))
            }
            Err(e) => {
                // Corrupt record: costs a re-fetch, nothing more.
                warn!(error = %e, "Unreadable cache record, treating as miss");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, snapshot), fields(symbol = %symbol))]
    async fn put(&self, symbol: &Symbol, snapshot: &RawSnapshot) -> Result<()> {
        let entry = CachedSnapshot::new(snapshot.clone());
        let payload =
            serde_json::to_string(&entry).map_err(|e| ScreenerError::Cache(e.to_string()))?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| ScreenerError::Cache(e.to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO snapshot_cache (symbol, fetched_at, payload)
             VALUES (?1, ?2, ?3)",
            params![symbol.as_str(), entry.fetched_at.to_rfc3339(), payload],
        )
        .map_err(|e| ScreenerError::Cache(e.to_string()))?;

        debug!("Cached snapshot");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ScreenerError::Cache(e.to_string()))?;

        let mut stmt = conn
            .prepare("SELECT symbol, fetched_at FROM snapshot_cache")
            .map_err(|e| ScreenerError::Cache(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| ScreenerError::Cache(e.to_string()))?;

        // Unparsable timestamps count as stale.
        let mut stale: Vec<String> = Vec::new();
        for row in rows {
            let (symbol, fetched_at) = row.map_err(|e| ScreenerError::Cache(e.to_string()))?;
            let expired = match DateTime::parse_from_rfc3339(&fetched_at) {
                Ok(ts) => {
                    let age = Utc::now().signed_duration_since(ts.with_timezone(&Utc));
                    age > chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX)
                }
                Err(_) => true,
            };
            if expired {
                stale.push(symbol);
            }
        }
        drop(stmt);

        let mut removed = 0usize;
        for symbol in &stale {
            removed += conn
                .execute(
                    "DELETE FROM snapshot_cache WHERE symbol = ?1",
                    params![symbol],
                )
                .map_err(|e| ScreenerError::Cache(e.to_string()))?;
        }

        if removed > 0 {
            debug!("Invalidated {} stale cache records", removed);
        }
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ScreenerError::Cache(e.to_string()))?;

        conn.execute("DELETE FROM snapshot_cache", [])
            .map_err(|e| ScreenerError::Cache(e.to_string()))?;

        debug!("Cleared all cache records");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(symbol: &str, pe: f64) -> RawSnapshot {
        let mut snapshot = RawSnapshot::new(Symbol::new(symbol));
        snapshot.profile.trailing_pe = Some(pe);
        snapshot
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache = SqliteCache::in_memory().unwrap();
        let symbol = Symbol::new("AAPL");

        assert!(cache.get(&symbol).await.unwrap().is_none());

        cache.put(&symbol, &snapshot("AAPL", 28.5)).await.unwrap();
        let entry = cache.get(&symbol).await.unwrap().unwrap();
        assert_eq!(entry.snapshot.profile.trailing_pe, Some(28.5));
    }

    #[tokio::test]
    async fn put_supersedes_previous_record() {
        let cache = SqliteCache::in_memory().unwrap();
        let symbol = Symbol::new("NVDA");

        cache.put(&symbol, &snapshot("NVDA", 40.0)).await.unwrap();
        cache.put(&symbol, &snapshot("NVDA", 42.0)).await.unwrap();

        let entry = cache.get(&symbol).await.unwrap().unwrap();
        assert_eq!(entry.snapshot.profile.trailing_pe, Some(42.0));
    }

    #[tokio::test]
    async fn corrupt_payload_is_a_miss() {
        let cache = SqliteCache::in_memory().unwrap();
        let symbol = Symbol::new("DAVA");

        {
            let conn = cache.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO snapshot_cache (symbol, fetched_at, payload)
                 VALUES ('DAVA', '2026-01-01T00:00:00+00:00', 'not json')",
                [],
            )
            .unwrap();
        }

        assert!(cache.get(&symbol).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalidate_stale_removes_expired_records() {
        let cache = SqliteCache::in_memory().unwrap();
        cache
            .put(&Symbol::new("MELI"), &snapshot("MELI", 55.0))
            .await
            .unwrap();

        assert_eq!(
            cache
                .invalidate_stale(Duration::from_secs(3600))
                .await
                .unwrap(),
            0
        );
        assert_eq!(cache.invalidate_stale(Duration::ZERO).await.unwrap(), 1);
        assert!(cache.get(&Symbol::new("MELI")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_removes_all_records() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.put(&Symbol::new("TSM"), &snapshot("TSM", 25.0)).await.unwrap();
        cache.clear().await.unwrap();
        assert!(cache.get(&Symbol::new("TSM")).await.unwrap().is_none());
    }
}
