//! JSON-file-per-ticker cache implementation.

use async_trait::async_trait;
use screener_core::{CachedSnapshot, RawSnapshot, Result, ScreenerError, SnapshotCache, Symbol};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Disk cache storing one JSON file per normalized ticker key.
///
/// Each file holds a [`CachedSnapshot`] (the full snapshot plus its fetch
/// timestamp). Writes go through a temporary file and a rename, so a refresh
/// atomically supersedes the old record. A file that cannot be parsed is
/// treated as a miss, never as a fatal error.
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    /// Creates a disk cache rooted at the given directory, creating it if
    /// necessary.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| ScreenerError::Cache(e.to_string()))?;
        Ok(Self { root })
    }

    /// Returns the cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, symbol: &Symbol) -> PathBuf {
        self.root.join(format!("{}.json", symbol.as_str()))
    }

    fn read_entry(path: &Path) -> Result<Option<CachedSnapshot>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ScreenerError::Cache(e.to_string())),
        };

        match serde_json::from_slice::<CachedSnapshot>(&bytes) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                // Corrupt record: costs a re-fetch, nothing more.
                warn!(path = %path.display(), error = %e, "Unreadable cache record, treating as miss");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl SnapshotCache for DiskCache {
    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn get(&self, symbol: &Symbol) -> Result<Option<CachedSnapshot>> {
        let entry = Self::read_entry(&self.entry_path(symbol))?;
        match &entry {
            Some(_) => debug!("Cache hit for snapshot"),
            None => debug!("Cache miss for snapshot"),
        }
        Ok(entry)
    }

    #[instrument(skip(self, snapshot), fields(symbol = %symbol))]
    async fn put(&self, symbol: &Symbol, snapshot: &RawSnapshot) -> Result<()> {
        let entry = CachedSnapshot::new(snapshot.clone());
        let json = serde_json::to_vec_pretty(&entry)
            .map_err(|e| ScreenerError::Cache(e.to_string()))?;

        let path = self.entry_path(symbol);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| ScreenerError::Cache(e.to_string()))?;
        fs::rename(&tmp, &path).map_err(|e| ScreenerError::Cache(e.to_string()))?;

        debug!("Cached snapshot");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let mut removed = 0usize;

        let entries = fs::read_dir(&self.root).map_err(|e| ScreenerError::Cache(e.to_string()))?;
        for dir_entry in entries {
            let dir_entry = dir_entry.map_err(|e| ScreenerError::Cache(e.to_string()))?;
            let path = dir_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            // Unparsable records are removed along with stale ones.
            let stale = match Self::read_entry(&path)? {
                Some(entry) => entry.is_stale(ttl),
                None => true,
            };
            if stale && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!("Invalidated {} stale cache records", removed);
        }
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let entries = fs::read_dir(&self.root).map_err(|e| ScreenerError::Cache(e.to_string()))?;
        for dir_entry in entries {
            let dir_entry = dir_entry.map_err(|e| ScreenerError::Cache(e.to_string()))?;
            let path = dir_entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                fs::remove_file(&path).map_err(|e| ScreenerError::Cache(e.to_string()))?;
            }
        }
        debug!("Cleared all cache records");
        Ok(())
    }
}
