//! ResourceStore: redb-backed blob store for fixture artifacts.
//!
//! Provides the path-addressed operations the fixture needs: existence
//! checks, reads, deletes, stamped puts, a stamp-checked put for
//! read-modify-write callers, prefix listing, full reset, and bulk import
//! from a local directory tree.

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableDatabase, ReadableTable};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::tables::*;

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StoreError::$variant(e.to_string())
    };
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A stored blob and its last-modified stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResource {
    pub content: Vec<u8>,
    /// Epoch milliseconds.
    pub timestamp: u64,
}

/// Thread-safe resource store backed by redb.
#[derive(Clone)]
pub struct ResourceStore {
    db: Arc<Database>,
}

impl ResourceStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "resource store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory resource store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(RESOURCES).map_err(map_err!(Table))?;
        txn.open_table(TIMESTAMPS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Reads ──────────────────────────────────────────────────────

    pub fn exists(&self, path: &str) -> StoreResult<bool> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
        Ok(table.get(path).map_err(map_err!(Read))?.is_some())
    }

    /// Read a resource, or `None` if nothing is stored at `path`.
    pub fn get_resource(&self, path: &str) -> StoreResult<Option<RawResource>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let content_table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
        let stamp_table = txn.open_table(TIMESTAMPS).map_err(map_err!(Table))?;
        let Some(guard) = content_table.get(path).map_err(map_err!(Read))? else {
            return Ok(None);
        };
        let content = guard.value().to_vec();
        let timestamp = stamp_table
            .get(path)
            .map_err(map_err!(Read))?
            .map(|g| g.value())
            .unwrap_or(0);
        Ok(Some(RawResource { content, timestamp }))
    }

    /// Last-modified stamp of a resource.
    pub fn get_timestamp(&self, path: &str) -> StoreResult<Option<u64>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(TIMESTAMPS).map_err(map_err!(Table))?;
        Ok(table.get(path).map_err(map_err!(Read))?.map(|g| g.value()))
    }

    /// List resource paths under `prefix`, in key order.
    pub fn list_resources(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, _) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(prefix) {
                results.push(key.value().to_string());
            }
        }
        Ok(results)
    }

    // ── Writes ─────────────────────────────────────────────────────

    /// Store `content` at `path`, replacing anything already there.
    pub fn put_resource(&self, path: &str, content: &[u8], timestamp: u64) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut content_table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
            let mut stamp_table = txn.open_table(TIMESTAMPS).map_err(map_err!(Table))?;
            content_table.insert(path, content).map_err(map_err!(Write))?;
            stamp_table.insert(path, timestamp).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%path, bytes = content.len(), timestamp, "resource stored");
        Ok(())
    }

    /// Store `content` only if the current stamp still equals
    /// `expected` (`None` meaning "no resource yet").
    ///
    /// The check and the replacement happen in one write transaction, so a
    /// concurrent writer surfaces as [`StoreError::WriteConflict`] rather
    /// than a lost update.
    pub fn check_and_put_resource(
        &self,
        path: &str,
        content: &[u8],
        timestamp: u64,
        expected: Option<u64>,
    ) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut content_table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
            let mut stamp_table = txn.open_table(TIMESTAMPS).map_err(map_err!(Table))?;
            let actual = if content_table.get(path).map_err(map_err!(Read))?.is_some() {
                Some(
                    stamp_table
                        .get(path)
                        .map_err(map_err!(Read))?
                        .map(|g| g.value())
                        .unwrap_or(0),
                )
            } else {
                None
            };
            if actual != expected {
                // Dropping the transaction without commit aborts it.
                return Err(StoreError::WriteConflict {
                    path: path.to_string(),
                    expected,
                    actual,
                });
            }
            content_table.insert(path, content).map_err(map_err!(Write))?;
            stamp_table.insert(path, timestamp).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%path, bytes = content.len(), timestamp, "resource replaced");
        Ok(())
    }

    /// Delete a resource. Returns true if it existed.
    pub fn delete_resource(&self, path: &str) -> StoreResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut content_table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
            let mut stamp_table = txn.open_table(TIMESTAMPS).map_err(map_err!(Table))?;
            existed = content_table.remove(path).map_err(map_err!(Write))?.is_some();
            stamp_table.remove(path).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%path, existed, "resource deleted");
        Ok(existed)
    }

    /// Remove every resource. Returns the number deleted.
    pub fn reset(&self) -> StoreResult<usize> {
        let keys = self.list_resources("")?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut content_table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
            let mut stamp_table = txn.open_table(TIMESTAMPS).map_err(map_err!(Table))?;
            for key in &keys {
                content_table.remove(key.as_str()).map_err(map_err!(Write))?;
                stamp_table.remove(key.as_str()).map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(count = keys.len(), "resource store reset");
        Ok(keys.len())
    }

    /// Import every file under `dir` as resource `/<relative path>`.
    /// Returns the number of resources written.
    pub fn copy_from_dir(&self, dir: &Path, timestamp: u64) -> StoreResult<usize> {
        if !dir.is_dir() {
            return Err(StoreError::NotFound(dir.display().to_string()));
        }
        let mut entries = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| StoreError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(dir)
                .map_err(map_err!(Read))?
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            entries.push((format!("/{relative}"), std::fs::read(entry.path())?));
        }

        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut content_table = txn.open_table(RESOURCES).map_err(map_err!(Table))?;
            let mut stamp_table = txn.open_table(TIMESTAMPS).map_err(map_err!(Table))?;
            for (path, content) in &entries {
                content_table
                    .insert(path.as_str(), content.as_slice())
                    .map_err(map_err!(Write))?;
                stamp_table
                    .insert(path.as_str(), timestamp)
                    .map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(?dir, count = entries.len(), "resources imported");
        Ok(entries.len())
    }

    // ── JSON helpers ───────────────────────────────────────────────

    /// Read and deserialize a JSON resource.
    pub fn get_json<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Option<T>> {
        match self.get_resource(path)? {
            Some(raw) => serde_json::from_slice(&raw.content)
                .map(Some)
                .map_err(|e| StoreError::Deserialize {
                    path: path.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    /// Serialize and store a JSON resource.
    pub fn put_json<T: Serialize>(&self, path: &str, value: &T, timestamp: u64) -> StoreResult<()> {
        let content = serde_json::to_vec_pretty(value).map_err(map_err!(Serialize))?;
        self.put_resource(path, &content, timestamp)
    }
}
