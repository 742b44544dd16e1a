//! Persistent Tier Module
//!
//! Durable storage behind a trait, with a SQLite implementation and an
//! in-memory fallback for contexts where no durable backend is available.
//!
//! Records are indexed by write timestamp and category so oldest-first
//! pruning and category-scoped deletion never need a full scan.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::cache::entry::current_timestamp_ms;
use crate::error::{CacheError, Result};

/// Fraction of records removed by a pruning pass.
const PRUNE_FRACTION: f64 = 0.25;

// == Persisted Entry ==
/// Record layout for the durable tier.
#[derive(Debug, Clone)]
pub struct PersistedEntry {
    pub key: String,
    /// Serialized value payload
    pub data: Vec<u8>,
    /// Write timestamp (Unix milliseconds)
    pub timestamp: u64,
    pub category: String,
    /// Payload size in bytes
    pub size: u64,
}

impl PersistedEntry {
    /// Serializes a value into a record stamped with the current time.
    pub fn new(key: &str, data: &Value, category: &str) -> Result<Self> {
        let blob = serde_json::to_vec(data)?;
        let size = blob.len() as u64;
        Ok(Self {
            key: key.to_string(),
            data: blob,
            timestamp: current_timestamp_ms(),
            category: category.to_string(),
            size,
        })
    }

    /// Decodes the stored payload; corrupt blobs surface as None.
    pub fn decode(&self) -> Option<Value> {
        serde_json::from_slice(&self.data).ok()
    }
}

// == Persistent Store ==
/// Durable key-value backend for the lowest cache tier.
pub trait PersistentStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<PersistedEntry>>;
    fn put(&self, entry: &PersistedEntry) -> Result<()>;
    fn delete_category(&self, category: &str) -> Result<usize>;
    /// Removes the oldest quarter of all records by write timestamp.
    fn prune_oldest(&self) -> Result<usize>;
    fn count(&self) -> Result<usize>;
    fn total_size(&self) -> Result<u64>;
    fn clear(&self) -> Result<()>;
}

/// How many records a pruning pass should drop for a store of `count`.
fn prune_quota(count: usize) -> usize {
    if count == 0 {
        0
    } else {
        ((count as f64 * PRUNE_FRACTION).ceil() as usize).max(1)
    }
}

// == SQLite Store ==
/// SQLite-backed persistent store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Schema for the cache table and its secondary indexes.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cache_entries (
    key TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    timestamp INTEGER NOT NULL,
    category TEXT NOT NULL,
    size INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cache_entries_timestamp ON cache_entries(timestamp);
CREATE INDEX IF NOT EXISTS idx_cache_entries_category ON cache_entries(category);
"#;

impl SqliteStore {
    // == Constructor ==
    /// Opens (creating if needed) a store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CacheError::Storage(format!("failed to create cache directory: {e}"))
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            CacheError::Storage(format!(
                "failed to open cache database at {}: {e}",
                path.display()
            ))
        })?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;

        Ok(store)
    }

    /// Opens a store at the default location under the platform data dir.
    pub fn open_default() -> Result<Self> {
        Self::open(&Self::default_path()?)
    }

    /// Returns the default database path.
    fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
            .ok_or_else(|| CacheError::Storage("could not determine data directory".into()))?;

        Ok(data_dir.join("tiercache").join("cache.db"))
    }

    /// Runs database migrations for the cache table.
    fn run_migrations(&self) -> Result<()> {
        self.lock()?
            .execute_batch(SCHEMA)
            .map_err(|e| CacheError::Storage(format!("failed to run cache migrations: {e}")))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CacheError::Storage(format!("lock poisoned: {e}")))
    }
}

impl PersistentStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<PersistedEntry>> {
        let conn = self.lock()?;

        conn.query_row(
            "SELECT data, timestamp, category, size FROM cache_entries WHERE key = ?1",
            params![key],
            |row| {
                Ok(PersistedEntry {
                    key: key.to_string(),
                    data: row.get::<_, Vec<u8>>(0)?,
                    timestamp: row.get::<_, i64>(1)? as u64,
                    category: row.get(2)?,
                    size: row.get::<_, i64>(3)? as u64,
                })
            },
        )
        .optional()
        .map_err(|e| CacheError::Storage(format!("failed to read entry: {e}")))
    }

    fn put(&self, entry: &PersistedEntry) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, data, timestamp, category, size)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.key,
                entry.data,
                entry.timestamp as i64,
                entry.category,
                entry.size as i64
            ],
        )
        .map_err(|e| CacheError::Storage(format!("failed to store entry: {e}")))?;

        Ok(())
    }

    fn delete_category(&self, category: &str) -> Result<usize> {
        let conn = self.lock()?;

        conn.execute(
            "DELETE FROM cache_entries WHERE category = ?1",
            params![category],
        )
        .map_err(|e| CacheError::Storage(format!("failed to delete category: {e}")))
    }

    fn prune_oldest(&self) -> Result<usize> {
        let quota = prune_quota(self.count()?);
        if quota == 0 {
            return Ok(0);
        }

        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM cache_entries WHERE key IN
             (SELECT key FROM cache_entries ORDER BY timestamp ASC LIMIT ?1)",
            params![quota as i64],
        )
        .map_err(|e| CacheError::Storage(format!("failed to prune entries: {e}")))
    }

    fn count(&self) -> Result<usize> {
        let conn = self.lock()?;

        conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|n| n as usize)
        .map_err(|e| CacheError::Storage(format!("failed to count entries: {e}")))
    }

    fn total_size(&self) -> Result<u64> {
        let conn = self.lock()?;

        conn.query_row(
            "SELECT COALESCE(SUM(size), 0) FROM cache_entries",
            [],
            |row| row.get::<_, i64>(0),
        )
        .map(|n| n as u64)
        .map_err(|e| CacheError::Storage(format!("failed to sum entry sizes: {e}")))
    }

    fn clear(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute("DELETE FROM cache_entries", [])
            .map(|_| ())
            .map_err(|e| CacheError::Storage(format!("failed to clear entries: {e}")))
    }
}

// == Memory Store ==
/// In-process fallback used when no durable backend can be opened, and as
/// the backend of choice in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, PersistedEntry>>,
}

impl MemoryStore {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, PersistedEntry>>> {
        self.entries
            .lock()
            .map_err(|e| CacheError::Storage(format!("lock poisoned: {e}")))
    }
}

impl PersistentStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<PersistedEntry>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, entry: &PersistedEntry) -> Result<()> {
        self.lock()?.insert(entry.key.clone(), entry.clone());
        Ok(())
    }

    fn delete_category(&self, category: &str) -> Result<usize> {
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|_, entry| entry.category != category);
        Ok(before - entries.len())
    }

    fn prune_oldest(&self) -> Result<usize> {
        let mut entries = self.lock()?;
        let quota = prune_quota(entries.len());
        if quota == 0 {
            return Ok(0);
        }

        let mut stamped: Vec<(String, u64)> = entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.timestamp))
            .collect();
        stamped.sort_by_key(|(_, timestamp)| *timestamp);

        for (key, _) in stamped.into_iter().take(quota) {
            entries.remove(&key);
        }
        Ok(quota)
    }

    fn count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    fn total_size(&self) -> Result<u64> {
        Ok(self.lock()?.values().map(|entry| entry.size).sum())
    }

    fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}
