//! Session Tier Module
//!
//! A recency-indexed tier whose values live in a string store as JSON
//! envelopes. The store may enforce a byte quota; quota failures trigger
//! oldest-first pruning and a single retry, then the write is dropped for
//! this tier alone.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::cache::entry::CacheEntry;
use crate::cache::recency::BoundedRecencyCache;
use crate::error::{CacheError, Result};

/// Fraction of entries dropped when a store write hits the quota.
const QUOTA_PRUNE_FRACTION: f64 = 0.25;

// == String Store ==
/// String-keyed store of serialized envelopes.
///
/// Only writes can fail (quota exhaustion); every other operation is
/// infallible.
pub trait StringStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str);
    fn keys(&self) -> Vec<String>;
    fn clear(&mut self);
    fn len(&self) -> usize;
}

// == In-Memory String Store ==
/// Default store backing: a map with an optional byte budget covering keys
/// and values.
#[derive(Debug, Default)]
pub struct InMemoryStringStore {
    values: HashMap<String, String>,
    quota_bytes: Option<usize>,
    used_bytes: usize,
}

impl InMemoryStringStore {
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects writes once `quota_bytes` would be
    /// exceeded.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    fn cost(key: &str, value: &str) -> usize {
        key.len() + value.len()
    }
}

impl StringStore for InMemoryStringStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let new_cost = Self::cost(key, value);
        let old_cost = self
            .values
            .get(key)
            .map(|old| Self::cost(key, old))
            .unwrap_or(0);

        if let Some(quota) = self.quota_bytes {
            if self.used_bytes - old_cost + new_cost > quota {
                return Err(CacheError::QuotaExceeded(format!(
                    "write of {} bytes exceeds {} byte budget",
                    new_cost, quota
                )));
            }
        }

        self.used_bytes = self.used_bytes - old_cost + new_cost;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        if let Some(old) = self.values.remove(key) {
            self.used_bytes -= Self::cost(key, &old);
        }
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    fn clear(&mut self) {
        self.values.clear();
        self.used_bytes = 0;
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

// == Session Tier ==
/// LRU-bounded tier over a string store.
///
/// The recency index caps the entry count; the store itself may separately
/// cap total bytes. Both limits degrade by shedding old entries, never by
/// surfacing errors to the cache consumer.
pub struct SessionTier {
    store: Box<dyn StringStore>,
    index: BoundedRecencyCache<()>,
}

impl SessionTier {
    // == Constructor ==
    /// Creates a tier holding at most `capacity` entries in `store`.
    pub fn new(capacity: usize, store: Box<dyn StringStore>) -> Self {
        Self {
            store,
            index: BoundedRecencyCache::new(capacity),
        }
    }

    // == Get ==
    /// Reads and deserializes an envelope, touching its recency.
    ///
    /// A corrupt envelope reads as a miss and stays in place; the next
    /// write for its key replaces it.
    pub fn get(&mut self, key: &str) -> Option<CacheEntry> {
        let raw = self.store.get(key)?;
        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => {
                self.index.get(key);
                Some(entry)
            }
            Err(err) => {
                debug!("session tier: corrupt envelope for {key} treated as a miss: {err}");
                None
            }
        }
    }

    // == Set ==
    /// Serializes and stores an envelope.
    ///
    /// On a quota failure the tier prunes its oldest quarter and retries
    /// once; a second failure drops the write with a warning. Any value
    /// already stored under the key survives a dropped write.
    pub fn set(&mut self, key: &str, entry: &CacheEntry) {
        let raw = match serde_json::to_string(entry) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("session tier: could not serialize value for {key}: {err}");
                return;
            }
        };

        match self.store.set(key, &raw) {
            Ok(()) => self.track(key),
            Err(first) => {
                warn!("session tier write failed ({first}), pruning and retrying");
                self.prune_oldest();
                match self.store.set(key, &raw) {
                    Ok(()) => self.track(key),
                    Err(err) => warn!("session tier write dropped after retry: {err}"),
                }
            }
        }
    }

    // == Clear Category ==
    /// Removes every entry tagged with `category`.
    pub fn clear_category(&mut self, category: &str) {
        for key in self.store.keys() {
            let matches = self
                .store
                .get(&key)
                .and_then(|raw| serde_json::from_str::<CacheEntry>(&raw).ok())
                .map(|entry| entry.category == category)
                .unwrap_or(false);
            if matches {
                self.store.remove(&key);
                self.index.delete(&key);
            }
        }
    }

    // == Length ==
    /// Returns the current number of stored envelopes.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if the tier holds no envelopes.
    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    /// Returns the configured entry capacity.
    pub fn capacity(&self) -> usize {
        self.index.capacity()
    }

    /// Records a successful write in the recency index, shedding the
    /// least recently used entry when the index is full.
    fn track(&mut self, key: &str) {
        if let Some(evicted) = self.index.set(key, ()) {
            self.store.remove(&evicted);
        }
    }

    /// Drops the oldest quarter of entries by write timestamp.
    ///
    /// Corrupt envelopes sort as oldest, so quota pressure also clears
    /// them out.
    fn prune_oldest(&mut self) {
        let mut stamped: Vec<(String, u64)> = self
            .store
            .keys()
            .into_iter()
            .map(|key| {
                let timestamp = self
                    .store
                    .get(&key)
                    .and_then(|raw| serde_json::from_str::<CacheEntry>(&raw).ok())
                    .map(|entry| entry.timestamp)
                    .unwrap_or(0);
                (key, timestamp)
            })
            .collect();
        if stamped.is_empty() {
            return;
        }

        stamped.sort_by_key(|(_, timestamp)| *timestamp);
        let drop_count = ((stamped.len() as f64 * QUOTA_PRUNE_FRACTION).ceil() as usize).max(1);

        for (key, _) in stamped.into_iter().take(drop_count) {
            self.store.remove(&key);
            self.index.delete(&key);
        }
        debug!("session tier: pruned {drop_count} entries under quota pressure");
    }
}
