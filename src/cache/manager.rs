//! Tiered Cache Manager Module
//!
//! Coordinates the memory, session, and persistent tiers behind one
//! read/write API with upward promotion, read-time TTL staleness,
//! write-through sets, and category-scoped invalidation.

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::entry::CacheEntry;
use crate::cache::key::generate_key;
use crate::cache::persistent::{MemoryStore, PersistedEntry, PersistentStore, SqliteStore};
use crate::cache::recency::BoundedRecencyCache;
use crate::cache::session::{InMemoryStringStore, SessionTier};
use crate::cache::stats::{CacheStats, PersistentUsage, StatsSnapshot, TierUsage};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Tiered Cache Manager ==
/// Three-tier cache with upward promotion and write-through sets.
///
/// Tier order is fixed: memory (fastest, smallest), then session
/// (quota-limited string store), then persistent (durable). Construct one
/// manager at application start and share it; every method takes `&self`.
///
/// Deliberately independent of the network cache-strategy layer: the two
/// share no entries and no invalidation.
pub struct TieredCacheManager {
    memory: RwLock<BoundedRecencyCache<CacheEntry>>,
    session: RwLock<SessionTier>,
    persistent: Arc<dyn PersistentStore>,
    stats: RwLock<CacheStats>,
}

impl TieredCacheManager {
    // == Constructor ==
    /// Creates a manager with a SQLite persistent tier.
    ///
    /// If the durable backend cannot be opened the manager degrades to an
    /// in-process persistent store rather than failing construction.
    pub fn new(config: &CacheConfig) -> Self {
        let opened = match config.persistent_path {
            Some(ref path) => SqliteStore::open(path),
            None => SqliteStore::open_default(),
        };
        let persistent: Arc<dyn PersistentStore> = match opened {
            Ok(store) => Arc::new(store),
            Err(err) => {
                warn!("persistent tier unavailable ({err}), falling back to memory");
                Arc::new(MemoryStore::default())
            }
        };

        Self::with_store(config, persistent)
    }

    /// Creates a manager over an explicit persistent backend.
    ///
    /// Tests construct isolated instances this way instead of sharing a
    /// process-wide manager.
    pub fn with_store(config: &CacheConfig, persistent: Arc<dyn PersistentStore>) -> Self {
        let session_store = match config.session_quota_bytes {
            Some(quota) => InMemoryStringStore::with_quota(quota),
            None => InMemoryStringStore::new(),
        };

        Self {
            memory: RwLock::new(BoundedRecencyCache::new(config.memory_capacity)),
            session: RwLock::new(SessionTier::new(
                config.session_capacity,
                Box::new(session_store),
            )),
            persistent,
            stats: RwLock::new(CacheStats::new()),
        }
    }

    // == Generate Key ==
    /// Builds the canonical key for a logical request. Pure; see
    /// [`generate_key`](crate::cache::generate_key).
    pub fn generate_key(category: &str, identifier: &str, params: &[(&str, &str)]) -> String {
        generate_key(category, identifier, params)
    }

    // == Get ==
    /// Returns the first fresh copy found, promoting it into every faster
    /// tier.
    ///
    /// A copy that is stale under this caller's TTL is skipped but left in
    /// place; a later read with a larger TTL may still accept it. Corrupt
    /// stored values read as misses.
    pub async fn get(&self, key: &str, ttl_ms: u64) -> Option<Value> {
        // Memory tier
        let memory_hit = {
            let mut memory = self.memory.write().await;
            memory
                .get(key)
                .filter(|entry| entry.is_fresh(ttl_ms))
                .map(|entry| entry.data.clone())
        };
        if let Some(data) = memory_hit {
            self.stats.write().await.record_hit();
            return Some(data);
        }

        // Session tier
        let session_hit = self.session.write().await.get(key);
        if let Some(entry) = session_hit {
            if entry.is_fresh(ttl_ms) {
                self.promote_to_memory(key, entry.clone()).await;
                self.stats.write().await.record_hit();
                return Some(entry.data);
            }
        }

        // Persistent tier
        match self.persistent.get(key) {
            Ok(Some(record)) => {
                if let Some(data) = record.decode() {
                    let entry = CacheEntry::with_timestamp(data, &record.category, record.timestamp);
                    if entry.is_fresh(ttl_ms) {
                        self.session.write().await.set(key, &entry);
                        self.promote_to_memory(key, entry.clone()).await;
                        self.stats.write().await.record_hit();
                        return Some(entry.data);
                    }
                } else {
                    debug!("persistent tier: corrupt payload for {key} treated as a miss");
                }
            }
            Ok(None) => {}
            Err(err) => warn!("persistent tier read failed for {key}: {err}"),
        }

        self.stats.write().await.record_miss();
        None
    }

    // == Set ==
    /// Write-through to every tier, each stamping its own write time.
    ///
    /// Tier failures are absorbed: the failing tier prunes, retries once,
    /// then no-ops for this write while the other tiers keep their copies.
    /// Never surfaces an error to the caller.
    pub async fn set(&self, key: &str, data: Value, category: &str) {
        // Memory tier
        {
            let entry = CacheEntry::new(data.clone(), category);
            let evicted = self.memory.write().await.set(key, entry);
            if evicted.is_some() {
                self.stats.write().await.record_eviction();
            }
        }

        // Session tier; prune-and-retry lives inside SessionTier::set
        let entry = CacheEntry::new(data.clone(), category);
        self.session.write().await.set(key, &entry);

        // Persistent tier
        match PersistedEntry::new(key, &data, category) {
            Ok(record) => {
                if let Err(first) = self.persistent.put(&record) {
                    warn!("persistent tier write failed ({first}), pruning and retrying");
                    let retried = self
                        .persistent
                        .prune_oldest()
                        .and_then(|_| self.persistent.put(&record));
                    if let Err(err) = retried {
                        warn!("persistent tier write dropped after retry: {err}");
                    }
                }
            }
            Err(err) => warn!("persistent tier: could not serialize value for {key}: {err}"),
        }
    }

    // == Cache API Call ==
    /// The primary consumer entry point.
    ///
    /// Computes the key, serves a fresh cached copy when any tier holds
    /// one, and otherwise runs the producer and caches its result in all
    /// tiers. Only the producer's own failure reaches the caller; a failed
    /// fetch leaves no entry behind.
    pub async fn cache_api_call<T, F, Fut>(
        &self,
        category: &str,
        identifier: &str,
        fetch_fn: F,
        params: &[(&str, &str)],
        ttl_ms: u64,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let key = generate_key(category, identifier, params);

        if let Some(value) = self.get(&key, ttl_ms).await {
            match serde_json::from_value::<T>(value) {
                Ok(decoded) => return Ok(decoded),
                Err(err) => debug!("cached value for {key} no longer decodes ({err}), refetching"),
            }
        }

        let fresh = fetch_fn().await.map_err(CacheError::Upstream)?;

        match serde_json::to_value(&fresh) {
            Ok(value) => self.set(&key, value, category).await,
            Err(err) => warn!("skipping cache write for {key}: {err}"),
        }

        Ok(fresh)
    }

    // == Clear Category ==
    /// Removes every entry tagged with `category` from all tiers.
    ///
    /// Safe to call concurrently with reads and writes; a racing write may
    /// re-add an entry afterwards, which callers accept as eventual
    /// consistency.
    pub async fn clear_category(&self, category: &str) {
        {
            let mut memory = self.memory.write().await;
            let keys: Vec<String> = memory
                .iter()
                .filter(|(_, entry)| entry.category == category)
                .map(|(key, _)| key.clone())
                .collect();
            for key in keys {
                memory.delete(&key);
            }
        }

        self.session.write().await.clear_category(category);

        if let Err(err) = self.persistent.delete_category(category) {
            warn!("persistent tier: category clear failed for {category}: {err}");
        }
    }

    // == Stats ==
    /// Returns a read-only diagnostic snapshot of all tiers.
    pub async fn stats(&self) -> StatsSnapshot {
        let memory = self.memory.read().await;
        let session = self.session.read().await;
        let counters = self.stats.read().await.clone();

        StatsSnapshot {
            memory: TierUsage {
                count: memory.len(),
                max_size: memory.capacity(),
            },
            session: TierUsage {
                count: session.len(),
                max_size: session.capacity(),
            },
            persistent: PersistentUsage {
                count: self.persistent.count().unwrap_or(0),
                size: self.persistent.total_size().unwrap_or(0),
            },
            hits: counters.hits,
            misses: counters.misses,
            evictions: counters.evictions,
            hit_rate: counters.hit_rate(),
        }
    }

    /// Copies a promoted entry into the memory tier, keeping its original
    /// write timestamp.
    async fn promote_to_memory(&self, key: &str, entry: CacheEntry) {
        let evicted = self.memory.write().await.set(key, entry);
        if evicted.is_some() {
            self.stats.write().await.record_eviction();
        }
    }
}
