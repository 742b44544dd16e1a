//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions,
//! and defines the per-tier usage snapshot reported by the manager.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of reads answered by some tier
    pub hits: u64,
    /// Number of reads no tier could answer freshly
    pub misses: u64,
    /// Number of entries evicted from the memory tier
    pub evictions: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    /// Increments the eviction counter.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}

// == Tier Usage ==
/// Usage snapshot for a bounded in-heap tier.
#[derive(Debug, Clone, Serialize)]
pub struct TierUsage {
    /// Current number of entries
    pub count: usize,
    /// Configured capacity
    pub max_size: usize,
}

// == Persistent Usage ==
/// Usage snapshot for the persistent tier.
#[derive(Debug, Clone, Serialize)]
pub struct PersistentUsage {
    /// Current number of records
    pub count: usize,
    /// Total stored payload bytes
    pub size: u64,
}

// == Stats Snapshot ==
/// Read-only diagnostic snapshot across all tiers.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub memory: TierUsage,
    pub session: TierUsage,
    pub persistent: PersistentUsage,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub hit_rate: f64,
}
