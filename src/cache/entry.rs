//! Cache Entry Module
//!
//! Defines the tier-agnostic cache entry envelope with write-time stamping.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// A single cached value with its write-time metadata.
///
/// The timestamp is always the write time, never a read time. Freshness is
/// decided at read time against a caller-supplied TTL, so the same entry can
/// be fresh for one caller and stale for another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored value
    pub data: Value,
    /// Write timestamp (Unix milliseconds)
    pub timestamp: u64,
    /// Invalidation label; folded into keys but not a uniqueness guarantee
    pub category: String,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stamped with the current time.
    pub fn new(data: Value, category: impl Into<String>) -> Self {
        Self {
            data,
            timestamp: current_timestamp_ms(),
            category: category.into(),
        }
    }

    /// Creates an entry carrying an explicit write timestamp.
    ///
    /// Promotion between tiers uses this to move the original write time
    /// upward; stamping a fresh time on promotion would let resurrected
    /// data masquerade as fresh.
    pub fn with_timestamp(data: Value, category: impl Into<String>, timestamp: u64) -> Self {
        Self {
            data,
            timestamp,
            category: category.into(),
        }
    }

    // == Age ==
    /// Milliseconds since this entry was written.
    pub fn age_ms(&self) -> u64 {
        current_timestamp_ms().saturating_sub(self.timestamp)
    }

    // == Is Fresh ==
    /// Checks the entry against a caller-supplied TTL.
    ///
    /// Boundary condition: an entry whose age equals the TTL exactly is
    /// still fresh; only an age strictly greater than the TTL is stale.
    pub fn is_fresh(&self, ttl_ms: u64) -> bool {
        self.age_ms() <= ttl_ms
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
