//! Cache Module
//!
//! Multi-tier application-data caching: a bounded recency (LRU) primitive
//! and three coordinated tiers (memory, session, persistent) with upward
//! promotion and read-time TTL staleness.

mod entry;
mod key;
mod manager;
mod persistent;
mod recency;
mod session;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use key::generate_key;
pub use manager::TieredCacheManager;
pub use persistent::{MemoryStore, PersistedEntry, PersistentStore, SqliteStore};
pub use recency::BoundedRecencyCache;
pub use session::{InMemoryStringStore, SessionTier, StringStore};
pub use stats::{CacheStats, PersistentUsage, StatsSnapshot, TierUsage};

// == Public Constants ==
/// Default capacity of the memory tier
pub const DEFAULT_MEMORY_CAPACITY: usize = 50;

/// Default capacity of the session tier
pub const DEFAULT_SESSION_CAPACITY: usize = 100;

/// Default byte quota for the session tier's string store
pub const DEFAULT_SESSION_QUOTA_BYTES: usize = 2 * 1024 * 1024; // 2 MB
