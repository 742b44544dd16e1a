//! Tiercache - a multi-tier caching library
//!
//! Provides a three-tier application-data cache (memory, session,
//! persistent) with LRU eviction, read-time TTL staleness, and upward
//! promotion, plus an independent network cache-strategy layer for
//! outbound request/response caching.

pub mod cache;
pub mod config;
pub mod error;
pub mod network;
pub mod tasks;

pub use cache::{generate_key, TieredCacheManager};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use network::{HttpFetcher, NetworkCacheStrategy, StrategyKind, StrategyRoute};
pub use tasks::spawn_prune_task;
