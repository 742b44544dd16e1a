//! Configuration Module
//!
//! Handles loading cache tuning parameters from environment variables.

use std::env;
use std::path::PathBuf;

use crate::cache::{
    DEFAULT_MEMORY_CAPACITY, DEFAULT_SESSION_CAPACITY, DEFAULT_SESSION_QUOTA_BYTES,
};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the memory tier
    pub memory_capacity: usize,
    /// Maximum number of entries in the session tier
    pub session_capacity: usize,
    /// Byte budget for the session tier's string store; None disables it
    pub session_quota_bytes: Option<usize>,
    /// Explicit persistent database path; the platform data dir when None
    pub persistent_path: Option<PathBuf>,
    /// Maximum entries per named network response store
    pub store_max_entries: usize,
    /// Background store prune interval in seconds
    pub prune_interval: u64,
    /// Freshness window for stale-while-revalidate responses, in milliseconds
    pub bulk_max_age_ms: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MEMORY_CAPACITY` - Memory tier entries (default: 50)
    /// - `SESSION_CAPACITY` - Session tier entries (default: 100)
    /// - `SESSION_QUOTA_BYTES` - Session tier byte budget (default: 2097152)
    /// - `PERSISTENT_PATH` - Persistent database path (default: platform data dir)
    /// - `STORE_MAX_ENTRIES` - Entries per response store (default: 60)
    /// - `PRUNE_INTERVAL` - Prune frequency in seconds (default: 300)
    /// - `BULK_MAX_AGE_MS` - Stale-while-revalidate window (default: 86400000)
    pub fn from_env() -> Self {
        Self {
            memory_capacity: env::var("MEMORY_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MEMORY_CAPACITY),
            session_capacity: env::var("SESSION_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SESSION_CAPACITY),
            session_quota_bytes: Some(
                env::var("SESSION_QUOTA_BYTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_SESSION_QUOTA_BYTES),
            ),
            persistent_path: env::var("PERSISTENT_PATH").ok().map(PathBuf::from),
            store_max_entries: env::var("STORE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            prune_interval: env::var("PRUNE_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            bulk_max_age_ms: env::var("BULK_MAX_AGE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(86_400_000),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            session_capacity: DEFAULT_SESSION_CAPACITY,
            session_quota_bytes: Some(DEFAULT_SESSION_QUOTA_BYTES),
            persistent_path: None,
            store_max_entries: 60,
            prune_interval: 300,
            bulk_max_age_ms: 86_400_000,
        }
    }
}
