//! Error types for the tiered cache
//!
//! Provides unified error handling using thiserror.
//!
//! Storage-class errors (`Storage`, `QuotaExceeded`, `Serialization`) are
//! absorbed at the tier boundary and never reach cache consumers; only
//! `Upstream` propagates out of `cache_api_call`, and the network variants
//! surface from the strategy layer when no stored fallback exists.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache library.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The caller-supplied fetch function failed; carried verbatim
    #[error("upstream fetch failed: {0}")]
    Upstream(anyhow::Error),

    /// A storage backend rejected an operation
    #[error("storage error: {0}")]
    Storage(String),

    /// A storage backend ran out of quota
    #[error("storage quota exceeded: {0}")]
    QuotaExceeded(String),

    /// A value could not be serialized for storage
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A network request could not be completed
    #[error("network request failed for {url}: {reason}")]
    Network { url: String, reason: String },

    /// The upstream server answered with a non-success status
    #[error("upstream returned status {status} for {url}")]
    HttpStatus { url: String, status: u16 },
}

// == Result Type Alias ==
/// Convenience Result type for the cache library.
pub type Result<T> = std::result::Result<T, CacheError>;
