//! Network Module
//!
//! Request/response caching for outbound fetches, independent of the
//! tiered application-data cache: named response stores, a fetch seam,
//! and per-route cache strategies.

mod fetch;
mod response;
mod store;
mod strategy;

// Re-export public types
pub use fetch::{Fetch, HttpFetcher};
pub use response::{CachedResponse, FetchRequest};
pub use store::ResponseStore;
pub use strategy::{NetworkCacheStrategy, StrategyKind, StrategyRoute};
