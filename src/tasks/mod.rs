//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - Store prune: caps the network response stores at configured intervals

mod prune;

pub use prune::spawn_prune_task;
