//! Store Prune Task
//!
//! Background task that periodically caps the named network response
//! stores.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::network::NetworkCacheStrategy;

/// Spawns a background task that prunes the response stores at a fixed
/// interval.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between pruning passes. Each pass caps every open store to its entry
/// limit, evicting oldest-inserted entries first.
///
/// # Arguments
/// * `strategy` - Shared network cache strategy owning the stores
/// * `prune_interval_secs` - Interval in seconds between pruning passes
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
pub fn spawn_prune_task(
    strategy: Arc<NetworkCacheStrategy>,
    prune_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(prune_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting store prune task with interval of {} seconds",
            prune_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = strategy.prune_stores().await;

            if removed > 0 {
                info!("Store prune: removed {} entries", removed);
            } else {
                debug!("Store prune: nothing to remove");
            }
        }
    })
}
