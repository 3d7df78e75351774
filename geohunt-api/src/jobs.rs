//! Background Jobs
//!
//! The per-player lock table grows by one entry for every player that has
//! ever written progress. This task drops entries nobody is holding so the
//! table tracks active players only.

use std::sync::Arc;
use std::time::Duration;

use geohunt_engine::UnlockEngine;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

/// Periodically prune idle lock entries until shutdown is signalled.
///
/// Returns the total number of entries pruned.
pub async fn lock_prune_task(
    engine: Arc<UnlockEngine>,
    every: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> usize {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately.
    ticker.tick().await;

    tracing::info!(interval_secs = every.as_secs(), "Lock prune task started");

    let mut total = 0;
    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let pruned = engine.prune_locks();
                total += pruned;
                if pruned > 0 {
                    tracing::debug!(pruned, "idle player locks pruned");
                }
            }
        }
    }

    tracing::info!(total_pruned = total, "Lock prune task shutting down");
    total
}
