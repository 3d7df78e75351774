//! Per-player serialization of mutating operations.

use dashmap::DashMap;
use geohunt_core::PlayerId;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per player. Different players never contend.
#[derive(Debug, Default)]
pub struct PlayerLockTable {
    locks: DashMap<PlayerId, Arc<Mutex<()>>>,
}

impl PlayerLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a player's record.
    pub async fn lock(&self, player_id: &PlayerId) -> OwnedMutexGuard<()> {
        // Clone out of the map so no shard lock is held across the await.
        let mutex = self
            .locks
            .entry(player_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Drop entries nobody holds or waits on. Returns how many were removed.
    pub fn prune_idle(&self) -> usize {
        // Count inside retain; len() races with concurrent inserts.
        let mut removed = 0;
        self.locks.retain(|_, mutex| {
            let keep = Arc::strong_count(mutex) > 1;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
