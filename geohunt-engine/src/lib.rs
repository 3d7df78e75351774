//! GeoHunt Unlock Engine
//!
//! Orchestrates the unlock transaction: resolve the treasure, load or lazily
//! create progress, reject duplicates, award points, rederive level and
//! badges, persist. Steps after resolution run under a per-player lock and
//! the final save is a compare-and-swap on the record version, so concurrent
//! scans by the same player can never double-award.

mod locks;

pub use locks::PlayerLockTable;

use chrono::Utc;
use geohunt_core::{
    apply_unlock, classify, unlock_message, Coordinate, EntityType, GeohuntError,
    GeohuntResult, PlayerId, PlayerProgress, Points, ProgressError, ProximityCheck,
    ScanClassification, StorageError, Treasure, TreasureId, UnlockPhase,
};
use geohunt_flavor::{FlavorContext, FlavorKind, FlavorService};
use geohunt_storage::{ProgressStore, TreasureCatalog};
use serde::Serialize;
use std::sync::Arc;

// ============================================================================
// RESULT TYPES
// ============================================================================

/// Successful unlock: the persisted record plus a message for the player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnlockReceipt {
    pub progress: PlayerProgress,
    pub message: String,
    pub points_awarded: Points,
}

/// Why a scan did not lead to an unlock. These are values, not errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ScanRejection {
    Mismatch { scanned: TreasureId },
    Malformed,
    OutOfRange { distance_m: f64, threshold_m: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanRedemption {
    Unlocked(UnlockReceipt),
    Rejected(ScanRejection),
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct UnlockEngine {
    store: Arc<dyn ProgressStore>,
    catalog: Arc<dyn TreasureCatalog>,
    flavor: Option<FlavorService>,
    locks: PlayerLockTable,
}

impl UnlockEngine {
    pub fn new(store: Arc<dyn ProgressStore>, catalog: Arc<dyn TreasureCatalog>) -> Self {
        Self {
            store,
            catalog,
            flavor: None,
            locks: PlayerLockTable::new(),
        }
    }

    /// Attach a flavor service for welcome text on lazily created records.
    pub fn with_flavor(mut self, flavor: FlavorService) -> Self {
        self.flavor = Some(flavor);
        self
    }

    pub fn catalog(&self) -> &Arc<dyn TreasureCatalog> {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<dyn ProgressStore> {
        &self.store
    }

    pub fn flavor(&self) -> Option<&FlavorService> {
        self.flavor.as_ref()
    }

    /// Drop lock-table entries for players with no operation in flight.
    pub fn prune_locks(&self) -> usize {
        self.locks.prune_idle()
    }

    /// Return a player's progress, creating the initial record if absent.
    pub async fn get_progress(&self, player_id: &PlayerId) -> GeohuntResult<PlayerProgress> {
        if let Some(progress) = self.store.progress_get(player_id).await? {
            return Ok(progress);
        }
        let _guard = self.locks.lock(player_id).await;
        self.load_or_create(player_id).await
    }

    /// Credit a treasure to a player exactly once.
    ///
    /// Fails with [`ProgressError::TreasureNotFound`] if the treasure is not in
    /// the catalog and with [`ProgressError::AlreadyUnlocked`] if the player
    /// already holds it. Neither failure changes any state.
    #[tracing::instrument(skip_all, fields(player_id = %player_id, treasure_id = %treasure_id))]
    pub async fn unlock_treasure(
        &self,
        player_id: &PlayerId,
        treasure_id: &TreasureId,
    ) -> GeohuntResult<UnlockReceipt> {
        let treasure = self.resolve(treasure_id).await?;
        self.award(player_id, &treasure).await
    }

    /// Administrative reset back to the initial state.
    #[tracing::instrument(skip_all, fields(player_id = %player_id))]
    pub async fn reset_progress(&self, player_id: &PlayerId) -> GeohuntResult<PlayerProgress> {
        let _guard = self.locks.lock(player_id).await;
        let current = match self.store.progress_get(player_id).await? {
            Some(current) => current,
            None => return self.load_or_create(player_id).await,
        };
        let reset = current.reset(Utc::now());
        let saved = self.store.progress_save(&reset, current.version).await?;
        tracing::info!(
            previous_points = current.total_points,
            previous_unlocks = current.unlocked_count(),
            "progress reset"
        );
        Ok(saved)
    }

    /// Verify a scanned payload and the player's position, then unlock.
    ///
    /// A missing position counts as out of range.
    #[tracing::instrument(skip_all, fields(player_id = %player_id, treasure_id = %target))]
    pub async fn redeem_scan(
        &self,
        player_id: &PlayerId,
        target: &TreasureId,
        payload: &str,
        position: Option<Coordinate>,
    ) -> GeohuntResult<ScanRedemption> {
        let treasure = self.resolve(target).await?;

        match classify(payload, target) {
            ScanClassification::Match => {}
            ScanClassification::Mismatch { scanned } => {
                tracing::debug!(scanned = %scanned, "scan names a different treasure");
                return Ok(ScanRedemption::Rejected(ScanRejection::Mismatch { scanned }));
            }
            ScanClassification::Malformed => {
                tracing::debug!("scan is not a game code");
                return Ok(ScanRedemption::Rejected(ScanRejection::Malformed));
            }
        }

        let proximity = ProximityCheck::for_unlock(position, treasure.location);
        if !proximity.within_range {
            tracing::debug!(distance_m = proximity.distance_m, "scan outside unlock radius");
            return Ok(ScanRedemption::Rejected(ScanRejection::OutOfRange {
                distance_m: proximity.distance_m,
                threshold_m: proximity.threshold_m,
            }));
        }

        self.award(player_id, &treasure)
            .await
            .map(ScanRedemption::Unlocked)
    }

    // ------------------------------------------------------------------------
    // Transaction steps
    // ------------------------------------------------------------------------

    async fn resolve(&self, treasure_id: &TreasureId) -> GeohuntResult<Treasure> {
        tracing::debug!(phase = %UnlockPhase::Requested);
        match self.catalog.treasure_get(treasure_id).await? {
            Some(treasure) => {
                tracing::debug!(phase = %UnlockPhase::TargetResolved);
                Ok(treasure)
            }
            None => {
                tracing::warn!(phase = %UnlockPhase::TargetNotFound, treasure_id = %treasure_id);
                Err(ProgressError::TreasureNotFound {
                    treasure_id: treasure_id.clone(),
                }
                .into())
            }
        }
    }

    async fn award(&self, player_id: &PlayerId, treasure: &Treasure) -> GeohuntResult<UnlockReceipt> {
        let _guard = self.locks.lock(player_id).await;
        let progress = self.load_or_create(player_id).await?;

        if progress.has_unlocked(&treasure.id) {
            tracing::debug!(phase = %UnlockPhase::AlreadyUnlocked);
            return Err(ProgressError::AlreadyUnlocked {
                player_id: player_id.clone(),
                treasure_id: treasure.id.clone(),
            }
            .into());
        }

        let catalog = self.catalog.treasure_list().await?;
        let next = apply_unlock(&progress, treasure, &catalog, Utc::now())?;
        let saved = self.store.progress_save(&next, progress.version).await?;

        tracing::info!(
            phase = %UnlockPhase::Awarded,
            points = treasure.points,
            total_points = saved.total_points,
            level = saved.level,
            badges = saved.badges.len(),
            "treasure unlocked"
        );

        Ok(UnlockReceipt {
            progress: saved,
            message: unlock_message(treasure),
            points_awarded: Points::from(treasure.points),
        })
    }

    /// Caller must hold the player's lock.
    async fn load_or_create(&self, player_id: &PlayerId) -> GeohuntResult<PlayerProgress> {
        if let Some(progress) = self.store.progress_get(player_id).await? {
            return Ok(progress);
        }

        let mut fresh = PlayerProgress::new(player_id.clone(), Utc::now());
        if let Some(flavor) = &self.flavor {
            let context = FlavorContext::for_player(player_id.clone());
            fresh.welcome_text = Some(flavor.text(FlavorKind::Welcome, &context).await);
        }

        match self.store.progress_insert(&fresh).await {
            Ok(stored) => {
                tracing::info!(player_id = %player_id, "progress record created");
                Ok(stored)
            }
            // Another process created it first.
            Err(GeohuntError::Storage(StorageError::InsertFailed { .. })) => self
                .store
                .progress_get(player_id)
                .await?
                .ok_or_else(|| {
                    GeohuntError::Storage(StorageError::NotFound {
                        entity_type: EntityType::PlayerProgress,
                        id: player_id.to_string(),
                    })
                }),
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for UnlockEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockEngine")
            .field("flavor", &self.flavor)
            .field("locks", &self.locks.len())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
