//! GeoHunt Storage
//!
//! Async persistence seams for the unlock engine:
//!
//! - [`ProgressStore`]: durable per-player progress with compare-and-swap saves
//! - [`TreasureCatalog`]: read-only view of the treasure catalog
//!
//! Both come with in-memory implementations backed by `Arc<RwLock<_>>` maps.
//! Locks are never held across an `.await`.

mod catalog;

pub use catalog::{InMemoryCatalog, TreasureCatalog};

use async_trait::async_trait;
use geohunt_core::{
    EntityType, GeohuntError, GeohuntResult, PlayerId, PlayerProgress, StorageError,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

// ============================================================================
// PROGRESS STORE TRAIT
// ============================================================================

/// Durable storage for [`PlayerProgress`] records.
///
/// `version` is owned by the store: inserts start at 1 and every successful
/// save increments it. A save whose `expected_version` does not match the
/// stored record fails with [`StorageError::VersionConflict`].
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Get a player's progress record.
    async fn progress_get(&self, player_id: &PlayerId) -> GeohuntResult<Option<PlayerProgress>>;

    /// Insert a new record. Fails if the player already has one.
    async fn progress_insert(&self, progress: &PlayerProgress) -> GeohuntResult<PlayerProgress>;

    /// Replace a record if its stored version equals `expected_version`.
    async fn progress_save(
        &self,
        progress: &PlayerProgress,
        expected_version: u64,
    ) -> GeohuntResult<PlayerProgress>;

    /// Delete a record alongside deletion of the owning identity.
    async fn progress_delete(&self, player_id: &PlayerId) -> GeohuntResult<()>;

    /// Check that the backing store is reachable.
    async fn health_check(&self) -> GeohuntResult<()>;
}

// ============================================================================
// IN-MEMORY PROGRESS STORE
// ============================================================================

/// In-memory progress store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProgressStore {
    records: Arc<RwLock<HashMap<PlayerId, PlayerProgress>>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all records.
    pub fn clear(&self) -> GeohuntResult<()> {
        let mut records = self.records.write().map_err(|_| StorageError::LockPoisoned)?;
        records.clear();
        Ok(())
    }

    /// Number of stored records.
    pub fn len(&self) -> GeohuntResult<usize> {
        let records = self.records.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(records.len())
    }

    pub fn is_empty(&self) -> GeohuntResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn progress_get(&self, player_id: &PlayerId) -> GeohuntResult<Option<PlayerProgress>> {
        let records = self.records.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(records.get(player_id).cloned())
    }

    async fn progress_insert(&self, progress: &PlayerProgress) -> GeohuntResult<PlayerProgress> {
        let mut records = self.records.write().map_err(|_| StorageError::LockPoisoned)?;
        if records.contains_key(&progress.player_id) {
            return Err(GeohuntError::Storage(StorageError::InsertFailed {
                entity_type: EntityType::PlayerProgress,
                reason: format!("progress for {} already exists", progress.player_id),
            }));
        }
        let mut stored = progress.clone();
        stored.version = 1;
        records.insert(stored.player_id.clone(), stored.clone());
        tracing::debug!(player_id = %stored.player_id, "progress record created");
        Ok(stored)
    }

    async fn progress_save(
        &self,
        progress: &PlayerProgress,
        expected_version: u64,
    ) -> GeohuntResult<PlayerProgress> {
        let mut records = self.records.write().map_err(|_| StorageError::LockPoisoned)?;
        let current = records.get(&progress.player_id).ok_or_else(|| {
            GeohuntError::Storage(StorageError::NotFound {
                entity_type: EntityType::PlayerProgress,
                id: progress.player_id.to_string(),
            })
        })?;
        if current.version != expected_version {
            return Err(GeohuntError::Storage(StorageError::VersionConflict {
                player_id: progress.player_id.clone(),
                expected: expected_version,
                actual: current.version,
            }));
        }
        let mut stored = progress.clone();
        stored.version = expected_version + 1;
        records.insert(stored.player_id.clone(), stored.clone());
        Ok(stored)
    }

    async fn progress_delete(&self, player_id: &PlayerId) -> GeohuntResult<()> {
        let mut records = self.records.write().map_err(|_| StorageError::LockPoisoned)?;
        records.remove(player_id).map(|_| ()).ok_or_else(|| {
            GeohuntError::Storage(StorageError::NotFound {
                entity_type: EntityType::PlayerProgress,
                id: player_id.to_string(),
            })
        })
    }

    async fn health_check(&self) -> GeohuntResult<()> {
        let _records = self.records.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fresh(player: &str) -> PlayerProgress {
        PlayerProgress::new(PlayerId::new(player), Utc::now())
    }

    #[tokio::test]
    async fn test_insert_then_get() -> GeohuntResult<()> {
        let store = InMemoryProgressStore::new();
        let stored = store.progress_insert(&fresh("alice")).await?;
        assert_eq!(stored.version, 1);

        let loaded = store.progress_get(&PlayerId::new("alice")).await?;
        assert_eq!(loaded, Some(stored));
        assert_eq!(store.progress_get(&PlayerId::new("bob")).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_insert_fails() -> GeohuntResult<()> {
        let store = InMemoryProgressStore::new();
        store.progress_insert(&fresh("alice")).await?;
        let err = store.progress_insert(&fresh("alice")).await.unwrap_err();
        assert!(matches!(
            err,
            GeohuntError::Storage(StorageError::InsertFailed { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_save_bumps_version() -> GeohuntResult<()> {
        let store = InMemoryProgressStore::new();
        let mut record = store.progress_insert(&fresh("alice")).await?;
        record.total_points = 100;
        let saved = store.progress_save(&record, 1).await?;
        assert_eq!(saved.version, 2);
        assert_eq!(saved.total_points, 100);
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_save_is_a_version_conflict() -> GeohuntResult<()> {
        let store = InMemoryProgressStore::new();
        let record = store.progress_insert(&fresh("alice")).await?;
        store.progress_save(&record, 1).await?;

        let err = store.progress_save(&record, 1).await.unwrap_err();
        assert_eq!(
            err,
            GeohuntError::Storage(StorageError::VersionConflict {
                player_id: PlayerId::new("alice"),
                expected: 1,
                actual: 2,
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_save_missing_record_is_not_found() {
        let store = InMemoryProgressStore::new();
        let err = store.progress_save(&fresh("ghost"), 0).await.unwrap_err();
        assert!(matches!(
            err,
            GeohuntError::Storage(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete() -> GeohuntResult<()> {
        let store = InMemoryProgressStore::new();
        store.progress_insert(&fresh("alice")).await?;
        store.progress_delete(&PlayerId::new("alice")).await?;
        assert!(store.is_empty()?);
        assert!(store.progress_delete(&PlayerId::new("alice")).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_health_check_and_clear() -> GeohuntResult<()> {
        let store = InMemoryProgressStore::new();
        store.health_check().await?;
        store.progress_insert(&fresh("a")).await?;
        store.progress_insert(&fresh("b")).await?;
        assert_eq!(store.len()?, 2);
        store.clear()?;
        assert!(store.is_empty()?);
        Ok(())
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Only the save carrying the current version succeeds.
        #[test]
        fn prop_cas_accepts_only_current_version(saves in 1usize..10, stale in 0u64..20) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            rt.block_on(async {
                let store = InMemoryProgressStore::new();
                let record = PlayerProgress::new(PlayerId::new("p"), Utc::now());
                let mut current = store
                    .progress_insert(&record)
                    .await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                for _ in 0..saves {
                    let version = current.version;
                    current = store
                        .progress_save(&current, version)
                        .await
                        .map_err(|e| TestCaseError::fail(e.to_string()))?;
                }
                prop_assert_eq!(current.version, saves as u64 + 1);

                let result = store.progress_save(&current, stale).await;
                if stale == current.version {
                    prop_assert!(result.is_ok());
                } else {
                    let is_conflict = matches!(
                        result,
                        Err(GeohuntError::Storage(StorageError::VersionConflict { .. }))
                    );
                    prop_assert!(is_conflict);
                }
                Ok::<(), TestCaseError>(())
            })?;
        }
    }
}
