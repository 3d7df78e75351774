//! Treasure catalog seam.

use async_trait::async_trait;
use geohunt_core::{GeohuntResult, StorageError, Treasure, TreasureId};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Read-only catalog as seen by the unlock engine.
#[async_trait]
pub trait TreasureCatalog: Send + Sync {
    /// All treasures, ordered by identifier.
    async fn treasure_list(&self) -> GeohuntResult<Vec<Treasure>>;

    /// A single treasure, or `None` if it is not in the catalog.
    async fn treasure_get(&self, id: &TreasureId) -> GeohuntResult<Option<Treasure>>;
}

/// In-memory catalog. The admin methods stand in for the external CRUD
/// screens; the engine only sees [`TreasureCatalog`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    treasures: Arc<RwLock<BTreeMap<TreasureId, Treasure>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, validating every entry.
    pub fn from_treasures(treasures: impl IntoIterator<Item = Treasure>) -> GeohuntResult<Self> {
        let catalog = Self::new();
        for treasure in treasures {
            catalog.upsert(treasure)?;
        }
        Ok(catalog)
    }

    /// Insert or replace a treasure.
    pub fn upsert(&self, treasure: Treasure) -> GeohuntResult<()> {
        treasure.validate()?;
        let mut treasures = self.treasures.write().map_err(|_| StorageError::LockPoisoned)?;
        tracing::debug!(treasure_id = %treasure.id, "catalog upsert");
        treasures.insert(treasure.id.clone(), treasure);
        Ok(())
    }

    /// Remove a treasure. Earned badges are not revisited.
    pub fn remove(&self, id: &TreasureId) -> GeohuntResult<Option<Treasure>> {
        let mut treasures = self.treasures.write().map_err(|_| StorageError::LockPoisoned)?;
        Ok(treasures.remove(id))
    }

    pub fn len(&self) -> GeohuntResult<usize> {
        let treasures = self.treasures.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(treasures.len())
    }

    pub fn is_empty(&self) -> GeohuntResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl TreasureCatalog for InMemoryCatalog {
    async fn treasure_list(&self) -> GeohuntResult<Vec<Treasure>> {
        let treasures = self.treasures.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(treasures.values().cloned().collect())
    }

    async fn treasure_get(&self, id: &TreasureId) -> GeohuntResult<Option<Treasure>> {
        let treasures = self.treasures.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(treasures.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geohunt_core::{Category, Coordinate, GeohuntError, ValidationError};

    fn treasure(id: &str, points: u32) -> Treasure {
        Treasure {
            id: TreasureId::new(id),
            name: id.to_uppercase(),
            location: Coordinate::new(51.0, 0.0),
            points,
            category: Category::History,
            clue: "Look up".to_string(),
        }
    }

    #[tokio::test]
    async fn test_list_and_get() -> GeohuntResult<()> {
        let catalog = InMemoryCatalog::from_treasures([treasure("b", 10), treasure("a", 20)])?;
        let ids: Vec<String> = catalog
            .treasure_list()
            .await?
            .into_iter()
            .map(|t| t.id.into_inner())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(
            catalog.treasure_get(&TreasureId::new("a")).await?.map(|t| t.points),
            Some(20)
        );
        assert!(catalog.treasure_get(&TreasureId::new("z")).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_replaces_and_remove_drops() -> GeohuntResult<()> {
        let catalog = InMemoryCatalog::new();
        catalog.upsert(treasure("a", 10))?;
        catalog.upsert(treasure("a", 30))?;
        assert_eq!(catalog.len()?, 1);
        assert_eq!(
            catalog.treasure_get(&TreasureId::new("a")).await?.map(|t| t.points),
            Some(30)
        );
        assert!(catalog.remove(&TreasureId::new("a"))?.is_some());
        assert!(catalog.is_empty()?);
        Ok(())
    }

    #[test]
    fn test_invalid_treasure_rejected() {
        let catalog = InMemoryCatalog::new();
        let err = catalog.upsert(treasure("a", 0)).unwrap_err();
        assert!(matches!(
            err,
            GeohuntError::Validation(ValidationError::InvalidValue { .. })
        ));
    }
}
