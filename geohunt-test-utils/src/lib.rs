//! GeoHunt Test Utilities
//!
//! Shared test infrastructure for the GeoHunt workspace:
//! - Proptest generators for identities, coordinates and catalogs
//! - The five-treasure campus fixture
//! - Failing/slow collaborators for error-path tests
//! - Assertions for progress invariants

pub use geohunt_storage::{InMemoryCatalog, InMemoryProgressStore};

pub use geohunt_core::{
    badge, Badge, Category, Coordinate, GeohuntError, GeohuntResult, PlayerId, PlayerProgress,
    StorageError, Treasure, TreasureId,
};

use async_trait::async_trait;
use geohunt_core::FlavorError;
use geohunt_flavor::{FlavorContext, FlavorKind, FlavorProvider};
use geohunt_storage::ProgressStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for GeoHunt types.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_player_id() -> impl Strategy<Value = PlayerId> {
        "[a-z][a-z0-9_-]{0,15}".prop_map(PlayerId::new)
    }

    pub fn arb_treasure_id() -> impl Strategy<Value = TreasureId> {
        "[a-z0-9][a-z0-9-]{0,15}".prop_map(TreasureId::new)
    }

    pub fn arb_category() -> impl Strategy<Value = Category> {
        prop_oneof![
            Just(Category::Academic),
            Just(Category::Social),
            Just(Category::Sports),
            Just(Category::History),
        ]
    }

    pub fn arb_coordinate() -> impl Strategy<Value = Coordinate> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lon)| Coordinate::new(lat, lon))
    }

    pub fn arb_treasure() -> impl Strategy<Value = Treasure> {
        (
            arb_treasure_id(),
            "[A-Z][a-z]{2,12}",
            arb_coordinate(),
            1u32..=500,
            arb_category(),
        )
            .prop_map(|(id, name, location, points, category)| Treasure {
                id,
                name,
                location,
                points,
                category,
                clue: "Look around".to_string(),
            })
    }

    /// Catalog with unique identifiers.
    pub fn arb_catalog(max: usize) -> impl Strategy<Value = Vec<Treasure>> {
        prop::collection::vec(arb_treasure(), 0..=max).prop_map(|treasures| {
            let mut seen = std::collections::HashSet::new();
            treasures
                .into_iter()
                .filter(|t| seen.insert(t.id.clone()))
                .collect()
        })
    }

    /// Any payload a camera might decode, game codes included.
    pub fn arb_payload() -> impl Strategy<Value = String> {
        prop_oneof![
            arb_treasure_id().prop_map(|id| geohunt_core::encode_payload(&id)),
            "[ -~]{0,32}",
        ]
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common scenarios.

    use super::*;

    fn treasure(
        id: &str,
        name: &str,
        lat: f64,
        lon: f64,
        points: u32,
        category: Category,
        clue: &str,
    ) -> Treasure {
        Treasure {
            id: TreasureId::new(id),
            name: name.to_string(),
            location: Coordinate::new(lat, lon),
            points,
            category,
            clue: clue.to_string(),
        }
    }

    /// Five treasures: 100/150/80/200/120 points,
    /// academic/academic/social/history/sports. 650 points in total.
    pub fn campus_treasures() -> Vec<Treasure> {
        vec![
            treasure("library", "Main Library", 40.7291, -73.9965, 100, Category::Academic, "Rows of silent towers"),
            treasure("science-lab", "Science Lab", 40.7295, -73.9950, 150, Category::Academic, "Where beakers bubble"),
            treasure("student-union", "Student Union", 40.7302, -73.9973, 80, Category::Social, "Coffee and conversation"),
            treasure("clock-tower", "Clock Tower", 40.7310, -73.9958, 200, Category::History, "It strikes every hour"),
            treasure("stadium", "Stadium", 40.7280, -73.9940, 120, Category::Sports, "Listen for the roar"),
        ]
    }

    pub fn campus_total_points() -> u64 {
        campus_treasures().iter().map(|t| u64::from(t.points)).sum()
    }

    /// An in-memory catalog loaded with [`campus_treasures`].
    pub fn campus_catalog() -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new();
        for treasure in campus_treasures() {
            catalog
                .upsert(treasure)
                .unwrap_or_else(|e| panic!("campus fixture must be valid: {}", e));
        }
        catalog
    }

    pub fn campus_treasure(id: &str) -> Treasure {
        campus_treasures()
            .into_iter()
            .find(|t| t.id.as_str() == id)
            .unwrap_or_else(|| panic!("no campus treasure {}", id))
    }

    /// A point roughly `meters` north of `origin`.
    pub fn offset_north(origin: Coordinate, meters: f64) -> Coordinate {
        let degrees = meters / geohunt_core::rules::EARTH_RADIUS_METERS;
        Coordinate::new(origin.latitude + degrees.to_degrees(), origin.longitude)
    }

    pub fn player(name: &str) -> PlayerId {
        PlayerId::new(name)
    }
}

// ============================================================================
// MOCK COLLABORATORS
// ============================================================================

/// Which store operation a [`FailingProgressStore`] breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Get,
    Insert,
    Save,
    Delete,
    Health,
}

/// Wraps an in-memory store and fails selected operations.
#[derive(Debug, Clone, Default)]
pub struct FailingProgressStore {
    inner: InMemoryProgressStore,
    failures: HashMap<StoreOp, StorageError>,
}

impl FailingProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `op` fail with [`StorageError::Unavailable`].
    pub fn unavailable_on(self, op: StoreOp) -> Self {
        self.failing_with(
            op,
            StorageError::Unavailable {
                reason: "connection refused".to_string(),
            },
        )
    }

    pub fn failing_with(mut self, op: StoreOp, error: StorageError) -> Self {
        self.failures.insert(op, error);
        self
    }

    pub fn inner(&self) -> &InMemoryProgressStore {
        &self.inner
    }

    fn check(&self, op: StoreOp) -> GeohuntResult<()> {
        match self.failures.get(&op) {
            Some(err) => Err(GeohuntError::Storage(err.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProgressStore for FailingProgressStore {
    async fn progress_get(&self, player_id: &PlayerId) -> GeohuntResult<Option<PlayerProgress>> {
        self.check(StoreOp::Get)?;
        self.inner.progress_get(player_id).await
    }

    async fn progress_insert(&self, progress: &PlayerProgress) -> GeohuntResult<PlayerProgress> {
        self.check(StoreOp::Insert)?;
        self.inner.progress_insert(progress).await
    }

    async fn progress_save(
        &self,
        progress: &PlayerProgress,
        expected_version: u64,
    ) -> GeohuntResult<PlayerProgress> {
        self.check(StoreOp::Save)?;
        self.inner.progress_save(progress, expected_version).await
    }

    async fn progress_delete(&self, player_id: &PlayerId) -> GeohuntResult<()> {
        self.check(StoreOp::Delete)?;
        self.inner.progress_delete(player_id).await
    }

    async fn health_check(&self) -> GeohuntResult<()> {
        self.check(StoreOp::Health)?;
        self.inner.health_check().await
    }
}

/// Flavor provider returning a fixed string and counting calls.
#[derive(Debug, Default)]
pub struct MockFlavorProvider {
    text: String,
    calls: AtomicUsize,
}

impl MockFlavorProvider {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl FlavorProvider for MockFlavorProvider {
    async fn generate(&self, _: FlavorKind, _: &FlavorContext) -> Result<String, FlavorError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.text.clone())
    }

    fn provider_id(&self) -> &str {
        "mock"
    }
}

/// Flavor provider that always fails.
#[derive(Debug, Clone, Default)]
pub struct FailingFlavorProvider;

#[async_trait]
impl FlavorProvider for FailingFlavorProvider {
    async fn generate(&self, _: FlavorKind, _: &FlavorContext) -> Result<String, FlavorError> {
        Err(FlavorError::RequestFailed {
            provider: "failing".to_string(),
            status: 503,
            message: "service unavailable".to_string(),
        })
    }

    fn provider_id(&self) -> &str {
        "failing"
    }
}

/// Flavor provider that answers only after `delay`.
#[derive(Debug, Clone)]
pub struct SlowFlavorProvider {
    pub delay: Duration,
}

#[async_trait]
impl FlavorProvider for SlowFlavorProvider {
    async fn generate(&self, _: FlavorKind, _: &FlavorContext) -> Result<String, FlavorError> {
        tokio::time::sleep(self.delay).await;
        Ok("eventually".to_string())
    }

    fn provider_id(&self) -> &str {
        "slow"
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

/// Assert the progress invariants against the catalog the unlocks came from.
pub fn assert_progress_consistent(progress: &PlayerProgress, catalog: &[Treasure]) {
    assert!(
        progress.is_consistent(),
        "points/level/uniqueness invariant broken: {:?}",
        progress
    );
    let catalog_sum: u64 = progress
        .unlocked_ids()
        .filter_map(|id| catalog.iter().find(|t| &t.id == id))
        .map(|t| u64::from(t.points))
        .sum();
    assert_eq!(
        catalog_sum, progress.total_points,
        "total points do not match the catalog"
    );
    let fresh = badge::evaluate(progress.unlocked_ids(), catalog);
    assert!(
        progress.badges.is_superset(&fresh),
        "stored badges {:?} miss evaluated {:?}",
        progress.badges,
        fresh
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use geohunt_storage::TreasureCatalog;

    #[test]
    fn test_campus_fixture_totals() {
        assert_eq!(fixtures::campus_treasures().len(), 5);
        assert_eq!(fixtures::campus_total_points(), 650);
    }

    #[tokio::test]
    async fn test_campus_catalog_loads() -> GeohuntResult<()> {
        let catalog = fixtures::campus_catalog();
        assert_eq!(catalog.treasure_list().await?.len(), 5);
        Ok(())
    }

    #[test]
    fn test_offset_north_distance() {
        let origin = fixtures::campus_treasure("library").location;
        let moved = fixtures::offset_north(origin, 30.0);
        let d = geohunt_core::distance_meters(origin, moved);
        assert!((d - 30.0).abs() < 0.01, "got {}", d);
    }

    #[tokio::test]
    async fn test_failing_store_fails_selected_op() {
        let store = FailingProgressStore::new().unavailable_on(StoreOp::Save);
        let record = PlayerProgress::new(PlayerId::new("p"), chrono::Utc::now());
        assert!(store.progress_insert(&record).await.is_ok());
        assert!(matches!(
            store.progress_save(&record, 1).await,
            Err(GeohuntError::Storage(StorageError::Unavailable { .. }))
        ));
    }
}
