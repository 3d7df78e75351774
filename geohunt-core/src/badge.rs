//! Badge definitions and the badge evaluator.
//!
//! Badges are recomputed from the full unlock set and the current catalog on
//! every unlock. The stored set is the union of the previous set and the
//! fresh evaluation, so a badge once earned is never revoked.

use crate::entities::Treasure;
use crate::{Category, TreasureId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

/// Category whose full collection earns a sweep badge.
pub const SWEEP_CATEGORY: Category = Category::Academic;

/// Category whose first unlock earns a taste badge.
pub const TASTE_CATEGORY: Category = Category::Social;

// ============================================================================
// BADGE
// ============================================================================

/// Achievement flag with a stable string identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Badge {
    FirstFind,
    CategorySweep(Category),
    CategoryTaste(Category),
    Completionist,
}

impl Badge {
    /// Stable identifier, e.g. `category-sweep:academic`.
    pub fn id(&self) -> String {
        match self {
            Badge::FirstFind => "first-find".to_string(),
            Badge::CategorySweep(category) => format!("category-sweep:{}", category),
            Badge::CategoryTaste(category) => format!("category-taste:{}", category),
            Badge::Completionist => "completionist".to_string(),
        }
    }

    pub fn from_id(s: &str) -> Result<Self, BadgeParseError> {
        match s {
            "first-find" => return Ok(Badge::FirstFind),
            "completionist" => return Ok(Badge::Completionist),
            _ => {}
        }
        let (kind, category) = s
            .split_once(':')
            .ok_or_else(|| BadgeParseError(s.to_string()))?;
        let category =
            Category::from_db_str(category).map_err(|_| BadgeParseError(s.to_string()))?;
        match kind {
            "category-sweep" => Ok(Badge::CategorySweep(category)),
            "category-taste" => Ok(Badge::CategoryTaste(category)),
            _ => Err(BadgeParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

impl FromStr for Badge {
    type Err = BadgeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s)
    }
}

impl From<Badge> for String {
    fn from(badge: Badge) -> Self {
        badge.id()
    }
}

impl TryFrom<String> for Badge {
    type Error = BadgeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_id(&value)
    }
}

/// Error when parsing an invalid badge identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeParseError(pub String);

impl fmt::Display for BadgeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid badge id: {}", self.0)
    }
}

impl std::error::Error for BadgeParseError {}

// ============================================================================
// EVALUATION
// ============================================================================

/// Evaluate every badge rule against the unlock set and the full catalog.
pub fn evaluate<'a, I>(unlocked: I, catalog: &[Treasure]) -> BTreeSet<Badge>
where
    I: IntoIterator<Item = &'a TreasureId>,
{
    let unlocked: HashSet<&TreasureId> = unlocked.into_iter().collect();
    let mut badges = BTreeSet::new();

    if !unlocked.is_empty() {
        badges.insert(Badge::FirstFind);
    }

    let mut sweep = catalog
        .iter()
        .filter(|t| t.category == SWEEP_CATEGORY)
        .peekable();
    if sweep.peek().is_some() && sweep.all(|t| unlocked.contains(&t.id)) {
        badges.insert(Badge::CategorySweep(SWEEP_CATEGORY));
    }

    if catalog
        .iter()
        .any(|t| t.category == TASTE_CATEGORY && unlocked.contains(&t.id))
    {
        badges.insert(Badge::CategoryTaste(TASTE_CATEGORY));
    }

    // Only catalog members count, so a removed treasure cannot pad the total.
    if !catalog.is_empty() && catalog.iter().all(|t| unlocked.contains(&t.id)) {
        badges.insert(Badge::Completionist);
    }

    badges
}

/// Previously earned badges unioned with a fresh evaluation.
pub fn recompute<'a, I>(
    previously_earned: &BTreeSet<Badge>,
    unlocked: I,
    catalog: &[Treasure],
) -> BTreeSet<Badge>
where
    I: IntoIterator<Item = &'a TreasureId>,
{
    let mut badges = previously_earned.clone();
    badges.extend(evaluate(unlocked, catalog));
    badges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    fn treasure(id: &str, category: Category) -> Treasure {
        Treasure {
            id: TreasureId::new(id),
            name: id.to_string(),
            location: Coordinate::new(0.0, 0.0),
            points: 100,
            category,
            clue: String::new(),
        }
    }

    fn catalog() -> Vec<Treasure> {
        vec![
            treasure("lib", Category::Academic),
            treasure("lab", Category::Academic),
            treasure("cafe", Category::Social),
            treasure("gym", Category::Sports),
        ]
    }

    fn ids(raw: &[&str]) -> Vec<TreasureId> {
        raw.iter().map(|s| TreasureId::new(*s)).collect()
    }

    #[test]
    fn test_no_unlocks_no_badges() {
        assert!(evaluate(&ids(&[]), &catalog()).is_empty());
    }

    #[test]
    fn test_first_find() {
        let badges = evaluate(&ids(&["gym"]), &catalog());
        assert_eq!(badges, BTreeSet::from([Badge::FirstFind]));
    }

    #[test]
    fn test_academic_sweep_requires_all_academic() {
        let partial = evaluate(&ids(&["lib"]), &catalog());
        assert!(!partial.contains(&Badge::CategorySweep(Category::Academic)));

        let full = evaluate(&ids(&["lib", "lab"]), &catalog());
        assert!(full.contains(&Badge::CategorySweep(Category::Academic)));
        assert!(!full.contains(&Badge::Completionist));
    }

    #[test]
    fn test_sweep_needs_an_academic_treasure_to_exist() {
        let catalog = vec![treasure("cafe", Category::Social)];
        let badges = evaluate(&ids(&["cafe"]), &catalog);
        assert!(!badges.contains(&Badge::CategorySweep(Category::Academic)));
        assert!(badges.contains(&Badge::Completionist));
    }

    #[test]
    fn test_social_taste() {
        let badges = evaluate(&ids(&["cafe"]), &catalog());
        assert!(badges.contains(&Badge::CategoryTaste(Category::Social)));
    }

    #[test]
    fn test_completionist_requires_non_empty_catalog() {
        assert!(!evaluate(&ids(&["ghost"]), &[]).contains(&Badge::Completionist));
    }

    #[test]
    fn test_removed_treasure_does_not_count_toward_completionist() {
        let badges = evaluate(&ids(&["lib", "lab", "cafe", "ghost"]), &catalog());
        assert!(!badges.contains(&Badge::Completionist));
    }

    #[test]
    fn test_recompute_never_revokes() {
        let earned = evaluate(&ids(&["lib", "lab"]), &catalog());
        assert!(earned.contains(&Badge::CategorySweep(Category::Academic)));

        let mut grown = catalog();
        grown.push(treasure("museum-annex", Category::Academic));
        let fresh = evaluate(&ids(&["lib", "lab"]), &grown);
        assert!(!fresh.contains(&Badge::CategorySweep(Category::Academic)));

        let kept = recompute(&earned, &ids(&["lib", "lab"]), &grown);
        assert!(kept.contains(&Badge::CategorySweep(Category::Academic)));

        // A player who never had the sweep earns it once the new entry is found too.
        let latecomer = recompute(&BTreeSet::new(), &ids(&["lib", "lab"]), &grown);
        assert!(!latecomer.contains(&Badge::CategorySweep(Category::Academic)));
        let swept = recompute(&latecomer, &ids(&["lib", "lab", "museum-annex"]), &grown);
        assert!(swept.contains(&Badge::CategorySweep(Category::Academic)));
        assert!(latecomer.is_subset(&swept));
    }

    #[test]
    fn test_badge_ids_are_stable() {
        assert_eq!(Badge::FirstFind.id(), "first-find");
        assert_eq!(
            Badge::CategorySweep(Category::Academic).id(),
            "category-sweep:academic"
        );
        assert_eq!(
            Badge::CategoryTaste(Category::Social).id(),
            "category-taste:social"
        );
        assert_eq!(Badge::Completionist.id(), "completionist");
    }

    #[test]
    fn test_badge_parse() {
        assert_eq!(
            "category-sweep:academic".parse::<Badge>(),
            Ok(Badge::CategorySweep(Category::Academic))
        );
        assert!("category-sweep:music".parse::<Badge>().is_err());
        assert!("legend".parse::<Badge>().is_err());
    }

    #[test]
    fn test_badge_set_serializes_as_ids() -> Result<(), serde_json::Error> {
        let set = BTreeSet::from([Badge::Completionist, Badge::FirstFind]);
        let json = serde_json::to_string(&set)?;
        assert_eq!(json, "[\"first-find\",\"completionist\"]");
        Ok(())
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::geo::Coordinate;
    use proptest::prelude::*;

    fn arb_catalog() -> impl Strategy<Value = Vec<Treasure>> {
        prop::collection::vec(0usize..4, 0..8).prop_map(|cats| {
            cats.into_iter()
                .enumerate()
                .map(|(i, c)| Treasure {
                    id: TreasureId::new(format!("t{}", i)),
                    name: format!("Treasure {}", i),
                    location: Coordinate::new(0.0, 0.0),
                    points: 10,
                    category: Category::ALL[c],
                    clue: String::new(),
                })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_evaluate_is_pure(catalog in arb_catalog(), mask in any::<u8>()) {
            let unlocked: Vec<TreasureId> = catalog
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, t)| t.id.clone())
                .collect();
            prop_assert_eq!(evaluate(&unlocked, &catalog), evaluate(&unlocked, &catalog));
        }

        #[test]
        fn prop_recompute_is_superset(catalog in arb_catalog(), mask in any::<u8>()) {
            let unlocked: Vec<TreasureId> = catalog
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, t)| t.id.clone())
                .collect();
            let previous = BTreeSet::from([Badge::Completionist]);
            let badges = recompute(&previous, &unlocked, &catalog);
            prop_assert!(badges.is_superset(&previous));
            prop_assert!(badges.is_superset(&evaluate(&unlocked, &catalog)));
        }
    }
}
