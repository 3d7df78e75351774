//! Catalog and progress entities

use crate::badge::Badge;
use crate::error::ValidationError;
use crate::geo::Coordinate;
use crate::level::level_for_points;
use crate::rules::{QR_SEPARATOR, RULES_VERSION};
use crate::{Category, PlayerId, Points, Timestamp, TreasureId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// TREASURE
// ============================================================================

/// A GPS-located collectible landmark. Read-only to the unlock engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treasure {
    pub id: TreasureId,
    pub name: String,
    pub location: Coordinate,
    pub points: u32,
    pub category: Category,
    pub clue: String,
}

impl Treasure {
    /// Validate a treasure before it enters the catalog.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_treasure_id(&self.id)?;
        if self.name.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "name".to_string(),
            });
        }
        self.location.validate()?;
        if self.points == 0 {
            return Err(ValidationError::InvalidValue {
                field: "points".to_string(),
                reason: "must be a positive integer".to_string(),
            });
        }
        Ok(())
    }
}

/// Treasure identifiers must survive the marker payload format unchanged.
pub fn validate_treasure_id(id: &TreasureId) -> Result<(), ValidationError> {
    let raw = id.as_str();
    if raw.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "treasure_id".to_string(),
        });
    }
    if raw.contains(QR_SEPARATOR) || raw.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidValue {
            field: "treasure_id".to_string(),
            reason: format!("'{}' must not contain whitespace or '{}'", raw, QR_SEPARATOR),
        });
    }
    Ok(())
}

// ============================================================================
// PLAYER PROGRESS
// ============================================================================

/// One credited treasure. Kept in unlock order for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockRecord {
    pub treasure_id: TreasureId,
    pub points_awarded: Points,
    pub unlocked_at: Timestamp,
}

/// Durable per-player progress record.
///
/// `level` and `badges` are derived fields. They are only written by the
/// unlock transaction and by [`PlayerProgress::reset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProgress {
    pub player_id: PlayerId,
    pub unlocked_treasures: Vec<UnlockRecord>,
    pub total_points: Points,
    pub level: u64,
    pub badges: BTreeSet<Badge>,
    pub welcome_text: Option<String>,
    pub rules_version: u32,
    /// Record version for compare-and-swap saves. Bumped by the store.
    pub version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PlayerProgress {
    /// Initial state: no unlocks, zero points, level 1, no badges.
    pub fn new(player_id: PlayerId, now: Timestamp) -> Self {
        Self {
            player_id,
            unlocked_treasures: Vec::new(),
            total_points: 0,
            level: level_for_points(0),
            badges: BTreeSet::new(),
            welcome_text: None,
            rules_version: RULES_VERSION,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_welcome_text(mut self, text: impl Into<String>) -> Self {
        self.welcome_text = Some(text.into());
        self
    }

    pub fn has_unlocked(&self, treasure_id: &TreasureId) -> bool {
        self.unlocked_treasures
            .iter()
            .any(|record| &record.treasure_id == treasure_id)
    }

    pub fn unlocked_ids(&self) -> impl Iterator<Item = &TreasureId> {
        self.unlocked_treasures.iter().map(|record| &record.treasure_id)
    }

    pub fn unlocked_count(&self) -> usize {
        self.unlocked_treasures.len()
    }

    /// Clear gameplay state back to the initial values.
    ///
    /// Identity, creation time, welcome text and record version are kept so
    /// the store can still compare-and-swap against the previous record.
    pub fn reset(&self, now: Timestamp) -> Self {
        Self {
            player_id: self.player_id.clone(),
            unlocked_treasures: Vec::new(),
            total_points: 0,
            level: level_for_points(0),
            badges: BTreeSet::new(),
            welcome_text: self.welcome_text.clone(),
            rules_version: RULES_VERSION,
            version: self.version,
            created_at: self.created_at,
            updated_at: now,
        }
    }

    /// Check the point and level invariants.
    pub fn is_consistent(&self) -> bool {
        let sum: Points = self
            .unlocked_treasures
            .iter()
            .map(|record| record.points_awarded)
            .sum();
        let unique: BTreeSet<&TreasureId> = self.unlocked_ids().collect();
        sum == self.total_points
            && self.level == level_for_points(self.total_points)
            && unique.len() == self.unlocked_treasures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn library() -> Treasure {
        Treasure {
            id: TreasureId::new("library"),
            name: "Main Library".to_string(),
            location: Coordinate::new(40.0, -75.0),
            points: 100,
            category: Category::Academic,
            clue: "Where the quiet ones gather".to_string(),
        }
    }

    #[test]
    fn test_valid_treasure_passes() {
        assert!(library().validate().is_ok());
    }

    #[test]
    fn test_treasure_rejects_zero_points() {
        let mut t = library();
        t.points = 0;
        assert!(matches!(
            t.validate(),
            Err(ValidationError::InvalidValue { field, .. }) if field == "points"
        ));
    }

    #[test]
    fn test_treasure_rejects_separator_in_id() {
        let mut t = library();
        t.id = TreasureId::new("lib:rary");
        assert!(t.validate().is_err());
        t.id = TreasureId::new("lib rary");
        assert!(t.validate().is_err());
        t.id = TreasureId::new("");
        assert!(matches!(
            t.validate(),
            Err(ValidationError::RequiredFieldMissing { .. })
        ));
    }

    #[test]
    fn test_treasure_rejects_blank_name() {
        let mut t = library();
        t.name = "   ".to_string();
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_new_progress_is_initial_state() {
        let progress = PlayerProgress::new(PlayerId::new("p1"), Utc::now());
        assert!(progress.unlocked_treasures.is_empty());
        assert_eq!(progress.total_points, 0);
        assert_eq!(progress.level, 1);
        assert!(progress.badges.is_empty());
        assert_eq!(progress.rules_version, RULES_VERSION);
        assert!(progress.is_consistent());
    }

    #[test]
    fn test_reset_keeps_identity_and_version() {
        let created = Utc::now();
        let mut progress =
            PlayerProgress::new(PlayerId::new("p1"), created).with_welcome_text("hello");
        progress.unlocked_treasures.push(UnlockRecord {
            treasure_id: TreasureId::new("library"),
            points_awarded: 100,
            unlocked_at: created,
        });
        progress.total_points = 100;
        progress.badges.insert(Badge::FirstFind);
        progress.version = 4;

        let reset = progress.reset(Utc::now());
        assert_eq!(reset.player_id, progress.player_id);
        assert_eq!(reset.created_at, created);
        assert_eq!(reset.version, 4);
        assert_eq!(reset.welcome_text.as_deref(), Some("hello"));
        assert_eq!(reset.total_points, 0);
        assert_eq!(reset.level, 1);
        assert!(reset.badges.is_empty());
        assert!(!reset.has_unlocked(&TreasureId::new("library")));
    }

    #[test]
    fn test_inconsistent_points_detected() {
        let mut progress = PlayerProgress::new(PlayerId::new("p1"), Utc::now());
        progress.total_points = 50;
        assert!(!progress.is_consistent());
    }
}
