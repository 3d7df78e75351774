//! The award step of the unlock transaction, as a pure function.

use crate::badge;
use crate::entities::{PlayerProgress, Treasure, UnlockRecord};
use crate::error::ProgressError;
use crate::level::level_for_points;
use crate::{Points, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phases of one unlock attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnlockPhase {
    Requested,
    TargetResolved,
    AlreadyUnlocked,
    Awarded,
    TargetNotFound,
}

impl UnlockPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnlockPhase::Requested => "requested",
            UnlockPhase::TargetResolved => "target_resolved",
            UnlockPhase::AlreadyUnlocked => "already_unlocked",
            UnlockPhase::Awarded => "awarded",
            UnlockPhase::TargetNotFound => "target_not_found",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UnlockPhase::AlreadyUnlocked | UnlockPhase::Awarded | UnlockPhase::TargetNotFound
        )
    }
}

impl fmt::Display for UnlockPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credit `treasure` to `progress` and rederive level and badges.
///
/// Badges are evaluated against `catalog` in full. The returned record keeps
/// the input `version`; bumping it is the store's job.
pub fn apply_unlock(
    progress: &PlayerProgress,
    treasure: &Treasure,
    catalog: &[Treasure],
    now: Timestamp,
) -> Result<PlayerProgress, ProgressError> {
    if progress.has_unlocked(&treasure.id) {
        return Err(ProgressError::AlreadyUnlocked {
            player_id: progress.player_id.clone(),
            treasure_id: treasure.id.clone(),
        });
    }

    let mut next = progress.clone();
    let awarded = Points::from(treasure.points);
    next.unlocked_treasures.push(UnlockRecord {
        treasure_id: treasure.id.clone(),
        points_awarded: awarded,
        unlocked_at: now,
    });
    next.total_points = next.total_points.saturating_add(awarded);
    next.level = level_for_points(next.total_points);
    next.badges = badge::recompute(&progress.badges, next.unlocked_ids(), catalog);
    next.updated_at = now;
    Ok(next)
}

/// Human-readable success message.
pub fn unlock_message(treasure: &Treasure) -> String {
    format!("Unlocked {}! +{} points", treasure.name, treasure.points)
}
