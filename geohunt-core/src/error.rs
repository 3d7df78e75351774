//! Error types for GeoHunt operations

use crate::{EntityType, PlayerId, TreasureId};
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: String },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Version conflict for player {player_id}: expected {expected}, found {actual}")]
    VersionConflict {
        player_id: PlayerId,
        expected: u64,
        actual: u64,
    },

    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Unlock transaction outcomes that are not successes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProgressError {
    #[error("Treasure not found: {treasure_id}")]
    TreasureNotFound { treasure_id: TreasureId },

    /// Idempotent no-op: the treasure is already credited to this player.
    #[error("Treasure {treasure_id} already unlocked by player {player_id}")]
    AlreadyUnlocked {
        player_id: PlayerId,
        treasure_id: TreasureId,
    },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Flavor-text provider errors. Never fatal to gameplay.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlavorError {
    #[error("No flavor provider configured")]
    ProviderNotConfigured,

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} timed out after {after_ms}ms")]
    Timeout { provider: String, after_ms: u64 },
}

/// Master error type for all GeoHunt errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeohuntError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Progress error: {0}")]
    Progress(#[from] ProgressError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Flavor error: {0}")]
    Flavor(#[from] FlavorError),
}

impl GeohuntError {
    /// True for the idempotent "nothing to do" outcome.
    pub fn is_already_unlocked(&self) -> bool {
        matches!(self, GeohuntError::Progress(ProgressError::AlreadyUnlocked { .. }))
    }
}

/// Result type alias for GeoHunt operations.
pub type GeohuntResult<T> = Result<T, GeohuntError>;

// =============================================================================
// TESTS
// =============================================================================
