//! GeoHunt Core - Types and Game Rules
//!
//! Data model, error taxonomy and the pure rule functions of the
//! progress/unlock engine: proximity, marker classification, levels and
//! badges. No I/O lives here; every other crate depends on this one.

pub mod badge;
pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod geo;
pub mod identity;
pub mod level;
pub mod qr;
pub mod rules;
pub mod unlock;

pub use badge::{Badge, BadgeParseError};
pub use config::GameConfig;
pub use entities::{validate_treasure_id, PlayerProgress, Treasure, UnlockRecord};
pub use enums::{Category, CategoryParseError, EntityType};
pub use error::{
    ConfigError, FlavorError, GeohuntError, GeohuntResult, ProgressError, StorageError,
    ValidationError,
};
pub use geo::{distance_from_fix, distance_meters, is_within_range, Coordinate, ProximityCheck};
pub use identity::{PlayerId, Points, Timestamp, TreasureId};
pub use level::{level_for_points, points_to_next_level};
pub use qr::{classify, encode_payload, parse_payload, ScanClassification};
pub use rules::{POINTS_PER_LEVEL, QR_NAMESPACE, RULES_VERSION, UNLOCK_RADIUS_METERS};
pub use unlock::{apply_unlock, unlock_message, UnlockPhase};
