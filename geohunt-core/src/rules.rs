//! Game-balance constants.
//!
//! These values are part of the observable contract with clients and printed
//! markers. Changing any of them requires bumping [`RULES_VERSION`].

/// Version tag for the constants in this module.
pub const RULES_VERSION: u32 = 1;

/// A player must be strictly closer than this to scan a treasure.
pub const UNLOCK_RADIUS_METERS: f64 = 50.0;

/// Points required per level step.
pub const POINTS_PER_LEVEL: u64 = 200;

/// Namespace literal printed in front of every marker payload.
pub const QR_NAMESPACE: &str = "geohunt";

/// Separator between namespace and treasure identifier.
pub const QR_SEPARATOR: char = ':';

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
