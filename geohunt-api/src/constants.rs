//! Constants for GeoHunt API
//!
//! Centralized so they are easy to find and test.

// ============================================================================
// IDENTITY HEADERS
// ============================================================================

/// Header carrying the authenticated player id, set by the upstream gateway.
pub const PLAYER_ID_HEADER: &str = "x-player-id";

/// Header carrying the caller's role.
pub const PLAYER_ROLE_HEADER: &str = "x-player-role";

/// Role value required by administrative routes.
pub const ADMIN_ROLE: &str = "admin";

/// Request correlation header.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// ============================================================================
// SERVER
// ============================================================================

pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 3000;

/// Default CORS max age in seconds (24 hours)
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86400;

/// Default budget for one flavor-text generation in milliseconds
pub const DEFAULT_FLAVOR_TIMEOUT_MS: u64 = 5000;

/// How often idle per-player lock entries are dropped
pub const DEFAULT_LOCK_PRUNE_INTERVAL_SECS: u64 = 300;

// ============================================================================
// INPUT LIMITS
// ============================================================================

/// Longest accepted identifier (player or treasure)
pub const MAX_ID_LENGTH: usize = 128;

/// Longest accepted scanned payload
pub const MAX_PAYLOAD_LENGTH: usize = 512;
