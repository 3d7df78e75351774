//! API Configuration Module
//!
//! Server settings loaded from `GEOHUNT_*` environment variables with
//! development defaults: CORS, flavor-text budget and the treasure catalog
//! seed file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use geohunt_core::Treasure;
use geohunt_storage::InMemoryCatalog;

use crate::constants::{
    DEFAULT_CORS_MAX_AGE_SECS, DEFAULT_FLAVOR_TIMEOUT_MS, DEFAULT_LOCK_PRUNE_INTERVAL_SECS,
};
use crate::error::{ApiError, ApiResult};

// ============================================================================
// API CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Collaborators
    // ========================================================================
    /// Budget for one flavor-text generation before the fallback is used.
    pub flavor_timeout: Duration,

    /// JSON file holding the treasure catalog (an array of treasures).
    pub catalog_path: Option<PathBuf>,

    /// Interval of the background job that drops idle player locks.
    pub lock_prune_interval: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(), // Empty = allow all
            cors_allow_credentials: false,
            cors_max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
            flavor_timeout: Duration::from_millis(DEFAULT_FLAVOR_TIMEOUT_MS),
            catalog_path: None,
            lock_prune_interval: Duration::from_secs(DEFAULT_LOCK_PRUNE_INTERVAL_SECS),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `GEOHUNT_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `GEOHUNT_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `GEOHUNT_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `GEOHUNT_FLAVOR_TIMEOUT_MS`: Flavor-text budget (default: 5000)
    /// - `GEOHUNT_CATALOG_PATH`: Treasure catalog JSON file (default: none)
    /// - `GEOHUNT_LOCK_PRUNE_INTERVAL_SECS`: Idle lock cleanup interval (default: 300)
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("GEOHUNT_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = std::env::var("GEOHUNT_CORS_ALLOW_CREDENTIALS")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let cors_max_age_secs = std::env::var("GEOHUNT_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CORS_MAX_AGE_SECS);

        let flavor_timeout_ms = std::env::var("GEOHUNT_FLAVOR_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|ms: &u64| *ms > 0)
            .unwrap_or(DEFAULT_FLAVOR_TIMEOUT_MS);

        let catalog_path = std::env::var("GEOHUNT_CATALOG_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let lock_prune_secs = std::env::var("GEOHUNT_LOCK_PRUNE_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|secs: &u64| *secs > 0)
            .unwrap_or(DEFAULT_LOCK_PRUNE_INTERVAL_SECS);

        Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            flavor_timeout: Duration::from_millis(flavor_timeout_ms),
            catalog_path,
            lock_prune_interval: Duration::from_secs(lock_prune_secs),
        }
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }
        self.cors_origins.iter().any(|allowed| allowed == origin)
    }

    /// Build the treasure catalog from the configured seed file.
    ///
    /// Without a seed file the catalog starts empty and is filled by the
    /// admin tooling that owns it.
    pub fn load_catalog(&self) -> ApiResult<InMemoryCatalog> {
        match &self.catalog_path {
            Some(path) => load_catalog_file(path),
            None => {
                tracing::warn!("GEOHUNT_CATALOG_PATH not set, starting with an empty catalog");
                Ok(InMemoryCatalog::new())
            }
        }
    }
}

/// Parse a JSON array of treasures into a validated catalog.
pub fn load_catalog_file(path: &Path) -> ApiResult<InMemoryCatalog> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ApiError::internal_error(format!(
            "Failed to read catalog {}: {}",
            path.display(),
            e
        ))
    })?;
    parse_catalog(&raw)
}

pub(crate) fn parse_catalog(raw: &str) -> ApiResult<InMemoryCatalog> {
    let treasures: Vec<Treasure> = serde_json::from_str(raw)?;
    let count = treasures.len();
    let catalog = InMemoryCatalog::from_treasures(treasures)?;
    tracing::info!(treasures = count, "treasure catalog loaded");
    Ok(catalog)
}
