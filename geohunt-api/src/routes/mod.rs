//! REST API Routes Module
//!
//! - Player progress, unlock and scan under /api/v1/progress
//! - Read-only catalog and hints under /api/v1/treasures
//! - Admin reset under /api/v1/admin
//! - Health checks at /health/* (public)
//! - CORS support for the browser client

pub mod admin;
pub mod health;
pub mod progress;
pub mod treasure;

use std::time::Duration;

use axum::{
    http::{header, header::HeaderName, HeaderValue, Method},
    middleware::from_fn,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::constants::{PLAYER_ID_HEADER, PLAYER_ROLE_HEADER, REQUEST_ID_HEADER};
use crate::state::AppState;
use crate::telemetry::observability_middleware;

pub use admin::create_router as admin_router;
pub use health::create_router as health_router;
pub use progress::create_router as progress_router;
pub use treasure::create_router as treasure_router;

fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(PLAYER_ID_HEADER),
            HeaderName::from_static(PLAYER_ROLE_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        if config.cors_allow_credentials {
            cors.allow_origin(origins).allow_credentials(true)
        } else {
            cors.allow_origin(origins)
        }
    }
}

/// Create the complete API router.
///
/// Identity is checked per handler through the extractors in
/// [`crate::middleware`], so health routes stay public.
pub fn create_api_router(state: AppState, api_config: &ApiConfig) -> Router {
    let api_routes = Router::new()
        .nest("/progress", progress::create_router())
        .nest("/treasures", treasure::create_router())
        .nest("/admin", admin::create_router());

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health::create_router())
        .with_state(state);

    router
        .layer(from_fn(observability_middleware))
        .layer(build_cors_layer(api_config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_builds_in_both_modes() {
        let dev = ApiConfig::default();
        let _ = build_cors_layer(&dev);

        let prod = ApiConfig {
            cors_origins: vec!["https://hunt.campus.edu".to_string()],
            cors_allow_credentials: true,
            ..ApiConfig::default()
        };
        let _ = build_cors_layer(&prod);
    }
}
