//! Health Check Endpoints
//!
//! - /health/ping - Simple liveness check
//! - /health/live - Process alive check
//! - /health/ready - Progress store and catalog check
//!
//! No identity required for health endpoints.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use geohunt_engine::UnlockEngine;
use geohunt_flavor::FlavorService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDetails {
    pub store: ComponentHealth,
    pub catalog: ComponentHealth,
    pub treasures: usize,
    /// True when flavor text comes from a live generator
    pub flavor_provider: bool,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    fn healthy(latency_ms: u64) -> Self {
        Self {
            status: HealthStatus::Healthy,
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    fn failed(status: HealthStatus, error: impl Into<String>) -> Self {
        Self {
            status,
            latency_ms: None,
            error: Some(error.into()),
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health/ping - Simple pong response
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

/// GET /health/live - Process liveness check
pub async fn liveness() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("Process is alive".to_string()),
        details: None,
    };
    (StatusCode::OK, Json(response))
}

/// GET /health/ready - Readiness check
///
/// An unreachable store makes the service unready. An empty catalog only
/// degrades it: progress reads still work, nothing can be unlocked.
pub async fn readiness(
    State(engine): State<Arc<UnlockEngine>>,
    State(flavor): State<FlavorService>,
    State(start_time): State<Instant>,
) -> impl IntoResponse {
    let store = check_store(&engine).await;
    let (catalog, treasures) = check_catalog(&engine).await;

    let overall_status = if store.status != HealthStatus::Healthy {
        HealthStatus::Unhealthy
    } else if catalog.status != HealthStatus::Healthy {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    let response = HealthResponse {
        status: overall_status,
        message: None,
        details: Some(HealthDetails {
            store,
            catalog,
            treasures,
            flavor_provider: flavor.has_provider(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: start_time.elapsed().as_secs(),
        }),
    };

    let status_code = if overall_status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(response))
}

async fn check_store(engine: &UnlockEngine) -> ComponentHealth {
    let start = Instant::now();
    match engine.store().health_check().await {
        Ok(()) => ComponentHealth::healthy(elapsed_ms(start)),
        Err(e) => {
            tracing::warn!(error = %e, "progress store health check failed");
            ComponentHealth::failed(HealthStatus::Unhealthy, format!("Store check failed: {}", e))
        }
    }
}

async fn check_catalog(engine: &UnlockEngine) -> (ComponentHealth, usize) {
    let start = Instant::now();
    match engine.catalog().treasure_list().await {
        Ok(treasures) if treasures.is_empty() => (
            ComponentHealth::failed(HealthStatus::Degraded, "Catalog is empty"),
            0,
        ),
        Ok(treasures) => (
            ComponentHealth::healthy(elapsed_ms(start)),
            treasures.len(),
        ),
        Err(e) => (
            ComponentHealth::failed(HealthStatus::Degraded, format!("Catalog check failed: {}", e)),
            0,
        ),
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create health check router (no identity required)
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}
