//! GeoHunt API Server Entry Point
//!
//! Bootstraps configuration, the treasure catalog and the flavor-text
//! provider, then starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use geohunt_api::{
    constants::{DEFAULT_BIND_HOST, DEFAULT_PORT},
    create_api_router,
    jobs::lock_prune_task,
    telemetry::{init_tracer, TelemetryConfig},
    ApiConfig, ApiError, ApiResult, AppState,
};
use geohunt_engine::UnlockEngine;
use geohunt_flavor::{FlavorService, HttpFlavorConfig, HttpFlavorProvider};
use geohunt_storage::InMemoryProgressStore;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracer(&telemetry_config)?;

    let api_config = ApiConfig::from_env();
    let catalog = Arc::new(api_config.load_catalog()?);
    let store = Arc::new(InMemoryProgressStore::new());

    let flavor = match HttpFlavorConfig::from_env() {
        Some(config) => {
            tracing::info!(model = %config.model, "flavor text provider configured");
            FlavorService::new(
                Arc::new(HttpFlavorProvider::new(config)),
                api_config.flavor_timeout,
            )
        }
        None => {
            tracing::info!("no flavor text provider configured, using static text");
            FlavorService::fallback_only()
        }
    };

    let engine = Arc::new(UnlockEngine::new(store, catalog).with_flavor(flavor.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let prune = tokio::spawn(lock_prune_task(
        engine.clone(),
        api_config.lock_prune_interval,
        shutdown_rx,
    ));

    let app: Router = create_api_router(AppState::new(engine, flavor), &api_config);

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting GeoHunt API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    let _ = shutdown_tx.send(true);
    if let Err(e) = prune.await {
        tracing::warn!(error = %e, "lock prune task ended abnormally");
    }

    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("GEOHUNT_API_BIND").unwrap_or_else(|_| DEFAULT_BIND_HOST.to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("GEOHUNT_API_PORT").ok())
        .unwrap_or_else(|| DEFAULT_PORT.to_string());
    let port = port_str.parse::<u16>().map_err(|_| {
        ApiError::invalid_input(format!("Invalid port value: {}", port_str))
    })?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>().map_err(|e| {
        ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e))
    })
}
