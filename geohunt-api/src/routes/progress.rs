//! Progress REST API Routes
//!
//! The caller's own progress record, direct unlocks and scan redemption.
//! Every handler acts on the player named by the forwarded identity.

use axum::{extract::State, response::IntoResponse, routing::get, routing::post, Json, Router};
use geohunt_engine::UnlockEngine;
use std::sync::Arc;

use crate::{
    error::ApiResult,
    middleware::PlayerExtractor,
    state::AppState,
    types::{ProgressResponse, ScanRequest, ScanResponse, UnlockRequest, UnlockResponse},
    validation::ValidateRequest,
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/v1/progress - Current progress, created on first access
pub async fn get_progress(
    State(engine): State<Arc<UnlockEngine>>,
    PlayerExtractor(player): PlayerExtractor,
) -> ApiResult<Json<ProgressResponse>> {
    let progress = engine.get_progress(&player.player_id).await?;
    Ok(Json(progress.into()))
}

/// POST /api/v1/progress/unlock - Credit a treasure once
///
/// A repeat unlock answers 409 `ALREADY_UNLOCKED` and changes nothing.
pub async fn unlock_treasure(
    State(engine): State<Arc<UnlockEngine>>,
    PlayerExtractor(player): PlayerExtractor,
    Json(req): Json<UnlockRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;

    let receipt = engine
        .unlock_treasure(&player.player_id, &req.treasure_id())
        .await?;

    Ok(Json(UnlockResponse::from(receipt)))
}

/// POST /api/v1/progress/scan - Verify a scanned marker and position, then unlock
pub async fn redeem_scan(
    State(engine): State<Arc<UnlockEngine>>,
    PlayerExtractor(player): PlayerExtractor,
    Json(req): Json<ScanRequest>,
) -> ApiResult<Json<ScanResponse>> {
    req.validate()?;

    let redemption = engine
        .redeem_scan(
            &player.player_id,
            &req.treasure_id(),
            &req.payload,
            req.position(),
        )
        .await?;

    Ok(Json(redemption.into()))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_progress))
        .route("/unlock", post(unlock_treasure))
        .route("/scan", post(redeem_scan))
}
