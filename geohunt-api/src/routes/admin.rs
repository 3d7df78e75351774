//! Administrative Routes

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use geohunt_core::PlayerId;
use geohunt_engine::UnlockEngine;
use std::sync::Arc;

use crate::{
    constants::MAX_ID_LENGTH,
    error::ApiResult,
    middleware::AdminExtractor,
    state::AppState,
    types::ResetResponse,
    validation::{ValidateMaxLength, ValidateNonEmpty},
};

/// POST /api/v1/admin/players/{player_id}/reset - Clear a player back to level 1
///
/// Keeps the record's creation time and welcome text.
pub async fn reset_progress(
    State(engine): State<Arc<UnlockEngine>>,
    AdminExtractor(admin): AdminExtractor,
    Path(player_id): Path<String>,
) -> ApiResult<Json<ResetResponse>> {
    player_id.validate_non_empty("player_id")?;
    player_id.validate_max_length("player_id", MAX_ID_LENGTH)?;

    let player_id = PlayerId::new(player_id);
    let progress = engine.reset_progress(&player_id).await?;

    tracing::info!(
        admin_id = %admin.player_id,
        player_id = %player_id,
        "player progress reset by admin"
    );

    Ok(Json(progress.into()))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/players/:player_id/reset", post(reset_progress))
}
