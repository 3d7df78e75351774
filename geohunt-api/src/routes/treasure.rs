//! Treasure REST API Routes
//!
//! Read-only catalog view plus generated hints. Catalog edits belong to the
//! admin tooling that owns the catalog.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use geohunt_core::TreasureId;
use geohunt_engine::UnlockEngine;
use geohunt_flavor::{FlavorContext, FlavorService};
use std::sync::Arc;

use crate::{
    constants::MAX_ID_LENGTH,
    error::{ApiError, ApiResult},
    middleware::PlayerExtractor,
    state::AppState,
    types::{HintQuery, HintResponse, ListTreasuresResponse},
    validation::{ValidateMaxLength, ValidateNonEmpty},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/v1/treasures - List the catalog
pub async fn list_treasures(
    State(engine): State<Arc<UnlockEngine>>,
) -> ApiResult<Json<ListTreasuresResponse>> {
    let treasures = engine.catalog().treasure_list().await?;
    Ok(Json(ListTreasuresResponse::new(treasures)))
}

/// GET /api/v1/treasures/{id}/hint - Hint, trivia or briefing for a treasure
///
/// Always answers: when the generator is down the static fallback is
/// returned with `source: "fallback"`.
pub async fn get_hint(
    State(engine): State<Arc<UnlockEngine>>,
    State(flavor): State<FlavorService>,
    PlayerExtractor(player): PlayerExtractor,
    Path(id): Path<String>,
    Query(query): Query<HintQuery>,
) -> ApiResult<Json<HintResponse>> {
    id.validate_non_empty("id")?;
    id.validate_max_length("id", MAX_ID_LENGTH)?;
    let kind = query.kind()?;

    let treasure_id = TreasureId::new(id);
    let treasure = engine
        .catalog()
        .treasure_get(&treasure_id)
        .await?
        .ok_or_else(|| ApiError::treasure_not_found(&treasure_id))?;

    let mut context = FlavorContext::for_treasure(&treasure);
    context.player_id = Some(player.player_id.clone());
    let text = flavor.generate(kind, &context).await;

    tracing::debug!(
        treasure_id = %treasure_id,
        kind = %kind,
        source = ?text.source,
        "flavor text served"
    );

    Ok(Json(HintResponse::new(treasure_id, kind, text)))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_treasures))
        .route("/:id/hint", get(get_hint))
}
