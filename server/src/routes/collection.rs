//! Collection endpoint routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::auth::AuthOwner;
use crate::error::Result;
use crate::handlers::{handle_add, handle_delete, handle_get_page, handle_sync, handle_update};
use crate::AppState;
use binder_engine::{
    AddCardResponse, CardDto, CardPatch, CollectionPage, ServerCard, SyncReport, SyncRequest,
};

/// Create collection routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/collection", get(list_handler).post(add_handler))
        .route("/collection/sync", post(sync_handler))
        .route(
            "/collection/{card_id}",
            put(update_handler).delete(delete_handler),
        )
}

/// Query parameters for the paginated read path.
#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<u32>,
    limit: Option<u32>,
}

/// GET /collection - one page of the caller's collection.
async fn list_handler(
    State(state): State<AppState>,
    owner: AuthOwner,
    Query(query): Query<PageQuery>,
) -> Result<Json<CollectionPage>> {
    let page = handle_get_page(&state.pool, &owner.owner_id, query.page, query.limit).await?;
    Ok(Json(page))
}

/// POST /collection - add a card (merge-on-insert).
async fn add_handler(
    State(state): State<AppState>,
    owner: AuthOwner,
    Json(card): Json<CardDto>,
) -> Result<Json<AddCardResponse>> {
    let response = handle_add(&state.pool, &owner.owner_id, card).await?;
    Ok(Json(response))
}

/// POST /collection/sync - reconcile a batch of client records.
async fn sync_handler(
    State(state): State<AppState>,
    owner: AuthOwner,
    Json(request): Json<SyncRequest>,
) -> Result<Json<SyncReport>> {
    let report = handle_sync(&state.pool, &owner.owner_id, request.cards).await?;
    Ok(Json(report))
}

/// PUT /collection/{card_id} - partial update of one row.
async fn update_handler(
    State(state): State<AppState>,
    owner: AuthOwner,
    Path(card_id): Path<String>,
    Json(patch): Json<CardPatch>,
) -> Result<Json<ServerCard>> {
    let card = handle_update(&state.pool, &owner.owner_id, &card_id, patch).await?;
    Ok(Json(card))
}

/// DELETE /collection/{card_id} - remove one row outright.
async fn delete_handler(
    State(state): State<AppState>,
    owner: AuthOwner,
    Path(card_id): Path<String>,
) -> Result<StatusCode> {
    handle_delete(&state.pool, &owner.owner_id, &card_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
