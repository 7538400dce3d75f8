//! Counting API Handlers
//!
//! Thin wrappers over the atomic repository procedures. Handlers never
//! compute quantities themselves; the accumulate/overwrite/delete logic
//! runs inside a single store transaction so concurrent counters cannot
//! lose updates. The UI refetches the session item list after each call.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::CountedItem;
use crate::db::repository::CountedItemRepository;
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct AddQuantityRequest {
    pub session_id: String,
    pub product_id: String,
    pub quantity: f64,
    pub user_id: String,
}

/// POST /api/counts/add - accumulate quantity onto a (session, product)
pub async fn add_quantity(
    State(state): State<ServerState>,
    Json(payload): Json<AddQuantityRequest>,
) -> AppResult<Json<CountedItem>> {
    let repo = CountedItemRepository::new(state.get_db());
    let item = repo
        .add_quantity(
            &payload.session_id,
            &payload.product_id,
            payload.quantity,
            &payload.user_id,
        )
        .await?;

    tracing::debug!(
        session = %payload.session_id,
        product = %payload.product_id,
        quantity = payload.quantity,
        "Quantity added"
    );
    Ok(Json(item))
}

#[derive(Debug, Deserialize)]
pub struct CorrectQuantityRequest {
    pub quantity: f64,
    pub user_id: String,
}

/// PUT /api/counts/{id} - overwrite an item's quantity (correction)
pub async fn correct_quantity(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<CorrectQuantityRequest>,
) -> AppResult<Json<CountedItem>> {
    let repo = CountedItemRepository::new(state.get_db());
    let item = repo
        .correct_quantity(&id, payload.quantity, &payload.user_id)
        .await?;
    Ok(Json(item))
}

#[derive(Debug, Deserialize)]
pub struct RemoveItemQuery {
    pub user_id: String,
}

/// DELETE /api/counts/{id}?user_id= - remove a counted item
///
/// Fails with 403 unless the acting user owns the item's session.
pub async fn remove_item(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<RemoveItemQuery>,
) -> AppResult<Json<bool>> {
    let repo = CountedItemRepository::new(state.get_db());
    repo.remove_item(&id, &query.user_id).await?;
    Ok(Json(true))
}
