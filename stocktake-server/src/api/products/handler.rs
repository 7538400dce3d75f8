//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::Product;
use crate::db::repository::ProductRepository;
use crate::utils::{AppError, AppResult};

/// Query params for product search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search term matched against code and description
    pub q: Option<String>,
    pub limit: Option<usize>,
}

/// GET /api/products?q=&limit= - search the catalog
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let repo = ProductRepository::new(state.get_db());
    let limit = query.limit.unwrap_or(state.config.search_limit);

    let products = match query.q.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => repo.search(term, limit).await?,
        _ => repo.find_all().await?,
    };
    Ok(Json(products))
}

/// GET /api/products/{id} - single product
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.get_db());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {} not found", id)))?;
    Ok(Json(product))
}

/// GET /api/products/by-barcode/{scanned} - resolve a scanned code
///
/// A 404 here is the "unknown barcode" state the UI answers with its
/// "link this code to a product" action; it is not a failure.
pub async fn get_by_scanned_code(
    State(state): State<ServerState>,
    Path(scanned): Path<String>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.get_db());
    let product = repo
        .find_by_scanned_code(scanned.trim())
        .await?
        .ok_or_else(|| AppError::not_found(format!("No product matches code '{}'", scanned)))?;
    Ok(Json(product))
}

#[derive(Debug, Deserialize)]
pub struct LinkBarcodeRequest {
    pub barcode: String,
}

/// PUT /api/products/{id}/barcode - link a scanned barcode to a product
pub async fn link_barcode(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<LinkBarcodeRequest>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.get_db());
    let product = repo.link_barcode(&id, &payload.barcode).await?;
    tracing::info!(product = %product.code, barcode = ?product.barcode, "Barcode linked");
    Ok(Json(product))
}
