//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use freshbasket_core::ProductId;

use super::parse_id;
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::product::{Product, ProductInput};
use crate::state::AppState;

/// Minimum length of a path search query.
const MIN_SEARCH_LEN: usize = 2;

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

/// List products, optionally filtered by `?search=`.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = state
        .catalog()
        .list(state.pool(), query.search.as_deref())
        .await?;
    Ok(Json(Vec::clone(&products)))
}

/// Search products by name, category or description.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Result<Json<Vec<Product>>> {
    let query = query.trim();
    if query.chars().count() < MIN_SEARCH_LEN {
        return Err(AppError::BadRequest(format!(
            "Search query must be at least {MIN_SEARCH_LEN} characters"
        )));
    }

    let products = state.catalog().list(state.pool(), Some(query)).await?;
    Ok(Json(Vec::clone(&products)))
}

/// List products in a category.
#[instrument(skip(state))]
pub async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Product>>> {
    let products = state.catalog().by_category(state.pool(), &category).await?;
    Ok(Json(Vec::clone(&products)))
}

/// Create a product.
#[instrument(skip(state, admin, payload))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    payload: std::result::Result<Json<ProductInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>)> {
    let Json(input) = payload?;
    let new_product = input.into_new()?;

    let product = ProductRepository::new(state.pool())
        .create(&new_product)
        .await?;
    state.catalog().invalidate().await;

    tracing::info!(
        product_id = %product.id,
        name = %product.name,
        admin = %admin.username,
        "Product created"
    );

    Ok((StatusCode::CREATED, Json(product)))
}

/// Update some fields of a product.
#[instrument(skip(state, admin, payload))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: std::result::Result<Json<ProductInput>, JsonRejection>,
) -> Result<Json<Product>> {
    let id: ProductId = parse_id(&key)?;
    let Json(input) = payload?;
    let changes = input.into_changes()?;

    let product = ProductRepository::new(state.pool())
        .update(id, &changes)
        .await
        .map_err(|e| not_found_as(e, "Product not found"))?;
    state.catalog().invalidate().await;

    tracing::info!(product_id = %id, admin = %admin.username, "Product updated");

    Ok(Json(product))
}

/// Delete a product.
#[instrument(skip(state, admin))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>> {
    let id: ProductId = parse_id(&key)?;

    ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| not_found_as(e, "Product not found"))?;
    state.catalog().invalidate().await;

    tracing::info!(product_id = %id, admin = %admin.username, "Product deleted");

    Ok(Json(json!({ "message": "Product deleted", "id": id })))
}

/// Give a repository `NotFound` a specific message.
pub(crate) fn not_found_as(err: crate::db::RepositoryError, message: &str) -> AppError {
    match err {
        crate::db::RepositoryError::NotFound => AppError::NotFound(message.to_string()),
        other => other.into(),
    }
}
