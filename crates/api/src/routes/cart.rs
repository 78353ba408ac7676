//! Cart route handlers.
//!
//! Every handler is scoped to the caller's [`ClientId`].

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use freshbasket_core::{
    CartError, CartItemId, CustomerDetails, OrderError, OrderMessage, Price, ProductId, Quantity,
    QuantityUnit, UnitError, line_price,
};

use super::parse_id;
use super::products::not_found_as;
use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::ClientId;
use crate::models::cart::{CartItemView, CartView, to_cart};
use crate::state::AppState;

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: Decimal,
    /// Defaults to the product's own unit.
    pub unit: Option<String>,
}

/// Quantity update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: Decimal,
    /// Defaults to the line's current unit.
    pub unit: Option<String>,
}

/// Checkout response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub total: Decimal,
    pub message: String,
    pub whatsapp_url: String,
}

const fn one() -> Decimal {
    Decimal::ONE
}

/// Build a quantity in `unit` (or `default_unit`) that fits `priced_unit`
/// and can be priced at `unit_price`.
fn requested_quantity(
    amount: Decimal,
    unit: Option<&str>,
    default_unit: QuantityUnit,
    unit_price: Price,
    priced_unit: QuantityUnit,
) -> Result<Quantity> {
    let unit = unit
        .map(QuantityUnit::parse)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?
        .unwrap_or(default_unit);

    if !unit.is_compatible(priced_unit) {
        return Err(AppError::BadRequest(format!(
            "{unit} cannot be used for a product sold per {priced_unit}"
        )));
    }

    let quantity = Quantity::new(amount, unit).map_err(|e| AppError::BadRequest(e.to_string()))?;
    line_price(unit_price, priced_unit, &quantity).map_err(pricing_error)?;
    Ok(quantity)
}

/// Overflow is the caller asking for too much; anything else is a bad row.
fn pricing_error(e: UnitError) -> AppError {
    match e {
        UnitError::Overflow | UnitError::TooLarge => {
            AppError::BadRequest("Cart total is too large".to_string())
        }
        other => AppError::Internal(format!("cart line cannot be priced: {other}")),
    }
}

fn cart_error(e: CartError) -> AppError {
    match e {
        CartError::Unit(e) => pricing_error(e),
        other => AppError::Internal(format!("cart line cannot be priced: {other}")),
    }
}

/// Show the caller's cart.
#[instrument(skip(state))]
pub async fn show(
    ClientId(client_id): ClientId,
    State(state): State<AppState>,
) -> Result<Json<CartView>> {
    let items = CartRepository::new(state.pool()).list(client_id).await?;
    let view = CartView::build(items).map_err(pricing_error)?;
    Ok(Json(view))
}

/// Add a product to the caller's cart.
#[instrument(skip(state, payload))]
pub async fn add(
    ClientId(client_id): ClientId,
    State(state): State<AppState>,
    payload: std::result::Result<Json<AddToCartRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CartItemView>)> {
    let Json(request) = payload?;

    let product = ProductRepository::new(state.pool())
        .get(request.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let quantity = requested_quantity(
        request.quantity,
        request.unit.as_deref(),
        product.quantity_unit,
        product.price,
        product.quantity_unit,
    )?;

    let item = CartRepository::new(state.pool())
        .add(client_id, product.id, quantity)
        .await?;

    tracing::debug!(product_id = %product.id, %quantity, "Added to cart");

    let view = item.into_view().map_err(pricing_error)?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Replace the quantity of one of the caller's lines.
#[instrument(skip(state, payload))]
pub async fn update(
    ClientId(client_id): ClientId,
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    payload: std::result::Result<Json<UpdateQuantityRequest>, JsonRejection>,
) -> Result<Json<CartItemView>> {
    let id: CartItemId = parse_id(&item_id)?;
    let Json(request) = payload?;

    let carts = CartRepository::new(state.pool());
    let item = carts
        .get(client_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))?;

    let quantity = requested_quantity(
        request.quantity,
        request.unit.as_deref(),
        item.quantity.unit(),
        item.product.price,
        item.product.quantity_unit,
    )?;

    let item = carts
        .set_quantity(client_id, id, quantity)
        .await
        .map_err(|e| not_found_as(e, "Cart item not found"))?;

    let view = item.into_view().map_err(pricing_error)?;
    Ok(Json(view))
}

/// Remove one of the caller's lines.
#[instrument(skip(state))]
pub async fn remove(
    ClientId(client_id): ClientId,
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Json<Value>> {
    let id: CartItemId = parse_id(&item_id)?;

    CartRepository::new(state.pool())
        .remove(client_id, id)
        .await
        .map_err(|e| not_found_as(e, "Cart item not found"))?;

    Ok(Json(json!({ "message": "Item removed", "id": id })))
}

/// Empty the caller's cart.
#[instrument(skip(state))]
pub async fn clear(
    ClientId(client_id): ClientId,
    State(state): State<AppState>,
) -> Result<Json<Value>> {
    let removed = CartRepository::new(state.pool()).clear(client_id).await?;
    Ok(Json(json!({ "message": "Cart cleared", "removed": removed })))
}

/// Render the caller's cart as a WhatsApp order link.
///
/// The cart is left as is; the order only exists in the WhatsApp chat.
#[instrument(skip(state, payload))]
pub async fn checkout(
    ClientId(client_id): ClientId,
    State(state): State<AppState>,
    payload: std::result::Result<Json<CustomerDetails>, JsonRejection>,
) -> Result<Json<CheckoutResponse>> {
    let shop_number = state
        .config()
        .whatsapp_number
        .as_deref()
        .ok_or_else(|| AppError::Unavailable("WhatsApp ordering is not configured".to_string()))?;
    let Json(details) = payload?;

    let items = CartRepository::new(state.pool()).list(client_id).await?;
    let cart = to_cart(&items).map_err(cart_error)?;

    let message = OrderMessage::new(&cart, &details).map_err(|e| match e {
        OrderError::EmptyCart => AppError::BadRequest("Cart is empty".to_string()),
        OrderError::Unit(e) => pricing_error(e),
        other => AppError::BadRequest(other.to_string()),
    })?;

    let whatsapp_url = message
        .whatsapp_url(shop_number)
        .map_err(|e| AppError::Internal(format!("invalid shop WhatsApp number: {e}")))?;

    tracing::info!(lines = cart.len(), total = %message.total(), "Checkout link generated");

    Ok(Json(CheckoutResponse {
        total: message.total(),
        message: message.text().to_owned(),
        whatsapp_url,
    }))
}
