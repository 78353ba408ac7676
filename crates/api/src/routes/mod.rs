//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                     - Liveness with uptime and memory
//! GET    /health/ready               - Readiness (database reachable)
//!
//! # Products
//! GET    /api/products[?search=q]    - List / search products
//! GET    /api/products/search/{q}    - Search products (q >= 2 chars)
//! GET    /api/products/{category}    - Products in a category
//! POST   /api/products               - Create product (admin)
//! PUT    /api/products/{id}          - Update product (admin)
//! DELETE /api/products/{id}          - Delete product (admin)
//!
//! # Auth (rate limited)
//! POST   /api/auth/login             - Exchange credentials for a token
//! POST   /api/auth/register          - Create an account (admin)
//! GET    /api/auth/seed-admin        - Create the configured first admin
//! GET    /api/auth/verify            - Echo the token's user
//!
//! # Cart (X-Client-Id header required)
//! GET    /api/cart                   - Cart with line totals
//! POST   /api/cart                   - Add product (merges into existing line)
//! DELETE /api/cart                   - Clear cart
//! PUT    /api/cart/{itemId}          - Replace line quantity
//! DELETE /api/cart/{itemId}          - Remove line
//! POST   /api/cart/checkout          - Build WhatsApp order link
//! ```

pub mod auth;
pub mod cart;
pub mod health;
pub mod products;

use std::str::FromStr;

use axum::{
    Router,
    routing::{get, post, put},
};

use freshbasket_core::IdError;

use crate::error::AppError;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the product routes router.
///
/// `{key}` is a category for `GET` and a product id for `PUT`/`DELETE`.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/search/{query}", get(products::search))
        .route(
            "/{key}",
            get(products::by_category)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the auth routes router.
pub fn auth_routes(rate_limit: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/seed-admin", get(auth::seed_admin))
        .route("/verify", get(auth::verify));

    if rate_limit {
        router.layer(auth_rate_limiter())
    } else {
        router
    }
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add).delete(cart::clear))
        .route("/checkout", post(cart::checkout))
        .route("/{item_id}", put(cart::update).delete(cart::remove))
}

/// Create all routes for the API.
pub fn routes(rate_limit: bool) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/products", product_routes())
        .nest("/api/auth", auth_routes(rate_limit))
        .nest("/api/cart", cart_routes())
}

/// Parse an entity id from a path segment.
pub(crate) fn parse_id<T>(raw: &str) -> Result<T, AppError>
where
    T: FromStr<Err = IdError>,
{
    raw.parse().map_err(|e: IdError| AppError::BadRequest(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use freshbasket_core::{CartItemId, ProductId};

    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id::<ProductId>("42").ok(), Some(ProductId::new(42)));
        assert!(parse_id::<ProductId>("0").is_err());

        let err = parse_id::<CartItemId>("first").unwrap_err();
        assert_eq!(err.to_string(), "Bad request: Invalid cart item id");
    }
}
