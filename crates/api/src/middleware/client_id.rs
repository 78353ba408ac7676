//! Anonymous cart identity.
//!
//! The storefront generates a UUID once per browser and sends it on every
//! cart request as `X-Client-Id`.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

/// The HTTP header carrying the client id.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Extractor for the `X-Client-Id` header. Rejects with 400 when missing
/// or not a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientId(pub Uuid);

impl<S> FromRequestParts<S> for ClientId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(CLIENT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(Self)
            .ok_or_else(|| AppError::BadRequest("Missing or invalid X-Client-Id header".to_string()))
    }
}
