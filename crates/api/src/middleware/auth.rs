//! Bearer token extractors.
//!
//! Handlers that need a signed-in user take [`RequireUser`]; admin-only
//! handlers take [`RequireAdmin`]. Both reject with a JSON error body.
//!
//! Both trust the signed claims and never touch the database. Demoting an
//! account or resetting its password with `fb-cli` does not end sessions
//! already issued: a token keeps the rights it was signed with until it
//! expires (`API_TOKEN_TTL_HOURS`). Rotate `API_TOKEN_SECRET` to revoke
//! every token at once.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::Serialize;

use freshbasket_core::UserId;

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::{AuthError, Claims};
use crate::state::AppState;

/// The user a valid token was issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            is_admin: claims.admin,
        }
    }
}

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

/// Extractor that requires a valid bearer token belonging to an admin.
///
/// Rejects with 401 when the token is missing or invalid and 403 when the
/// token was not issued to an admin. The admin flag is read from the token,
/// not the database.
pub struct RequireAdmin(pub CurrentUser);

/// The token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
        let claims = state.tokens().verify(token).map_err(AuthError::from)?;

        set_sentry_user(&claims.sub, &claims.username);

        Ok(Self(claims.into()))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;

        if !user.is_admin {
            tracing::warn!(user_id = %user.id, "Non-admin attempted admin action");
            return Err(AuthError::NotAdmin.into());
        }

        Ok(Self(user))
    }
}
