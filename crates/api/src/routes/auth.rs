//! Auth route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::user::PublicUser;
use crate::services::auth::{AuthError, AuthService, SeedOutcome};
use crate::state::AppState;

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Login response body.
#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Register request body.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

fn credentials(
    username: Option<String>,
    password: Option<String>,
) -> Result<(String, String)> {
    match (
        username.filter(|u| !u.trim().is_empty()),
        password.filter(|p| !p.is_empty()),
    ) {
        (Some(u), Some(p)) => Ok((u, p)),
        _ => Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        )),
    }
}

/// Exchange username and password for a bearer token.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(request) = payload?;
    let (username, password) = credentials(request.username, request.password)?;

    let user = match AuthService::new(state.pool()).login(&username, &password).await {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!(username = %username.trim(), "Failed login attempt");
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(e) => return Err(e.into()),
    };

    let token = state.tokens().issue(&user).map_err(AuthError::from)?;

    tracing::info!(user_id = %user.id, username = %user.username, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

/// Create an account. Admin only.
#[instrument(skip_all, fields(admin = %admin.username))]
pub async fn register(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let Json(request) = payload?;
    let (username, password) = credentials(request.username, request.password)?;

    let user = AuthService::new(state.pool())
        .register(&username, &password, request.is_admin)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": PublicUser::from(&user) })),
    ))
}

/// Create the configured first admin account if no admin exists yet.
#[instrument(skip_all)]
pub async fn seed_admin(State(state): State<AppState>) -> Result<(StatusCode, Json<Value>)> {
    let outcome = AuthService::new(state.pool())
        .seed_admin(&state.config().auth)
        .await?;

    Ok(match outcome {
        SeedOutcome::Created(user) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Admin created",
                "user": PublicUser::from(&user),
            })),
        ),
        SeedOutcome::AlreadyExists => (
            StatusCode::OK,
            Json(json!({ "message": "Admin already exists" })),
        ),
    })
}

/// Return the user the bearer token belongs to.
pub async fn verify(RequireUser(user): RequireUser) -> Json<Value> {
    Json(json!({ "valid": true, "user": user }))
}
