//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid username format.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] freshbasket_core::UsernameError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// No bearer token on a protected request.
    #[error("missing bearer token")]
    MissingToken,

    /// Bearer token is malformed, forged or expired.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] super::token::TokenError),

    /// Token is valid but does not belong to an admin.
    #[error("admin access required")]
    NotAdmin,

    /// Seed admin credentials are not configured.
    #[error("admin seeding is not configured")]
    SeedingDisabled,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
