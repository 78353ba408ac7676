//! Signed bearer tokens.
//!
//! A token is `base64url(claims json) "." hex(hmac_sha256(secret, payload))`.
//! There is no revocation list: a token is valid until `exp`.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use freshbasket_core::UserId;

use crate::models::user::User;

type HmacSha256 = Hmac<Sha256>;

/// Errors from issuing or verifying a token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Not two dot-separated parts, or the parts don't decode.
    #[error("malformed token")]
    Malformed,
    /// Signature does not match the payload.
    #[error("bad signature")]
    BadSignature,
    /// `exp` is in the past.
    #[error("token expired")]
    Expired,
    /// The signing key or TTL could not be used.
    #[error("token signer misconfigured: {0}")]
    Signer(String),
}

/// Claims carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: UserId,
    pub username: String,
    pub admin: bool,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
}

/// Issues and verifies tokens with a shared HMAC key.
pub struct TokenSigner {
    secret: SecretString,
    ttl: Duration,
}

impl TokenSigner {
    /// Create a signer.
    #[must_use]
    pub const fn new(secret: SecretString, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    /// Issue a token for `user`, valid from now for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signer` if the key or TTL is unusable.
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.issue_at(user.id, user.username.as_str(), user.is_admin, Utc::now())
    }

    /// Issue a token as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signer` if the key or TTL is unusable.
    pub fn issue_at(
        &self,
        user_id: UserId,
        username: &str,
        admin: bool,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let ttl =
            chrono::Duration::from_std(self.ttl).map_err(|e| TokenError::Signer(e.to_string()))?;
        let claims = Claims {
            sub: user_id,
            username: username.to_owned(),
            admin,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        let json = serde_json::to_vec(&claims).map_err(|e| TokenError::Signer(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = hex::encode(self.mac(&payload)?.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// Verify a token against the current time.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the token is malformed, forged or expired.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the token is malformed, forged or expired.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let (payload, signature) = token.trim().split_once('.').ok_or(TokenError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| TokenError::Malformed)?;

        // Constant-time comparison
        self.mac(payload)?
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256, TokenError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| TokenError::Signer(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }
}
