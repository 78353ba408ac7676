//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! fb-cli admin create -u owner
//! fb-cli admin create -u counter-staff -p 'long enough' --staff
//! fb-cli admin reset-password -u owner
//! ```

use rand::Rng;
use rand::distr::Alphanumeric;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use freshbasket_api::services::auth::{AuthError, AuthService};

use super::{ConnectError, connect};

/// Length of generated passwords.
const GENERATED_PASSWORD_LENGTH: usize = 20;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

fn generate_password() -> SecretString {
    let password: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect();
    SecretString::from(password)
}

/// Use the given password or generate one. The flag is true when generated.
fn password_or_generated(password: Option<String>) -> (SecretString, bool) {
    password.map_or_else(|| (generate_password(), true), |p| (SecretString::from(p), false))
}

#[allow(clippy::print_stdout)]
fn show_generated(username: &str, password: &SecretString) {
    println!("Generated password for {username}: {}", password.expose_secret());
    println!("It will not be shown again.");
}

/// Create an account.
pub async fn create_user(
    username: &str,
    password: Option<String>,
    is_admin: bool,
) -> Result<(), AdminError> {
    let pool = connect().await?;
    let (password, generated) = password_or_generated(password);

    let user = AuthService::new(&pool)
        .register(username, password.expose_secret(), is_admin)
        .await?;

    tracing::info!(
        "Account created! ID: {}, Username: {}, Admin: {}",
        user.id,
        user.username,
        user.is_admin
    );
    if generated {
        show_generated(user.username.as_str(), &password);
    }

    Ok(())
}

/// Set a new password for an existing account.
pub async fn reset_password(username: &str, password: Option<String>) -> Result<(), AdminError> {
    let pool = connect().await?;
    let (password, generated) = password_or_generated(password);

    AuthService::new(&pool)
        .reset_password(username, password.expose_secret())
        .await?;

    tracing::info!("Password updated for {}", username);
    if generated {
        show_generated(username, &password);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password_shape() {
        let password = generate_password();
        let text = password.expose_secret();
        assert_eq!(text.len(), GENERATED_PASSWORD_LENGTH);
        assert!(text.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_given_password_is_kept() {
        let (password, generated) = password_or_generated(Some("kept-as-is".to_string()));
        assert_eq!(password.expose_secret(), "kept-as-is");
        assert!(!generated);

        let (_, generated) = password_or_generated(None);
        assert!(generated);
    }
}
