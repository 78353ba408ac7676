//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `API_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `API_TOKEN_SECRET` - Bearer token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `API_PORT` - Listen port (default: 5000)
//! - `API_TOKEN_TTL_HOURS` - Token lifetime (default: 24)
//! - `API_CORS_ORIGINS` - Comma-separated allowed origins (default: `http://localhost:3000`)
//! - `API_RATE_LIMIT` - Rate limit auth endpoints (default: true)
//! - `SEED_ADMIN_USERNAME` / `SEED_ADMIN_PASSWORD` - Credentials for `GET /api/auth/seed-admin`
//! - `WHATSAPP_NUMBER` - Shop number orders are sent to
//! - `KEEP_ALIVE_URL` - URL to ping periodically (disabled when unset)
//! - `KEEP_ALIVE_INTERVAL_SECS` - Ping interval (default: 840)
//! - `KEEP_ALIVE_TIMEOUT_SECS` - Ping request timeout (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Bearer token signing settings
    pub auth: AuthConfig,
    /// Origins allowed to call the API from a browser
    pub cors_origins: Vec<String>,
    /// Whether auth endpoints are rate limited
    pub rate_limit: bool,
    /// WhatsApp number orders are sent to
    pub whatsapp_number: Option<String>,
    /// Keep-alive pinger settings (`None` disables it)
    pub keep_alive: Option<KeepAliveConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Token signing and admin seeding configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC key for bearer tokens
    pub token_secret: SecretString,
    /// How long an issued token stays valid
    pub token_ttl: Duration,
    /// Username for the seeded admin
    pub seed_admin_username: Option<String>,
    /// Password for the seeded admin
    pub seed_admin_password: Option<SecretString>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("seed_admin_username", &self.seed_admin_username)
            .field(
                "seed_admin_password",
                &self.seed_admin_password.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Keep-alive pinger configuration.
#[derive(Debug, Clone)]
pub struct KeepAliveConfig {
    /// URL requested on every tick
    pub url: Url,
    /// Time between pings
    pub interval: Duration,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("API_DATABASE_URL")?;
        let host = parse_env_or_default::<IpAddr>("API_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("API_PORT", "5000")?;
        let auth = AuthConfig::from_env()?;
        let cors_origins = parse_origins(&get_env_or_default(
            "API_CORS_ORIGINS",
            "http://localhost:3000",
        ))?;
        let rate_limit = parse_env_or_default::<bool>("API_RATE_LIMIT", "true")?;
        let whatsapp_number = get_optional_env("WHATSAPP_NUMBER");
        if let Some(number) = &whatsapp_number
            && freshbasket_core::order::normalize_phone(number).is_none()
        {
            return Err(ConfigError::InvalidEnvVar(
                "WHATSAPP_NUMBER".to_string(),
                "must have between 7 and 15 digits".to_string(),
            ));
        }
        let keep_alive = KeepAliveConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            auth,
            cors_origins,
            rate_limit,
            whatsapp_number,
            keep_alive,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let token_secret = get_validated_secret("API_TOKEN_SECRET")?;
        validate_secret_length(&token_secret, "API_TOKEN_SECRET")?;
        let ttl_hours = parse_env_or_default::<u64>("API_TOKEN_TTL_HOURS", "24")?;
        if ttl_hours == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "API_TOKEN_TTL_HOURS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let seed_admin_username = get_optional_env("SEED_ADMIN_USERNAME");
        let seed_admin_password = get_optional_env("SEED_ADMIN_PASSWORD").map(SecretString::from);
        if seed_admin_username.is_some() != seed_admin_password.is_some() {
            return Err(ConfigError::InvalidEnvVar(
                "SEED_ADMIN_USERNAME".to_string(),
                "SEED_ADMIN_USERNAME and SEED_ADMIN_PASSWORD must be set together".to_string(),
            ));
        }

        Ok(Self {
            token_secret,
            token_ttl: Duration::from_secs(ttl_hours * 3600),
            seed_admin_username,
            seed_admin_password,
        })
    }
}

impl KeepAliveConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(raw_url) = get_optional_env("KEEP_ALIVE_URL") else {
            return Ok(None);
        };
        let url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("KEEP_ALIVE_URL".to_string(), e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "KEEP_ALIVE_URL".to_string(),
                "must be an http(s) URL".to_string(),
            ));
        }

        let interval = parse_env_or_default::<u64>("KEEP_ALIVE_INTERVAL_SECS", "840")?;
        let timeout = parse_env_or_default::<u64>("KEEP_ALIVE_TIMEOUT_SECS", "10")?;
        if interval == 0 || timeout == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "KEEP_ALIVE_INTERVAL_SECS".to_string(),
                "interval and timeout must be positive".to_string(),
            ));
        }

        Ok(Some(Self {
            url,
            interval: Duration::from_secs(interval),
            timeout: Duration::from_secs(timeout),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Split a comma-separated origin list, validating each entry as a URL.
fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|origin| {
            Url::parse(origin)
                .map(|_| origin.trim_end_matches('/').to_string())
                .map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "API_CORS_ORIGINS".to_string(),
                        format!("{origin}: {e}"),
                    )
                })
        })
        .collect()
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-token-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength(&"a".repeat(40), "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "TEST").is_err());
        assert!(validate_secret_length(&SecretString::from("a".repeat(32)), "TEST").is_ok());
    }

    #[test]
    fn test_parse_origins() {
        let origins = parse_origins("http://localhost:3000/, https://shop.example.in").unwrap();
        assert_eq!(
            origins,
            vec!["http://localhost:3000", "https://shop.example.in"]
        );
        assert!(parse_origins("not a url").is_err());
        assert!(parse_origins("").unwrap().is_empty());
    }

    #[test]
    fn test_socket_addr() {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 5000,
            auth: AuthConfig {
                token_secret: SecretString::from("x".repeat(32)),
                token_ttl: Duration::from_secs(3600),
                seed_admin_username: None,
                seed_admin_password: None,
            },
            cors_origins: Vec::new(),
            rate_limit: false,
            whatsapp_number: None,
            keep_alive: None,
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn test_auth_config_debug_redacts_secrets() {
        let config = AuthConfig {
            token_secret: SecretString::from("super_secret_signing_key"),
            token_ttl: Duration::from_secs(3600),
            seed_admin_username: Some("owner".to_string()),
            seed_admin_password: Some(SecretString::from("hunter2hunter2")),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("owner"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_signing_key"));
        assert!(!debug_output.contains("hunter2hunter2"));
    }
}
