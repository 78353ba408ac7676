//! HTTP middleware stack and extractors for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. CORS (configured origins only, answers preflights)
//! 4. Request ID (add unique ID to each request)
//! 5. Rate limiting on auth routes (governor)

pub mod auth;
pub mod client_id;
pub mod rate_limit;
pub mod request_id;

pub use auth::{CurrentUser, RequireAdmin, RequireUser};
pub use client_id::ClientId;
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
