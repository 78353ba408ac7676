//! Business logic services for the API.
//!
//! # Services
//!
//! - `auth` - Username/password accounts and bearer tokens
//! - `catalog` - Cached product listings
//! - `keep_alive` - Periodic self-ping for hosts that idle out

pub mod auth;
pub mod catalog;
pub mod keep_alive;
