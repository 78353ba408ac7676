//! Fresh Basket Core - Shared domain types.
//!
//! This crate provides the types used across all Fresh Basket components:
//! - `api` - REST backend for the storefront and the admin screens
//! - `cli` - Command-line tools for migrations, admin users and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. The browser cart and the server-side cart both run
//! through the same arithmetic here, so a quantity picked in grams prices the
//! same everywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, usernames, prices and quantity units
//! - [`cart`] - Cart lines, merging rules and totals
//! - [`order`] - Customer details and the WhatsApp order message

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod order;
pub mod types;

pub use cart::{Cart, CartError, CartLine};
pub use order::{CustomerDetails, OrderError, OrderMessage};
pub use types::*;
