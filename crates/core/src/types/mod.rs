//! Core types for Fresh Basket.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod unit;
pub mod username;

pub use id::*;
pub use price::{Price, PriceError, round_money};
pub use unit::{MAX_QUANTITY, Quantity, QuantityUnit, UnitError, UnitFamily, line_price};
pub use username::{Username, UsernameError};
