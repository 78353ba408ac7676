//! Domain models for the API.
//!
//! These types represent validated domain objects separate from database row
//! types. Row-to-model conversion lives in `crate::db`.

pub mod cart;
pub mod product;
pub mod user;

pub use cart::{CartItem, CartItemView, CartView};
pub use product::{NewProduct, Product, ProductChanges, ProductInput};
pub use user::{PublicUser, User};
