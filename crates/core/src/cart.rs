//! Shopping cart lines and totals.
//!
//! The cart holds a snapshot of each product's name and price at the time it
//! was added. Adding a product that is already in the cart increases the
//! existing line instead of creating a second one, converting the incoming
//! quantity into the unit the line already uses.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId, Quantity, QuantityUnit, UnitError, line_price};

/// Errors from cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The product has no line in the cart.
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),

    /// The quantity does not fit the product's unit.
    #[error(transparent)]
    Unit(#[from] UnitError),
}

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    /// Price per `priced_unit`.
    pub unit_price: Price,
    pub priced_unit: QuantityUnit,
    pub quantity: Quantity,
}

impl CartLine {
    /// Price of this line.
    ///
    /// # Errors
    ///
    /// Returns `UnitError::Incompatible` if the quantity's unit does not
    /// belong to the priced unit's family.
    pub fn total(&self) -> Result<Decimal, UnitError> {
        line_price(self.unit_price, self.priced_unit, &self.quantity)
    }
}

/// A list of cart lines, at most one per product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// The cart lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Add a line, merging into an existing line for the same product.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Unit` if the quantity cannot be expressed in the
    /// product's unit. The cart is left unchanged on error.
    pub fn add(&mut self, line: CartLine) -> Result<(), CartError> {
        if !line.quantity.unit().is_compatible(line.priced_unit) {
            return Err(UnitError::Incompatible {
                from: line.quantity.unit(),
                to: line.priced_unit,
            }
            .into());
        }

        match self
            .lines
            .iter_mut()
            .find(|l| l.product_id == line.product_id)
        {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(&line.quantity)?;
                // Refresh the snapshot with the latest catalog data
                existing.name = line.name;
                existing.unit_price = line.unit_price;
            }
            None => self.lines.push(line),
        }

        Ok(())
    }

    /// Replace the quantity of a product's line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotInCart` if the product has no line, or
    /// `CartError::Unit` if the unit does not fit the product.
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), CartError> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or(CartError::NotInCart(product_id))?;

        if !quantity.unit().is_compatible(line.priced_unit) {
            return Err(UnitError::Incompatible {
                from: quantity.unit(),
                to: line.priced_unit,
            }
            .into());
        }
        line.quantity = quantity;
        Ok(())
    }

    /// Remove a product's line, returning it.
    pub fn remove(&mut self, product_id: ProductId) -> Option<CartLine> {
        let index = self.lines.iter().position(|l| l.product_id == product_id)?;
        Some(self.lines.remove(index))
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of all line totals.
    ///
    /// # Errors
    ///
    /// Returns `UnitError::Incompatible` if any line carries a quantity in a
    /// unit foreign to its product (only possible for carts deserialized from
    /// tampered storage), or `UnitError::Overflow` if the sum does not fit.
    pub fn total(&self) -> Result<Decimal, UnitError> {
        self.lines
            .iter()
            .try_fold(Decimal::ZERO, |acc, line| {
                acc.checked_add(line.total()?).ok_or(UnitError::Overflow)
            })
    }
}
