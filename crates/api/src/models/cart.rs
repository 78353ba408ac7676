//! Server-side cart types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use freshbasket_core::{Cart, CartError, CartItemId, CartLine, Quantity, UnitError, round_money};

use super::product::Product;

/// A stored cart row (domain type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub id: CartItemId,
    /// Anonymous browser identity from the `X-Client-Id` header.
    pub client_id: Uuid,
    pub product: Product,
    pub quantity: Quantity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    /// The core cart line for this row, priced from the product.
    #[must_use]
    pub fn to_line(&self) -> CartLine {
        CartLine {
            product_id: self.product.id,
            name: self.product.name.clone(),
            unit_price: self.product.price,
            priced_unit: self.product.quantity_unit,
            quantity: self.quantity,
        }
    }

    /// Price this row for the client.
    ///
    /// # Errors
    ///
    /// Returns `UnitError` if the quantity no longer fits the product's unit.
    pub fn into_view(self) -> Result<CartItemView, UnitError> {
        let line_total = self.to_line().total()?;
        Ok(CartItemView {
            id: self.id,
            product: self.product,
            quantity: self.quantity,
            line_total,
        })
    }
}

/// One line of the cart as returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub id: CartItemId,
    pub product: Product,
    pub quantity: Quantity,
    pub line_total: Decimal,
}

/// The whole cart as returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: Decimal,
}

impl CartView {
    /// Price every row and sum the total.
    ///
    /// # Errors
    ///
    /// Returns `UnitError` if a stored quantity no longer fits its product's
    /// unit, or the total overflows.
    pub fn build(items: Vec<CartItem>) -> Result<Self, UnitError> {
        let mut total = Decimal::ZERO;
        let mut views = Vec::with_capacity(items.len());

        for item in items {
            let view = item.into_view()?;
            total = total
                .checked_add(view.line_total)
                .ok_or(UnitError::Overflow)?;
            views.push(view);
        }

        Ok(Self {
            items: views,
            total: round_money(total),
        })
    }
}

/// Collect stored rows into a core [`Cart`] for checkout.
///
/// # Errors
///
/// Returns `CartError` if a row's quantity does not fit its product.
pub fn to_cart(items: &[CartItem]) -> Result<Cart, CartError> {
    let mut cart = Cart::new();
    for item in items {
        cart.add(item.to_line())?;
    }
    Ok(cart)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use freshbasket_core::{Price, ProductId, QuantityUnit};

    use super::*;

    fn item(id: i32, price: &str, priced: QuantityUnit, qty: Quantity) -> CartItem {
        let now = Utc::now();
        CartItem {
            id: CartItemId::new(id),
            client_id: Uuid::nil(),
            product: Product {
                id: ProductId::new(id),
                name: format!("product {id}"),
                category: "Vegetables".to_string(),
                price: Price::parse(price).unwrap(),
                quantity_unit: priced,
                description: String::new(),
                image: None,
                created_at: now,
                updated_at: now,
            },
            quantity: qty,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_view_totals_mixed_units() {
        let grams = Quantity::new(Decimal::new(250, 0), QuantityUnit::Gram).unwrap();
        let pieces = Quantity::new(Decimal::new(6, 0), QuantityUnit::Piece).unwrap();
        let view = CartView::build(vec![
            item(1, "80", QuantityUnit::Kilogram, grams),
            item(2, "60", QuantityUnit::Dozen, pieces),
        ])
        .unwrap();

        assert_eq!(view.items.len(), 2);
        assert_eq!(view.items[0].line_total, Decimal::new(20, 0));
        assert_eq!(view.items[1].line_total, Decimal::new(30, 0));
        assert_eq!(view.total, Decimal::new(50, 0));
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let kg = Quantity::one(QuantityUnit::Kilogram);
        let view = CartView::build(vec![item(1, "40", QuantityUnit::Kilogram, kg)]).unwrap();
        let json = serde_json::to_value(&view).unwrap();

        let line_total: Decimal = json["items"][0]["lineTotal"].as_str().unwrap().parse().unwrap();
        assert_eq!(line_total, Decimal::new(40, 0));
        assert_eq!(json["items"][0]["product"]["quantityUnit"], "kg");
        assert!(json["total"].is_string());
    }

    #[test]
    fn test_to_cart() {
        let kg = Quantity::one(QuantityUnit::Kilogram);
        let cart = to_cart(&[item(3, "40", QuantityUnit::Kilogram, kg)]).unwrap();
        assert_eq!(cart.len(), 1);
        assert!(cart.line(ProductId::new(3)).is_some());
    }
}
