//! Order hand-off over WhatsApp.
//!
//! Orders are not stored anywhere: the cart and the customer's details are
//! rendered into a plain-text message and sent to the shop's WhatsApp number
//! through a `wa.me` deep link.

use std::fmt::Write as _;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::types::UnitError;

const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

/// Errors from building an order message.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// A required customer field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Phone number is not 7-15 digits.
    #[error("phone number must have between 7 and 15 digits")]
    InvalidPhone,

    /// A cart line could not be priced.
    #[error(transparent)]
    Unit(#[from] UnitError),
}

/// Delivery details the customer fills in at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CustomerDetails {
    /// Check required fields and the phone number shape.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::MissingField` for a blank name or address and
    /// `OrderError::InvalidPhone` if the phone does not have 7-15 digits.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.name.trim().is_empty() {
            return Err(OrderError::MissingField("name"));
        }
        if self.address.trim().is_empty() {
            return Err(OrderError::MissingField("address"));
        }
        normalize_phone(&self.phone).ok_or(OrderError::InvalidPhone)?;
        Ok(())
    }
}

/// Strip spaces, dashes, parentheses and a leading `+`; `None` unless the
/// result is 7-15 ASCII digits.
#[must_use]
pub fn normalize_phone(phone: &str) -> Option<String> {
    let digits: String = phone
        .trim()
        .trim_start_matches('+')
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    let valid = (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit());
    valid.then_some(digits)
}

/// A rendered order ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderMessage {
    text: String,
    total: Decimal,
}

impl OrderMessage {
    /// Render the order text for a cart and customer.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyCart` for an empty cart, a validation error
    /// from [`CustomerDetails::validate`], or `OrderError::Unit` if a line
    /// cannot be priced.
    pub fn new(cart: &Cart, details: &CustomerDetails) -> Result<Self, OrderError> {
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        details.validate()?;

        let mut text = String::from("New order\n\n");
        for (n, line) in cart.lines().iter().enumerate() {
            // Writing to a String cannot fail
            let _ = writeln!(
                text,
                "{}. {} - {} = Rs. {:.2}",
                n + 1,
                line.name,
                line.quantity,
                line.total()?
            );
        }

        let total = cart.total()?;
        let _ = writeln!(text, "\nTotal: Rs. {total:.2}");
        let _ = writeln!(text, "\nName: {}", details.name.trim());
        let _ = writeln!(text, "Phone: {}", details.phone.trim());
        let _ = write!(text, "Address: {}", details.address.trim());
        if let Some(note) = details.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            let _ = write!(text, "\nNote: {note}");
        }

        Ok(Self { text, total })
    }

    /// The message body.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The order total.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// `wa.me` link that opens a chat with `shop_number` pre-filled with the order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidPhone` if the shop number is malformed.
    pub fn whatsapp_url(&self, shop_number: &str) -> Result<String, OrderError> {
        let number = normalize_phone(shop_number).ok_or(OrderError::InvalidPhone)?;
        Ok(format!(
            "https://wa.me/{number}?text={}",
            urlencoding::encode(&self.text)
        ))
    }
}
