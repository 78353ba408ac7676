//! Product domain types and request validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use freshbasket_core::{Price, PriceError, ProductId, QuantityUnit, UnitError};

/// A catalog item (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    /// Price per `quantity_unit`, serialized as a string.
    pub price: Price,
    pub quantity_unit: QuantityUnit,
    pub description: String,
    /// Image URL.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Why a product payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductValidationError {
    /// Required fields absent or blank.
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// A provided field is blank.
    #[error("{0} cannot be blank")]
    Blank(&'static str),

    /// Price is neither a string nor a number.
    #[error("price must be a number or a numeric string")]
    PriceType,

    /// Price text did not parse.
    #[error("invalid price: {0}")]
    Price(#[from] PriceError),

    /// Unit text did not parse.
    #[error("invalid quantityUnit: {0}")]
    Unit(#[from] UnitError),

    /// Update request carried no fields.
    #[error("No fields to update")]
    NoChanges,
}

/// Raw product payload from the admin form.
///
/// Every field is optional here so that a missing field produces a 400 with a
/// useful message instead of a deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Value>,
    pub quantity_unit: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "imageUrl")]
    pub image: Option<String>,
}

/// A validated product ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price: Price,
    pub quantity_unit: QuantityUnit,
    pub description: String,
    pub image: Option<String>,
}

/// A validated partial update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Price>,
    pub quantity_unit: Option<QuantityUnit>,
    pub description: Option<String>,
    /// `Some(None)` clears the image.
    pub image: Option<Option<String>>,
}

impl ProductChanges {
    /// Whether the update touches nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl ProductInput {
    /// Validate a create request.
    ///
    /// # Errors
    ///
    /// Returns `ProductValidationError::MissingFields` listing every absent
    /// required field, or a parse error for price / unit.
    pub fn into_new(self) -> Result<NewProduct, ProductValidationError> {
        let name = non_blank(self.name);
        let category = non_blank(self.category);
        let price = self.price.filter(|v| !is_blank_value(v));
        let quantity_unit = non_blank(self.quantity_unit);

        let mut missing = Vec::new();
        if name.is_none() {
            missing.push("name");
        }
        if category.is_none() {
            missing.push("category");
        }
        if price.is_none() {
            missing.push("price");
        }
        if quantity_unit.is_none() {
            missing.push("quantityUnit");
        }

        let (Some(name), Some(category), Some(price), Some(quantity_unit)) =
            (name, category, price, quantity_unit)
        else {
            return Err(ProductValidationError::MissingFields(missing));
        };

        Ok(NewProduct {
            name,
            category,
            price: parse_price(&price)?,
            quantity_unit: QuantityUnit::parse(&quantity_unit)?,
            description: self.description.map(|d| d.trim().to_owned()).unwrap_or_default(),
            image: non_blank(self.image),
        })
    }

    /// Validate an update request.
    ///
    /// # Errors
    ///
    /// Returns `ProductValidationError::NoChanges` for an empty payload,
    /// `Blank` when a required field is sent empty, or a parse error.
    pub fn into_changes(self) -> Result<ProductChanges, ProductValidationError> {
        let changes = ProductChanges {
            name: required_if_present(self.name, "name")?,
            category: required_if_present(self.category, "category")?,
            price: self
                .price
                .map(|v| {
                    if is_blank_value(&v) {
                        Err(ProductValidationError::Blank("price"))
                    } else {
                        parse_price(&v)
                    }
                })
                .transpose()?,
            quantity_unit: required_if_present(self.quantity_unit, "quantityUnit")?
                .map(|u| QuantityUnit::parse(&u))
                .transpose()?,
            description: self.description.map(|d| d.trim().to_owned()),
            image: self.image.map(|i| non_blank(Some(i))),
        };

        if changes.is_empty() {
            return Err(ProductValidationError::NoChanges);
        }
        Ok(changes)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn required_if_present(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<String>, ProductValidationError> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Err(ProductValidationError::Blank(field)),
        Some(v) => Ok(Some(v.trim().to_owned())),
    }
}

fn is_blank_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn parse_price(value: &Value) -> Result<Price, ProductValidationError> {
    match value {
        Value::String(s) => Ok(Price::parse(s)?),
        Value::Number(n) => Ok(Price::parse(&n.to_string())?),
        _ => Err(ProductValidationError::PriceType),
    }
}
