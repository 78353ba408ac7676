//! Quantity units and conversion arithmetic.
//!
//! Products are priced per unit ("₹120 per kg", "₹60 per dozen") while a
//! customer may pick a quantity in a smaller unit of the same family
//! ("500 g", "6 pieces"). Every unit belongs to a [`UnitFamily`] with a base
//! unit, and conversions go through the base.
//!
//! ```
//! use freshbasket_core::{Price, Quantity, QuantityUnit, line_price};
//! use rust_decimal::Decimal;
//!
//! let per_kg = Price::parse("120").unwrap();
//! let half_kilo = Quantity::new(Decimal::new(500, 0), QuantityUnit::Gram).unwrap();
//!
//! assert_eq!(
//!     line_price(per_kg, QuantityUnit::Kilogram, &half_kilo).unwrap(),
//!     Decimal::new(60, 0)
//! );
//! ```

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::price::{Price, round_money};

/// Errors from unit parsing and conversion.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    /// The unit text is not recognized.
    #[error("unknown quantity unit '{0}'")]
    Unknown(String),
    /// The units belong to different families (e.g. kg and dozen).
    #[error("cannot convert {from} to {to}")]
    Incompatible {
        /// Source unit.
        from: QuantityUnit,
        /// Target unit.
        to: QuantityUnit,
    },
    /// Quantities must be strictly positive.
    #[error("quantity must be greater than zero")]
    NonPositive,
    /// The amount exceeds [`MAX_QUANTITY`] in its unit.
    #[error("quantity must be at most {}", MAX_QUANTITY)]
    TooLarge,
    /// The arithmetic does not fit in a decimal.
    #[error("amount is too large to calculate")]
    Overflow,
}

/// Largest amount a single quantity may hold, in whatever unit it uses.
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// Physical dimension a unit measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitFamily {
    /// Base unit: gram.
    Mass,
    /// Base unit: millilitre.
    Volume,
    /// Base unit: piece.
    Count,
    /// Sealed packs; never converted.
    Pack,
}

/// Unit a product is priced in, or a quantity is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum QuantityUnit {
    Kilogram,
    Gram,
    Litre,
    Millilitre,
    Dozen,
    Piece,
    Pack,
}

impl QuantityUnit {
    /// Every unit, in display order.
    pub const ALL: [Self; 7] = [
        Self::Kilogram,
        Self::Gram,
        Self::Litre,
        Self::Millilitre,
        Self::Dozen,
        Self::Piece,
        Self::Pack,
    ];

    /// Parse a unit from free text (case-insensitive, common abbreviations).
    ///
    /// # Errors
    ///
    /// Returns `UnitError::Unknown` if the text is not a known unit.
    pub fn parse(s: &str) -> Result<Self, UnitError> {
        let normalized = s.trim().to_lowercase();
        let unit = match normalized.trim_start_matches("per ").trim() {
            "kg" | "kgs" | "kilo" | "kilogram" | "kilograms" => Self::Kilogram,
            "g" | "gm" | "gms" | "gram" | "grams" => Self::Gram,
            "l" | "ltr" | "litre" | "litres" | "liter" | "liters" => Self::Litre,
            "ml" | "millilitre" | "milliliter" => Self::Millilitre,
            "dozen" | "dz" | "doz" => Self::Dozen,
            "piece" | "pieces" | "pc" | "pcs" | "unit" | "units" => Self::Piece,
            "pack" | "packs" | "packet" | "packets" | "box" => Self::Pack,
            _ => return Err(UnitError::Unknown(s.trim().to_owned())),
        };
        Ok(unit)
    }

    /// Canonical short name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kilogram => "kg",
            Self::Gram => "g",
            Self::Litre => "l",
            Self::Millilitre => "ml",
            Self::Dozen => "dozen",
            Self::Piece => "piece",
            Self::Pack => "pack",
        }
    }

    /// The family this unit measures.
    #[must_use]
    pub const fn family(self) -> UnitFamily {
        match self {
            Self::Kilogram | Self::Gram => UnitFamily::Mass,
            Self::Litre | Self::Millilitre => UnitFamily::Volume,
            Self::Dozen | Self::Piece => UnitFamily::Count,
            Self::Pack => UnitFamily::Pack,
        }
    }

    /// How many base units one of this unit is.
    fn base_factor(self) -> Decimal {
        match self {
            Self::Kilogram | Self::Litre => Decimal::ONE_THOUSAND,
            Self::Dozen => Decimal::new(12, 0),
            Self::Gram | Self::Millilitre | Self::Piece | Self::Pack => Decimal::ONE,
        }
    }

    /// Whether quantities can be converted between the two units.
    #[must_use]
    pub fn is_compatible(self, other: Self) -> bool {
        self.family() == other.family()
    }

    /// Units a customer may choose for a product priced in `self`.
    #[must_use]
    pub fn selectable(self) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|unit| unit.is_compatible(self))
            .collect()
    }

    /// Increment used by the +/- quantity controls.
    #[must_use]
    pub fn default_step(self) -> Decimal {
        match self {
            Self::Kilogram => Decimal::new(25, 2),
            Self::Gram | Self::Millilitre => Decimal::new(250, 0),
            Self::Litre | Self::Dozen => Decimal::new(5, 1),
            Self::Piece | Self::Pack => Decimal::ONE,
        }
    }
}

impl fmt::Display for QuantityUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuantityUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for QuantityUnit {
    type Error = UnitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<QuantityUnit> for String {
    fn from(unit: QuantityUnit) -> Self {
        unit.as_str().to_owned()
    }
}

/// A strictly positive amount of some unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuantity")]
pub struct Quantity {
    amount: Decimal,
    unit: QuantityUnit,
}

#[derive(Deserialize)]
struct RawQuantity {
    amount: Decimal,
    unit: QuantityUnit,
}

impl TryFrom<RawQuantity> for Quantity {
    type Error = UnitError;

    fn try_from(raw: RawQuantity) -> Result<Self, Self::Error> {
        Self::new(raw.amount, raw.unit)
    }
}

impl Quantity {
    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns `UnitError::NonPositive` if `amount <= 0` and
    /// `UnitError::TooLarge` if it exceeds [`MAX_QUANTITY`].
    pub fn new(amount: Decimal, unit: QuantityUnit) -> Result<Self, UnitError> {
        if amount <= Decimal::ZERO {
            return Err(UnitError::NonPositive);
        }
        if amount > MAX_QUANTITY {
            return Err(UnitError::TooLarge);
        }
        Ok(Self {
            amount: amount.normalize(),
            unit,
        })
    }

    /// One of `unit`.
    #[must_use]
    pub const fn one(unit: QuantityUnit) -> Self {
        Self {
            amount: Decimal::ONE,
            unit,
        }
    }

    /// The numeric amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// The unit the amount is expressed in.
    #[must_use]
    pub const fn unit(&self) -> QuantityUnit {
        self.unit
    }

    /// Express the same quantity in another unit of the same family.
    ///
    /// # Errors
    ///
    /// Returns `UnitError::Incompatible` across families, and
    /// `UnitError::TooLarge` when the converted amount exceeds the cap.
    pub fn convert_to(&self, unit: QuantityUnit) -> Result<Self, UnitError> {
        if self.unit == unit {
            return Ok(*self);
        }
        if !self.unit.is_compatible(unit) {
            return Err(UnitError::Incompatible {
                from: self.unit,
                to: unit,
            });
        }
        let amount = self
            .amount
            .checked_mul(self.unit.base_factor())
            .and_then(|base| base.checked_div(unit.base_factor()))
            .ok_or(UnitError::Overflow)?;
        Self::new(amount, unit)
    }

    /// Add `other` to this quantity, keeping this quantity's unit.
    ///
    /// # Errors
    ///
    /// Returns `UnitError::Incompatible` across families and
    /// `UnitError::TooLarge` when the sum exceeds [`MAX_QUANTITY`].
    pub fn checked_add(&self, other: &Self) -> Result<Self, UnitError> {
        let other = other.convert_to(self.unit)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(UnitError::Overflow)?;
        Self::new(amount, self.unit)
    }

    /// Increase by one [`QuantityUnit::default_step`], staying put at the cap.
    #[must_use]
    pub fn step_up(&self) -> Self {
        self.amount
            .checked_add(self.unit.default_step())
            .and_then(|amount| Self::new(amount, self.unit).ok())
            .unwrap_or(*self)
    }

    /// Decrease by one step; `None` when that would reach zero.
    #[must_use]
    pub fn step_down(&self) -> Option<Self> {
        Self::new(self.amount - self.unit.default_step(), self.unit).ok()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.unit)
    }
}

/// Price of `quantity` for a product costing `unit_price` per `priced_unit`.
///
/// Rounded to two decimal places.
///
/// # Errors
///
/// Returns `UnitError::Incompatible` if the quantity cannot be expressed in
/// the priced unit, and `UnitError::Overflow` if the price does not fit in a
/// decimal.
pub fn line_price(
    unit_price: Price,
    priced_unit: QuantityUnit,
    quantity: &Quantity,
) -> Result<Decimal, UnitError> {
    if !quantity.unit.is_compatible(priced_unit) {
        return Err(UnitError::Incompatible {
            from: quantity.unit,
            to: priced_unit,
        });
    }
    // Multiply before dividing so 5 pieces of a per-dozen price stay exact.
    let raw = unit_price
        .amount()
        .checked_mul(quantity.amount)
        .and_then(|v| v.checked_mul(quantity.unit.base_factor()))
        .and_then(|v| v.checked_div(priced_unit.base_factor()))
        .ok_or(UnitError::Overflow)?;
    Ok(round_money(raw))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn qty(amount: i64, scale: u32, unit: QuantityUnit) -> Quantity {
        Quantity::new(Decimal::new(amount, scale), unit).unwrap()
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(QuantityUnit::parse("KG").unwrap(), QuantityUnit::Kilogram);
        assert_eq!(QuantityUnit::parse(" gms ").unwrap(), QuantityUnit::Gram);
        assert_eq!(QuantityUnit::parse("per kg").unwrap(), QuantityUnit::Kilogram);
        assert_eq!(QuantityUnit::parse("Liter").unwrap(), QuantityUnit::Litre);
        assert_eq!(QuantityUnit::parse("pcs").unwrap(), QuantityUnit::Piece);
        assert_eq!(QuantityUnit::parse("Dozen").unwrap(), QuantityUnit::Dozen);
        assert_eq!(QuantityUnit::parse("packet").unwrap(), QuantityUnit::Pack);
        assert!(matches!(
            QuantityUnit::parse("bushel"),
            Err(UnitError::Unknown(_))
        ));
    }

    #[test]
    fn test_unit_serde_uses_short_names() {
        assert_eq!(
            serde_json::to_string(&QuantityUnit::Millilitre).unwrap(),
            "\"ml\""
        );
        let unit: QuantityUnit = serde_json::from_str("\"Kilogram\"").unwrap();
        assert_eq!(unit, QuantityUnit::Kilogram);
    }

    #[test]
    fn test_kg_to_g_and_back() {
        let kilo = qty(15, 1, QuantityUnit::Kilogram);
        let grams = kilo.convert_to(QuantityUnit::Gram).unwrap();
        assert_eq!(grams.amount(), Decimal::new(1500, 0));
        assert_eq!(
            grams.convert_to(QuantityUnit::Kilogram).unwrap().amount(),
            Decimal::new(15, 1)
        );
    }

    #[test]
    fn test_dozen_to_pieces() {
        let half_dozen = qty(5, 1, QuantityUnit::Dozen);
        assert_eq!(
            half_dozen.convert_to(QuantityUnit::Piece).unwrap().amount(),
            Decimal::new(6, 0)
        );
    }

    #[test]
    fn test_incompatible_conversion() {
        let kilo = qty(1, 0, QuantityUnit::Kilogram);
        assert_eq!(
            kilo.convert_to(QuantityUnit::Dozen),
            Err(UnitError::Incompatible {
                from: QuantityUnit::Kilogram,
                to: QuantityUnit::Dozen,
            })
        );
    }

    #[test]
    fn test_quantity_must_be_positive() {
        assert_eq!(
            Quantity::new(Decimal::ZERO, QuantityUnit::Piece),
            Err(UnitError::NonPositive)
        );
        assert!(serde_json::from_str::<Quantity>(r#"{"amount":"-1","unit":"kg"}"#).is_err());
    }

    #[test]
    fn test_checked_add_keeps_left_unit() {
        let kilo = qty(1, 0, QuantityUnit::Kilogram);
        let grams = qty(250, 0, QuantityUnit::Gram);
        let sum = kilo.checked_add(&grams).unwrap();
        assert_eq!(sum.unit(), QuantityUnit::Kilogram);
        assert_eq!(sum.amount(), Decimal::new(125, 2));
    }

    #[test]
    fn test_line_price_grams_of_per_kg_product() {
        let price = Price::parse("120").unwrap();
        let total = line_price(price, QuantityUnit::Kilogram, &qty(500, 0, QuantityUnit::Gram));
        assert_eq!(total.unwrap(), Decimal::new(60, 0));
    }

    #[test]
    fn test_line_price_pieces_of_per_dozen_product() {
        let price = Price::parse("60").unwrap();
        let six = line_price(price, QuantityUnit::Dozen, &qty(6, 0, QuantityUnit::Piece));
        assert_eq!(six.unwrap(), Decimal::new(30, 0));

        let five = line_price(price, QuantityUnit::Dozen, &qty(5, 0, QuantityUnit::Piece));
        assert_eq!(five.unwrap(), Decimal::new(25, 0));
    }

    #[test]
    fn test_line_price_rounds_to_paise() {
        let price = Price::parse("99.99").unwrap();
        let total = line_price(price, QuantityUnit::Kilogram, &qty(333, 0, QuantityUnit::Gram));
        assert_eq!(total.unwrap(), Decimal::new(3330, 2));
    }

    #[test]
    fn test_selectable_units_share_family() {
        assert_eq!(
            QuantityUnit::Kilogram.selectable(),
            vec![QuantityUnit::Kilogram, QuantityUnit::Gram]
        );
        assert_eq!(QuantityUnit::Pack.selectable(), vec![QuantityUnit::Pack]);
    }

    #[test]
    fn test_step_controls() {
        let quarter = qty(25, 2, QuantityUnit::Kilogram);
        assert_eq!(quarter.step_up().amount(), Decimal::new(5, 1));
        assert!(quarter.step_down().is_none());
        assert_eq!(
            qty(3, 0, QuantityUnit::Piece).step_down().unwrap().amount(),
            Decimal::new(2, 0)
        );
    }

    #[test]
    fn test_absurd_quantities_rejected() {
        let huge = Decimal::from_str("1000000000000000000000000000").unwrap();
        assert_eq!(
            Quantity::new(huge, QuantityUnit::Kilogram),
            Err(UnitError::TooLarge)
        );
        assert!(serde_json::from_str::<Quantity>(r#"{"amount":"100001","unit":"g"}"#).is_err());
        assert!(Quantity::new(MAX_QUANTITY, QuantityUnit::Gram).is_ok());
    }

    #[test]
    fn test_merge_past_cap_is_an_error() {
        let line = qty(99_000, 0, QuantityUnit::Gram);
        assert_eq!(
            line.checked_add(&qty(2, 0, QuantityUnit::Kilogram)),
            Err(UnitError::TooLarge)
        );
        assert_eq!(
            qty(200, 0, QuantityUnit::Kilogram).convert_to(QuantityUnit::Gram),
            Err(UnitError::TooLarge)
        );
    }

    #[test]
    fn test_line_price_overflow_is_an_error() {
        let price = Price::parse("79000000000000000000000000000").unwrap();
        let total = line_price(price, QuantityUnit::Kilogram, &qty(2, 0, QuantityUnit::Kilogram));
        assert_eq!(total, Err(UnitError::Overflow));

        let dear = Price::parse("70000000000000000000000000").unwrap();
        let total = line_price(dear, QuantityUnit::Gram, &qty(5, 0, QuantityUnit::Kilogram));
        assert_eq!(total, Err(UnitError::Overflow));
    }

    #[test]
    fn test_step_up_stops_at_cap() {
        let full = Quantity::new(MAX_QUANTITY, QuantityUnit::Piece).unwrap();
        assert_eq!(full.step_up(), full);
    }

    #[test]
    fn test_display() {
        assert_eq!(qty(500, 0, QuantityUnit::Gram).to_string(), "500 g");
        assert_eq!(qty(15, 1, QuantityUnit::Kilogram).to_string(), "1.5 kg");
    }
}
