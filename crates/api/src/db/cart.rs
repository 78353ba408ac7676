//! Cart repository for database operations.
//!
//! Every query is scoped by `client_id`, so one browser can never read or
//! modify another browser's lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use freshbasket_core::{CartItemId, MAX_QUANTITY, ProductId, Quantity, QuantityUnit, UnitError};

use super::RepositoryError;
use super::products::ProductRow;
use crate::models::cart::CartItem;
use crate::models::product::Product;

const CART_ITEM_SELECT: &str = r"
    SELECT c.id AS item_id, c.client_id, c.quantity, c.unit,
           c.created_at AS item_created_at, c.updated_at AS item_updated_at,
           p.id, p.name, p.category, p.price, p.quantity_unit, p.description, p.image,
           p.created_at, p.updated_at
    FROM shop.cart_item c
    JOIN shop.product p ON p.id = c.product_id
";

#[derive(sqlx::FromRow)]
struct CartItemRow {
    item_id: i32,
    client_id: Uuid,
    quantity: Decimal,
    unit: String,
    item_created_at: DateTime<Utc>,
    item_updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    product: ProductRow,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let quantity = stored_quantity(row.item_id, row.quantity, &row.unit)?;

        Ok(Self {
            id: CartItemId::new(row.item_id),
            client_id: row.client_id,
            product: Product::try_from(row.product)?,
            quantity,
            created_at: row.item_created_at,
            updated_at: row.item_updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ExistingLine {
    id: i32,
    quantity: Decimal,
    unit: String,
}

fn stored_quantity(id: i32, amount: Decimal, unit: &str) -> Result<Quantity, RepositoryError> {
    let unit = QuantityUnit::parse(unit).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid unit for cart item {id}: {e}"))
    })?;
    Quantity::new(amount, unit).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid quantity for cart item {id}: {e}"))
    })
}

/// Add `extra` to a stored line's quantity, keeping the line's unit.
fn merge_quantity(id: i32, current: &Quantity, extra: &Quantity) -> Result<Quantity, RepositoryError> {
    current.checked_add(extra).map_err(|e| match e {
        UnitError::TooLarge | UnitError::Overflow => RepositoryError::Rejected(format!(
            "Cart quantity for this product cannot exceed {MAX_QUANTITY} {}",
            current.unit()
        )),
        other => RepositoryError::DataCorruption(format!("cannot merge into cart item {id}: {other}")),
    })
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All lines for a client, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn list(&self, client_id: Uuid) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(&format!(
            "{CART_ITEM_SELECT} WHERE c.client_id = $1 ORDER BY c.created_at, c.id"
        ))
        .bind(client_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(CartItem::try_from).collect()
    }

    /// Get one of the client's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get(
        &self,
        client_id: Uuid,
        id: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(&format!(
            "{CART_ITEM_SELECT} WHERE c.client_id = $1 AND c.id = $2"
        ))
        .bind(client_id)
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(CartItem::try_from).transpose()
    }

    /// Add a quantity of a product to the client's cart.
    ///
    /// The first add for a product inserts a line. Any later add, including
    /// one racing the first, converts the quantity into the existing line's
    /// unit and adds it while holding a row lock, so concurrent adds from two
    /// tabs both count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Rejected` if the merged quantity would exceed
    /// the per-line cap.
    /// Returns `RepositoryError::DataCorruption` if the existing line's unit
    /// cannot absorb `quantity` (callers check compatibility first).
    /// Returns `RepositoryError::Conflict` if the line vanished mid-merge.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add(
        &self,
        client_id: Uuid,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let inserted: Option<i32> = sqlx::query_scalar(
            r"
            INSERT INTO shop.cart_item (client_id, product_id, quantity, unit)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (client_id, product_id) DO NOTHING
            RETURNING id
            ",
        )
        .bind(client_id)
        .bind(product_id.as_i32())
        .bind(quantity.amount())
        .bind(quantity.unit().as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let id = match inserted {
            Some(id) => id,
            None => {
                let line = sqlx::query_as::<_, ExistingLine>(
                    r"
                    SELECT id, quantity, unit
                    FROM shop.cart_item
                    WHERE client_id = $1 AND product_id = $2
                    FOR UPDATE
                    ",
                )
                .bind(client_id)
                .bind(product_id.as_i32())
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| RepositoryError::Conflict("cart line changed, retry".to_owned()))?;

                let current = stored_quantity(line.id, line.quantity, &line.unit)?;
                let merged = merge_quantity(line.id, &current, &quantity)?;

                sqlx::query(
                    r"
                    UPDATE shop.cart_item
                    SET quantity = $2, updated_at = NOW()
                    WHERE id = $1
                    ",
                )
                .bind(line.id)
                .bind(merged.amount())
                .execute(&mut *tx)
                .await?;

                line.id
            }
        };

        tx.commit().await?;

        self.get(client_id, CartItemId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace the quantity (and unit) of one of the client's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not the client's.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_quantity(
        &self,
        client_id: Uuid,
        id: CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.cart_item
            SET quantity = $3, unit = $4, updated_at = NOW()
            WHERE client_id = $1 AND id = $2
            ",
        )
        .bind(client_id)
        .bind(id.as_i32())
        .bind(quantity.amount())
        .bind(quantity.unit().as_str())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(client_id, id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Remove one of the client's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not the client's.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&self, client_id: Uuid, id: CartItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.cart_item WHERE client_id = $1 AND id = $2")
            .bind(client_id)
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove all of the client's lines. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, client_id: Uuid) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.cart_item WHERE client_id = $1")
            .bind(client_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_converts_into_line_unit() {
        let line = Quantity::one(QuantityUnit::Kilogram);
        let extra = Quantity::new(Decimal::new(250, 0), QuantityUnit::Gram).unwrap();
        let merged = merge_quantity(1, &line, &extra).unwrap();
        assert_eq!(merged.unit(), QuantityUnit::Kilogram);
        assert_eq!(merged.amount(), Decimal::new(125, 2));
    }

    #[test]
    fn test_merge_past_cap_is_rejected_not_corrupt() {
        let line = Quantity::new(Decimal::new(99_000, 0), QuantityUnit::Piece).unwrap();
        let extra = Quantity::new(Decimal::new(100, 0), QuantityUnit::Dozen).unwrap();
        let err = merge_quantity(1, &line, &extra).unwrap_err();
        assert!(matches!(err, RepositoryError::Rejected(ref msg) if msg.contains("100000 piece")));
    }

    #[test]
    fn test_merge_foreign_unit_is_corruption() {
        let line = Quantity::one(QuantityUnit::Pack);
        let extra = Quantity::one(QuantityUnit::Litre);
        assert!(matches!(
            merge_quantity(4, &line, &extra),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
