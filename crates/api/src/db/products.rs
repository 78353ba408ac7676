//! Product repository for database operations.
//!
//! Prices and units are stored as text and re-validated on the way out, so a
//! hand-edited row that no longer parses surfaces as `DataCorruption`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use freshbasket_core::{Price, ProductId, QuantityUnit};

use super::{RepositoryError, escape_like};
use crate::models::product::{NewProduct, Product, ProductChanges};

const PRODUCT_COLUMNS: &str =
    "id, name, category, price, quantity_unit, description, image, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(super) struct ProductRow {
    pub(super) id: i32,
    pub(super) name: String,
    pub(super) category: String,
    pub(super) price: String,
    pub(super) quantity_unit: String,
    pub(super) description: String,
    pub(super) image: Option<String>,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::parse(&row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;
        let quantity_unit = QuantityUnit::parse(&row.quantity_unit).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid unit for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            category: row.category,
            price,
            quantity_unit,
            description: row.description,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products ordered by name, optionally filtered by a
    /// case-insensitive substring of name, category or description.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.product
            WHERE $1::text IS NULL
               OR name ILIKE $1
               OR category ILIKE $1
               OR description ILIKE $1
            ORDER BY name, id
            "
        ))
        .bind(pattern)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// List products in a category (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.product
            WHERE LOWER(category) = LOWER($1)
            ORDER BY name, id
            "
        ))
        .bind(category.trim())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO shop.product (name, category, price, quantity_unit, description, image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.quantity_unit.as_str())
        .bind(&product.description)
        .bind(product.image.as_deref())
        .fetch_one(self.pool)
        .await?;

        Product::try_from(row)
    }

    /// Apply a partial update.
    ///
    /// When the unit changes, cart lines for this product whose unit is no
    /// longer compatible are removed in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE shop.product
            SET name = COALESCE($2, name),
                category = COALESCE($3, category),
                price = COALESCE($4, price),
                quantity_unit = COALESCE($5, quantity_unit),
                description = COALESCE($6, description),
                image = CASE WHEN $7 THEN $8 ELSE image END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id.as_i32())
        .bind(changes.name.as_deref())
        .bind(changes.category.as_deref())
        .bind(changes.price)
        .bind(changes.quantity_unit.map(QuantityUnit::as_str))
        .bind(changes.description.as_deref())
        .bind(changes.image.is_some())
        .bind(changes.image.clone().flatten())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if let Some(unit) = changes.quantity_unit {
            let compatible: Vec<&str> = unit.selectable().into_iter().map(QuantityUnit::as_str).collect();
            let removed = sqlx::query(
                "DELETE FROM shop.cart_item WHERE product_id = $1 AND unit <> ALL($2)",
            )
            .bind(id.as_i32())
            .bind(&compatible)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if removed > 0 {
                tracing::info!(product_id = %id, removed, "Dropped cart lines after unit change");
            }
        }

        tx.commit().await?;
        Product::try_from(row)
    }

    /// Delete a product. Cart lines referencing it are removed by cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Insert a product, or update the existing one with the same name
    /// (case-insensitive). Returns the product and whether it was created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_by_name(
        &self,
        product: &NewProduct,
    ) -> Result<(Product, bool), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i32> = sqlx::query_scalar(
            "SELECT id FROM shop.product WHERE LOWER(name) = LOWER($1) ORDER BY id LIMIT 1 FOR UPDATE",
        )
        .bind(&product.name)
        .fetch_optional(&mut *tx)
        .await?;

        let (row, created) = match existing {
            Some(id) => {
                let row = sqlx::query_as::<_, ProductRow>(&format!(
                    r"
                    UPDATE shop.product
                    SET category = $2, price = $3, quantity_unit = $4,
                        description = $5, image = $6, updated_at = NOW()
                    WHERE id = $1
                    RETURNING {PRODUCT_COLUMNS}
                    "
                ))
                .bind(id)
                .bind(&product.category)
                .bind(product.price)
                .bind(product.quantity_unit.as_str())
                .bind(&product.description)
                .bind(product.image.as_deref())
                .fetch_one(&mut *tx)
                .await?;
                (row, false)
            }
            None => {
                let row = sqlx::query_as::<_, ProductRow>(&format!(
                    r"
                    INSERT INTO shop.product (name, category, price, quantity_unit, description, image)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING {PRODUCT_COLUMNS}
                    "
                ))
                .bind(&product.name)
                .bind(&product.category)
                .bind(product.price)
                .bind(product.quantity_unit.as_str())
                .bind(&product.description)
                .bind(product.image.as_deref())
                .fetch_one(&mut *tx)
                .await?;
                (row, true)
            }
        };

        tx.commit().await?;
        Ok((Product::try_from(row)?, created))
    }
}
