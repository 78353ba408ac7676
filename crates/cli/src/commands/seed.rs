//! Catalog seeding command.
//!
//! Reads a YAML list of products and upserts each one by name, so the same
//! file can be re-run after editing prices.
//!
//! ```yaml
//! - name: Alphonso Mango
//!   category: Fruits
//!   price: 450
//!   quantityUnit: dozen
//!   image: https://cdn.example.in/mango.jpg
//! - name: Toor Dal
//!   category: Staples
//!   price: "Rs. 160"
//!   quantityUnit: kg
//! ```

use std::path::Path;

use thiserror::Error;

use freshbasket_api::db::{ProductRepository, RepositoryError};
use freshbasket_api::models::product::{NewProduct, ProductInput, ProductValidationError};

use super::{ConnectError, connect};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Product #{index} ({name}): {source}")]
    Invalid {
        index: usize,
        name: String,
        source: ProductValidationError,
    },

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Parse and validate every product in a YAML document.
///
/// Fails on the first invalid entry so nothing is written from a bad file.
pub fn parse_products(yaml: &str) -> Result<Vec<NewProduct>, SeedError> {
    let inputs: Vec<ProductInput> = serde_yaml::from_str(yaml)?;

    inputs
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            let name = input.name.clone().unwrap_or_default();
            input.into_new().map_err(|source| SeedError::Invalid {
                index: i + 1,
                name,
                source,
            })
        })
        .collect()
}

/// Upsert products from `file`.
pub async fn products(file: &Path) -> Result<(), SeedError> {
    let yaml = std::fs::read_to_string(file).map_err(|source| SeedError::Read {
        path: file.display().to_string(),
        source,
    })?;
    let products = parse_products(&yaml)?;

    let pool = connect().await?;
    let repo = ProductRepository::new(&pool);

    let mut created = 0_usize;
    let mut updated = 0_usize;
    for product in &products {
        let (saved, was_created) = repo.upsert_by_name(product).await?;
        if was_created {
            created += 1;
        } else {
            updated += 1;
        }
        tracing::debug!(id = %saved.id, name = %saved.name, was_created, "Seeded product");
    }

    tracing::info!("Seeding complete: {created} created, {updated} updated");
    Ok(())
}
