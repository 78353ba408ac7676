//! Cached product listings.
//!
//! Listings are cached in-process with `moka` (5-minute TTL). Searches are
//! not cached. Every product write calls [`Catalog::invalidate`].
//!
//! A generation counter guards against a load that started before a write
//! storing its rows after the write invalidated the cache.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use crate::db::{ProductRepository, RepositoryError};
use crate::models::product::Product;

const CACHE_TTL: Duration = Duration::from_secs(300);

/// Which listing a cache entry holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CatalogKey {
    /// Every product.
    All,
    /// One category, lower-cased.
    Category(String),
}

/// Product listings backed by the database with an in-memory cache.
#[derive(Clone)]
pub struct Catalog {
    cache: Cache<CatalogKey, Arc<Vec<Product>>>,
    generation: Arc<AtomicU64>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Create an empty catalog cache.
    #[must_use]
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(256)
            .time_to_live(CACHE_TTL)
            .build();
        Self {
            cache,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// All products, or those matching `search` when it is non-blank.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database query fails.
    pub async fn list(
        &self,
        pool: &PgPool,
        search: Option<&str>,
    ) -> Result<Arc<Vec<Product>>, RepositoryError> {
        if let Some(query) = search.map(str::trim).filter(|s| !s.is_empty()) {
            let products = ProductRepository::new(pool).list(Some(query)).await?;
            return Ok(Arc::new(products));
        }

        self.get_or_load(CatalogKey::All, || async move {
            ProductRepository::new(pool).list(None).await
        })
        .await
    }

    /// Products in `category` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database query fails.
    pub async fn by_category(
        &self,
        pool: &PgPool,
        category: &str,
    ) -> Result<Arc<Vec<Product>>, RepositoryError> {
        let key = CatalogKey::Category(category.trim().to_lowercase());
        self.get_or_load(key, || async move {
            ProductRepository::new(pool).list_by_category(category).await
        })
        .await
    }

    /// Drop every cached listing.
    pub async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        debug!("Catalog cache invalidated");
    }

    async fn get_or_load<F, Fut>(
        &self,
        key: CatalogKey,
        load: F,
    ) -> Result<Arc<Vec<Product>>, RepositoryError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Product>, RepositoryError>>,
    {
        if let Some(products) = self.cache.get(&key).await {
            debug!(?key, "Cache hit for products");
            return Ok(products);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let products = Arc::new(load().await?);

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(?key, "Catalog changed during load, not caching");
            return Ok(products);
        }
        self.cache.insert(key.clone(), Arc::clone(&products)).await;

        // An invalidation may have landed between the check and the insert.
        if self.generation.load(Ordering::SeqCst) != generation {
            self.cache.invalidate(&key).await;
        }
        Ok(products)
    }
}
