//! Product catalog contract and the caller-held catalog snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use stockroom_core::entity::find_by_id;
use stockroom_core::{ProductId, StoreResult};

use crate::product::{Product, ProductDraft, ProductPatch};

/// Authoritative product records, reached asynchronously.
///
/// Implementations own timestamping: every successful `create`/`update` sets
/// `last_updated`. `update` fails with `StoreError::NotFound` for an unknown id.
#[async_trait::async_trait]
pub trait ProductCatalog: Send + Sync {
    /// All products, ordered by name ascending.
    async fn fetch_all(&self) -> StoreResult<Vec<Product>>;

    async fn fetch_by_id(&self, id: ProductId) -> StoreResult<Product>;

    async fn create(&self, draft: ProductDraft) -> StoreResult<Product>;

    async fn update(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product>;

    /// Returns whether a record was deleted.
    async fn delete(&self, id: ProductId) -> StoreResult<bool>;

    /// Products with `quantity <= threshold`.
    ///
    /// Advisory: degrades to an empty list when the catalog cannot be read.
    async fn low_stock(&self, threshold: u32) -> Vec<Product> {
        match self.fetch_all().await {
            Ok(products) => products
                .into_iter()
                .filter(|p| p.quantity <= threshold)
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, threshold, "low-stock query failed; reporting none");
                Vec::new()
            }
        }
    }

    /// Products with `quantity == 0`. Degrades like [`ProductCatalog::low_stock`].
    async fn out_of_stock(&self) -> Vec<Product> {
        match self.fetch_all().await {
            Ok(products) => products.into_iter().filter(Product::is_out_of_stock).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "out-of-stock query failed; reporting none");
                Vec::new()
            }
        }
    }
}

#[async_trait::async_trait]
impl<S> ProductCatalog for Arc<S>
where
    S: ProductCatalog + ?Sized,
{
    async fn fetch_all(&self) -> StoreResult<Vec<Product>> {
        (**self).fetch_all().await
    }

    async fn fetch_by_id(&self, id: ProductId) -> StoreResult<Product> {
        (**self).fetch_by_id(id).await
    }

    async fn create(&self, draft: ProductDraft) -> StoreResult<Product> {
        (**self).create(draft).await
    }

    async fn update(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: ProductId) -> StoreResult<bool> {
        (**self).delete(id).await
    }

    async fn low_stock(&self, threshold: u32) -> Vec<Product> {
        (**self).low_stock(threshold).await
    }

    async fn out_of_stock(&self) -> Vec<Product> {
        (**self).out_of_stock().await
    }
}

/// The latest catalog state known to a caller.
///
/// Cart operations check requested quantities against this instead of querying the
/// catalog on every change. It goes stale as soon as anyone else writes; callers
/// refresh it with [`CatalogSnapshot::fetch`] after committing a sale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    products: Vec<Product>,
    taken_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    pub fn new(products: Vec<Product>, taken_at: DateTime<Utc>) -> Self {
        Self {
            products,
            taken_at: Some(taken_at),
        }
    }

    /// Read the whole catalog into a fresh snapshot.
    pub async fn fetch<C>(catalog: &C) -> StoreResult<Self>
    where
        C: ProductCatalog + ?Sized,
    {
        let products = catalog.fetch_all().await?;
        Ok(Self::new(products, Utc::now()))
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        find_by_id(&self.products, id)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn taken_at(&self) -> Option<DateTime<Utc>> {
        self.taken_at
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Products whose name or SKU contains `term` (case-insensitive).
    pub fn search(&self, term: &str) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.matches_search(term))
            .collect()
    }
}
