//! [`ProductCatalog`] backed by the hosted record store.

use chrono::Utc;

use stockroom_core::{ProductId, StoreError, StoreResult};
use stockroom_products::{Product, ProductCatalog, ProductDraft, ProductPatch};

use crate::records::wire::{PRODUCT_FIELDS, ProductRow, ProductWrite, decode_row, decode_rows};
use crate::records::{Condition, FetchParams, Operator, RecordClient, SortOrder};

#[derive(Debug, Clone)]
pub struct RemoteProductCatalog<R> {
    client: R,
    table: String,
}

impl<R> RemoteProductCatalog<R>
where
    R: RecordClient,
{
    pub fn new(client: R, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    fn listing() -> FetchParams {
        FetchParams::fields(PRODUCT_FIELDS).order_by("Name", SortOrder::Asc)
    }

    async fn query(&self, params: FetchParams) -> StoreResult<Vec<Product>> {
        let rows = self.client.fetch_records(&self.table, &params).await?;
        decode_rows(rows, Utc::now(), ProductRow::into_product)
    }

    /// First record of a create/update batch.
    fn single(&self, mut rows: Vec<serde_json::Value>) -> StoreResult<Product> {
        if rows.is_empty() {
            return Err(StoreError::decode(format!("{} returned no record", self.table)));
        }
        decode_row(rows.swap_remove(0), Utc::now(), ProductRow::into_product)
    }
}

#[async_trait::async_trait]
impl<R> ProductCatalog for RemoteProductCatalog<R>
where
    R: RecordClient,
{
    async fn fetch_all(&self) -> StoreResult<Vec<Product>> {
        self.query(Self::listing()).await
    }

    async fn fetch_by_id(&self, id: ProductId) -> StoreResult<Product> {
        let row = self.client.get_record_by_id(&self.table, id.get()).await?;
        decode_row(row, Utc::now(), ProductRow::into_product)
    }

    async fn create(&self, draft: ProductDraft) -> StoreResult<Product> {
        draft.validate()?;
        let record = ProductWrite::from_draft(&draft, Utc::now()).to_value()?;
        let created = self.client.create_records(&self.table, vec![record]).await?;
        let product = self.single(created)?;
        tracing::info!(product_id = %product.id, sku = %product.sku, "product created");
        Ok(product)
    }

    async fn update(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product> {
        patch.validate()?;
        let record = ProductWrite::from_patch(id, &patch, Utc::now()).to_value()?;
        let updated = self.client.update_records(&self.table, vec![record]).await?;
        self.single(updated)
    }

    async fn delete(&self, id: ProductId) -> StoreResult<bool> {
        let deleted = self.client.delete_records(&self.table, vec![id.get()]).await?;
        Ok(deleted > 0)
    }

    async fn low_stock(&self, threshold: u32) -> Vec<Product> {
        let params = Self::listing().filter(Condition::new(
            "quantity_c",
            Operator::LessThanOrEqualTo,
            threshold.to_string(),
        ));
        self.query(params).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, threshold, "low stock query failed");
            Vec::new()
        })
    }

    async fn out_of_stock(&self) -> Vec<Product> {
        let params = Self::listing().filter(Condition::new("quantity_c", Operator::EqualTo, "0"));
        self.query(params).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "out of stock query failed");
            Vec::new()
        })
    }
}
