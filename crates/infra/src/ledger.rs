//! [`SaleLedger`] backed by the hosted record store.

use chrono::{DateTime, Utc};

use stockroom_core::{ProductId, SaleId, StoreError, StoreResult};
use stockroom_sales::{NewSale, SaleLedger, SaleRecord};

use crate::records::wire::{
    SALE_FIELDS, SaleRow, SaleWrite, decode_recorded_sale, decode_row, decode_rows_skipping,
    format_timestamp,
};
use crate::records::{Condition, FetchParams, Operator, RecordClient, SortOrder};

#[derive(Debug, Clone)]
pub struct RemoteSaleLedger<R> {
    client: R,
    table: String,
}

impl<R> RemoteSaleLedger<R>
where
    R: RecordClient,
{
    pub fn new(client: R, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    fn newest_first() -> FetchParams {
        FetchParams::fields(SALE_FIELDS).order_by("timestamp_c", SortOrder::Desc)
    }

    /// Rows that cannot be read as sales are skipped, so one bad historical row
    /// does not hide the rest of the ledger.
    async fn query(&self, params: FetchParams) -> StoreResult<Vec<SaleRecord>> {
        let rows = self.client.fetch_records(&self.table, &params).await?;
        Ok(decode_rows_skipping(&self.table, rows, Utc::now(), SaleRow::into_sale))
    }
}

#[async_trait::async_trait]
impl<R> SaleLedger for RemoteSaleLedger<R>
where
    R: RecordClient,
{
    async fn fetch_all(&self) -> StoreResult<Vec<SaleRecord>> {
        self.query(Self::newest_first()).await
    }

    async fn fetch_by_id(&self, id: SaleId) -> StoreResult<SaleRecord> {
        let row = self.client.get_record_by_id(&self.table, id.get()).await?;
        decode_row(row, Utc::now(), SaleRow::into_sale)
    }

    async fn create(&self, sale: NewSale) -> StoreResult<SaleRecord> {
        sale.validate()?;
        let now = Utc::now();
        let record = SaleWrite::new(&sale, now).to_value()?;

        let created = self.client.create_records(&self.table, vec![record]).await?;
        let row = created
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::decode(format!("{} returned no record", self.table)))?;

        let recorded = decode_recorded_sale(row, &sale, now)?;
        tracing::info!(
            sale_id = %recorded.id,
            product_id = %recorded.product_id,
            quantity = recorded.quantity,
            "sale recorded"
        );
        Ok(recorded)
    }

    async fn fetch_by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<SaleRecord> {
        let params = Self::newest_first()
            .filter(Condition::new(
                "timestamp_c",
                Operator::GreaterThanOrEqualTo,
                format_timestamp(start),
            ))
            .filter(Condition::new(
                "timestamp_c",
                Operator::LessThanOrEqualTo,
                format_timestamp(end),
            ));
        self.query(params).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, %start, %end, "sales by date range failed");
            Vec::new()
        })
    }

    async fn fetch_by_product(&self, product_id: ProductId) -> Vec<SaleRecord> {
        let params = Self::newest_first().filter(Condition::new(
            "productId_c",
            Operator::EqualTo,
            product_id.get(),
        ));
        self.query(params).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, %product_id, "sales by product failed");
            Vec::new()
        })
    }
}
