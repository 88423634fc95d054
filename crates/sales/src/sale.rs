use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, Money, ProductId, SaleId, StoreResult};

/// One committed sale line. Append-only: never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: SaleId,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price captured when the sale was made.
    pub price: Money,
    pub timestamp: DateTime<Utc>,
}

impl Entity for SaleRecord {
    type Id = SaleId;

    fn id(&self) -> SaleId {
        self.id
    }
}

impl SaleRecord {
    pub fn line_total(&self) -> Money {
        self.price.times(self.quantity)
    }
}

/// Payload for appending a sale; the ledger assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSale {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
}

impl NewSale {
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity == 0 {
            return Err(DomainError::validation("sale quantity must be positive"));
        }
        Ok(())
    }

    pub fn into_record(self, id: SaleId, timestamp: DateTime<Utc>) -> SaleRecord {
        SaleRecord {
            id,
            product_id: self.product_id,
            quantity: self.quantity,
            price: self.price,
            timestamp,
        }
    }
}

/// Append-only sale records, reached asynchronously.
///
/// The range/product/today projections are advisory: implementations degrade them to
/// an empty list instead of failing.
#[async_trait::async_trait]
pub trait SaleLedger: Send + Sync {
    /// All sales, newest first.
    async fn fetch_all(&self) -> StoreResult<Vec<SaleRecord>>;

    async fn fetch_by_id(&self, id: SaleId) -> StoreResult<SaleRecord>;

    async fn create(&self, sale: NewSale) -> StoreResult<SaleRecord>;

    /// Sales with `start <= timestamp <= end`.
    async fn fetch_by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<SaleRecord>;

    async fn fetch_by_product(&self, product_id: ProductId) -> Vec<SaleRecord>;

    /// Sales made since local midnight.
    async fn todays_sales(&self) -> Vec<SaleRecord> {
        let (start, end) = day_bounds(&Local, Local::now().date_naive());
        self.fetch_by_date_range(start, end).await
    }
}

#[async_trait::async_trait]
impl<S> SaleLedger for Arc<S>
where
    S: SaleLedger + ?Sized,
{
    async fn fetch_all(&self) -> StoreResult<Vec<SaleRecord>> {
        (**self).fetch_all().await
    }

    async fn fetch_by_id(&self, id: SaleId) -> StoreResult<SaleRecord> {
        (**self).fetch_by_id(id).await
    }

    async fn create(&self, sale: NewSale) -> StoreResult<SaleRecord> {
        (**self).create(sale).await
    }

    async fn fetch_by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<SaleRecord> {
        (**self).fetch_by_date_range(start, end).await
    }

    async fn fetch_by_product(&self, product_id: ProductId) -> Vec<SaleRecord> {
        (**self).fetch_by_product(product_id).await
    }

    async fn todays_sales(&self) -> Vec<SaleRecord> {
        (**self).todays_sales().await
    }
}

/// Midnight of `date` and midnight of the following day in `tz`, as UTC instants.
pub fn day_bounds<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = midnight(tz, date);
    let end = date
        .succ_opt()
        .map(|next| midnight(tz, next))
        .unwrap_or_else(|| start + Duration::days(1));
    (start, end)
}

fn midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}
