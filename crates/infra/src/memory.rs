//! In-memory catalog and ledger.
//!
//! Intended for tests/dev. Ids are assigned sequentially from 1. Failures can be
//! injected per product to exercise partial commits.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use stockroom_core::{Money, ProductId, SaleId, StoreError, StoreResult};
use stockroom_products::{Product, ProductCatalog, ProductDraft, ProductPatch};
use stockroom_sales::{NewSale, SaleLedger, SaleRecord};

const PRODUCT_TABLE: &str = "product_c";
const SALE_TABLE: &str = "sale_c";

fn poisoned() -> StoreError {
    StoreError::transport("lock poisoned")
}

#[derive(Debug, Default)]
struct CatalogState {
    products: BTreeMap<ProductId, Product>,
    next_id: i64,
}

#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    state: RwLock<CatalogState>,
    update_faults: RwLock<HashMap<ProductId, StoreError>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from `products` as-is, ids included.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products: BTreeMap<_, _> = products.into_iter().map(|p| (p.id, p)).collect();
        let next_id = products.keys().last().map_or(0, |id| id.get());
        Self {
            state: RwLock::new(CatalogState { products, next_id }),
            update_faults: RwLock::default(),
        }
    }

    /// A small shop floor with healthy, low and empty shelves.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let rows: [(&str, &str, u64, u32, u32); 6] = [
            ("Wireless Mouse", "WM-001", 2499, 45, 10),
            ("USB-C Cable", "UC-002", 999, 8, 15),
            ("Mechanical Keyboard", "MK-003", 8900, 0, 5),
            ("Laptop Stand", "LS-004", 3950, 12, 10),
            ("HD Webcam", "WC-005", 5999, 3, 5),
            ("A5 Notebook", "NB-006", 425, 120, 20),
        ];

        Self::with_products(rows.into_iter().zip(1..).map(
            |((name, sku, cents, quantity, threshold), id)| Product {
                id: ProductId::new(id),
                name: name.to_string(),
                sku: sku.to_string(),
                price: Money::from_cents(cents),
                quantity,
                low_stock_threshold: threshold,
                last_updated: now,
            },
        ))
    }

    /// Make every later `update` of `id` fail with `error`.
    pub fn fail_updates_for(&self, id: ProductId, error: StoreError) {
        if let Ok(mut faults) = self.update_faults.write() {
            faults.insert(id, error);
        }
    }

    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.update_faults.write() {
            faults.clear();
        }
    }

    fn injected_fault(&self, id: ProductId) -> StoreResult<()> {
        let faults = self.update_faults.read().map_err(|_| poisoned())?;
        match faults.get(&id) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn fetch_all(&self) -> StoreResult<Vec<Product>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let mut products: Vec<Product> = state.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn fetch_by_id(&self, id: ProductId) -> StoreResult<Product> {
        let state = self.state.read().map_err(|_| poisoned())?;
        state
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(PRODUCT_TABLE, id.get()))
    }

    async fn create(&self, draft: ProductDraft) -> StoreResult<Product> {
        draft.validate()?;
        let mut state = self.state.write().map_err(|_| poisoned())?;
        state.next_id += 1;
        let id = ProductId::new(state.next_id);
        let product = draft.into_product(id, Utc::now());
        state.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product> {
        patch.validate()?;
        self.injected_fault(id)?;

        let mut state = self.state.write().map_err(|_| poisoned())?;
        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(PRODUCT_TABLE, id.get()))?;
        patch.apply_to(product, Utc::now());
        Ok(product.clone())
    }

    async fn delete(&self, id: ProductId) -> StoreResult<bool> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        Ok(state.products.remove(&id).is_some())
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    sales: Vec<SaleRecord>,
    next_id: i64,
}

#[derive(Debug, Default)]
pub struct InMemorySaleLedger {
    state: RwLock<LedgerState>,
    create_faults: RwLock<HashMap<ProductId, StoreError>>,
}

impl InMemorySaleLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing history, ids included.
    pub fn with_sales(sales: impl IntoIterator<Item = SaleRecord>) -> Self {
        let sales: Vec<SaleRecord> = sales.into_iter().collect();
        let next_id = sales.iter().map(|s| s.id.get()).max().unwrap_or(0);
        Self {
            state: RwLock::new(LedgerState { sales, next_id }),
            create_faults: RwLock::default(),
        }
    }

    /// Make every later sale of `product_id` fail to record.
    pub fn fail_creates_for(&self, product_id: ProductId, error: StoreError) {
        if let Ok(mut faults) = self.create_faults.write() {
            faults.insert(product_id, error);
        }
    }

    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.create_faults.write() {
            faults.clear();
        }
    }

    fn select(&self, keep: impl Fn(&SaleRecord) -> bool) -> StoreResult<Vec<SaleRecord>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let mut sales: Vec<SaleRecord> = state.sales.iter().filter(|s| keep(s)).cloned().collect();
        sales.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(sales)
    }
}

#[async_trait::async_trait]
impl SaleLedger for InMemorySaleLedger {
    async fn fetch_all(&self) -> StoreResult<Vec<SaleRecord>> {
        self.select(|_| true)
    }

    async fn fetch_by_id(&self, id: SaleId) -> StoreResult<SaleRecord> {
        let state = self.state.read().map_err(|_| poisoned())?;
        state
            .sales
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(SALE_TABLE, id.get()))
    }

    async fn create(&self, sale: NewSale) -> StoreResult<SaleRecord> {
        sale.validate()?;
        {
            let faults = self.create_faults.read().map_err(|_| poisoned())?;
            if let Some(err) = faults.get(&sale.product_id) {
                return Err(err.clone());
            }
        }

        let mut state = self.state.write().map_err(|_| poisoned())?;
        state.next_id += 1;
        let record = sale.into_record(SaleId::new(state.next_id), Utc::now());
        state.sales.push(record.clone());
        Ok(record)
    }

    async fn fetch_by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<SaleRecord> {
        self.select(|s| s.timestamp >= start && s.timestamp <= end)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "sales by date range failed");
                Vec::new()
            })
    }

    async fn fetch_by_product(&self, product_id: ProductId) -> Vec<SaleRecord> {
        self.select(|s| s.product_id == product_id)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, %product_id, "sales by product failed");
                Vec::new()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn draft(name: &str, quantity: u32) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            sku: format!("SKU-{name}"),
            price: Money::from_cents(500),
            quantity,
            low_stock_threshold: 2,
        }
    }

    #[tokio::test]
    async fn catalog_assigns_sequential_ids_and_lists_by_name() {
        let catalog = InMemoryProductCatalog::new();
        let zeta = catalog.create(draft("Zeta", 1)).await.unwrap();
        let alpha = catalog.create(draft("Alpha", 1)).await.unwrap();

        assert_eq!(zeta.id, ProductId::new(1));
        assert_eq!(alpha.id, ProductId::new(2));

        let names: Vec<String> = catalog
            .fetch_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[tokio::test]
    async fn update_stamps_last_updated() {
        let old = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let product = draft("Tape", 9).into_product(ProductId::new(4), old);
        let catalog = InMemoryProductCatalog::with_products([product]);

        let updated = catalog
            .update(ProductId::new(4), ProductPatch::quantity(7))
            .await
            .unwrap();

        assert_eq!(updated.quantity, 7);
        assert!(updated.last_updated > old);
        assert_eq!(catalog.fetch_by_id(ProductId::new(4)).await.unwrap(), updated);

        let next = catalog.create(draft("Glue", 1)).await.unwrap();
        assert_eq!(next.id, ProductId::new(5));
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let catalog = InMemoryProductCatalog::new();
        assert_eq!(
            catalog.update(ProductId::new(9), ProductPatch::quantity(1)).await,
            Err(StoreError::not_found("product_c", 9))
        );
        assert!(!catalog.delete(ProductId::new(9)).await.unwrap());
    }

    #[tokio::test]
    async fn injected_update_fault_leaves_stock_alone() {
        let catalog = InMemoryProductCatalog::seeded();
        catalog.fail_updates_for(ProductId::new(1), StoreError::transport("timeout"));

        let result = catalog.update(ProductId::new(1), ProductPatch::quantity(0)).await;

        assert_eq!(result, Err(StoreError::transport("timeout")));
        assert_eq!(catalog.fetch_by_id(ProductId::new(1)).await.unwrap().quantity, 45);

        catalog.clear_faults();
        assert!(catalog.update(ProductId::new(1), ProductPatch::quantity(0)).await.is_ok());
    }

    #[tokio::test]
    async fn seeded_catalog_has_every_stock_level() {
        let catalog = InMemoryProductCatalog::seeded();
        assert_eq!(catalog.fetch_all().await.unwrap().len(), 6);
        assert_eq!(catalog.out_of_stock().await.len(), 1);
        assert_eq!(catalog.low_stock(10).await.len(), 3);
    }

    #[tokio::test]
    async fn ledger_lists_newest_first() {
        let ledger = InMemorySaleLedger::new();
        for quantity in 1..=3 {
            ledger
                .create(NewSale {
                    product_id: ProductId::new(1),
                    quantity,
                    price: Money::from_cents(100),
                })
                .await
                .unwrap();
        }

        let ids: Vec<i64> = ledger
            .fetch_all()
            .await
            .unwrap()
            .iter()
            .map(|s| s.id.get())
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(ledger.fetch_by_id(SaleId::new(2)).await.unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn ledger_range_and_product_queries() {
        let base = Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap();
        let sale = |id: i64, product: i64, offset_hours: i64| SaleRecord {
            id: SaleId::new(id),
            product_id: ProductId::new(product),
            quantity: 1,
            price: Money::from_cents(100),
            timestamp: base + Duration::hours(offset_hours),
        };
        let ledger = InMemorySaleLedger::with_sales([sale(1, 1, -1), sale(2, 2, 0), sale(3, 1, 24)]);

        let in_range = ledger.fetch_by_date_range(base, base + Duration::hours(24)).await;
        assert_eq!(in_range.iter().map(|s| s.id.get()).collect::<Vec<_>>(), vec![3, 2]);

        let for_one = ledger.fetch_by_product(ProductId::new(1)).await;
        assert_eq!(for_one.len(), 2);

        let next = ledger
            .create(NewSale {
                product_id: ProductId::new(2),
                quantity: 1,
                price: Money::from_cents(100),
            })
            .await
            .unwrap();
        assert_eq!(next.id, SaleId::new(4));
    }

    #[tokio::test]
    async fn todays_sales_include_a_sale_made_now() {
        let ledger = InMemorySaleLedger::new();
        ledger
            .create(NewSale {
                product_id: ProductId::new(1),
                quantity: 1,
                price: Money::from_cents(100),
            })
            .await
            .unwrap();

        assert_eq!(ledger.todays_sales().await.len(), 1);
    }

    #[tokio::test]
    async fn injected_create_fault_records_nothing() {
        let ledger = InMemorySaleLedger::new();
        ledger.fail_creates_for(ProductId::new(2), StoreError::rejected("quota exceeded"));

        let result = ledger
            .create(NewSale {
                product_id: ProductId::new(2),
                quantity: 1,
                price: Money::from_cents(100),
            })
            .await;

        assert_eq!(result, Err(StoreError::rejected("quota exceeded")));
        assert!(ledger.fetch_all().await.unwrap().is_empty());
    }
}
