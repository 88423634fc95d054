//! Sales session: the caller side of the cart engine and the commit orchestrator.
//!
//! A session owns the latest [`CatalogSnapshot`], the sale history and one cart.
//! Cart operations are checked against the snapshot; the snapshot is refreshed after
//! every commit that wrote anything.

use chrono::Local;

use stockroom_core::{ProductId, StoreResult};
use stockroom_products::alerts::{alerts, low_stock_banner};
use stockroom_products::{
    AlertFilter, AlertStats, CatalogSnapshot, InventoryStats, Product, ProductCatalog,
    ProductPatch,
};

use crate::cart::{Cart, CartUpdate, CartWarning};
use crate::checkout::{CommitError, CommitReport, SaleCommitter};
use crate::sale::{SaleLedger, SaleRecord};
use crate::stats::SalesStats;

pub struct SalesSession<C, L> {
    committer: SaleCommitter<C, L>,
    snapshot: CatalogSnapshot,
    sales: Vec<SaleRecord>,
    cart: Cart,
    last_report: Option<CommitReport>,
}

impl<C, L> SalesSession<C, L>
where
    C: ProductCatalog,
    L: SaleLedger,
{
    /// An unloaded session; call [`SalesSession::load`] before taking orders.
    pub fn new(catalog: C, ledger: L) -> Self {
        Self {
            committer: SaleCommitter::new(catalog, ledger),
            snapshot: CatalogSnapshot::default(),
            sales: Vec::new(),
            cart: Cart::new(),
            last_report: None,
        }
    }

    /// Fetch products and sale history together. On failure the previous state is kept.
    pub async fn load(&mut self) -> StoreResult<()> {
        let (snapshot, sales) = tokio::join!(
            CatalogSnapshot::fetch(self.committer.catalog()),
            self.committer.ledger().fetch_all()
        );
        let (snapshot, sales) = (snapshot?, sales?);
        self.snapshot = snapshot;
        self.sales = sales;
        tracing::debug!(products = self.snapshot.len(), sales = self.sales.len(), "session loaded");
        Ok(())
    }

    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }

    pub fn products(&self) -> &[Product] {
        self.snapshot.products()
    }

    pub fn sales(&self) -> &[SaleRecord] {
        &self.sales
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn last_report(&self) -> Option<&CommitReport> {
        self.last_report.as_ref()
    }

    pub fn search(&self, term: &str) -> Vec<&Product> {
        self.snapshot.search(term)
    }

    pub fn add_to_cart(&mut self, product_id: ProductId) -> Result<CartUpdate, CartWarning> {
        let result = match self.snapshot.get(product_id) {
            Some(product) => self.cart.add_to_cart(product),
            None => Err(CartWarning::UnknownProduct(product_id)),
        };
        warn_rejected(result)
    }

    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartUpdate, CartWarning> {
        warn_rejected(self.cart.set_quantity(product_id, quantity, &self.snapshot))
    }

    pub fn increment(&mut self, product_id: ProductId) -> Result<CartUpdate, CartWarning> {
        warn_rejected(self.cart.increment_quantity(product_id, &self.snapshot))
    }

    pub fn decrement(&mut self, product_id: ProductId) -> Result<CartUpdate, CartWarning> {
        warn_rejected(self.cart.decrement_quantity(product_id, &self.snapshot))
    }

    pub fn remove(&mut self, product_id: ProductId) -> CartUpdate {
        self.cart.remove_item(product_id)
    }

    pub fn clear_cart(&mut self) -> usize {
        self.cart.clear()
    }

    /// Commit the cart, then reload if anything was written.
    ///
    /// A failed reload is logged and left for the next explicit [`SalesSession::load`];
    /// the commit outcome is returned either way.
    pub async fn process_sale(&mut self) -> Result<CommitReport, CommitError> {
        let report = self
            .committer
            .process_sale(&mut self.cart, &self.snapshot)
            .await?;

        if !report.committed_product_ids().is_empty() {
            if let Err(e) = self.load().await {
                tracing::warn!(commit_id = %report.commit_id(), error = %e, "reload after sale failed");
            }
        }

        self.last_report = Some(report.clone());
        Ok(report)
    }

    /// Drop cart lines the last commit already recorded. Returns how many were dropped.
    pub fn discard_committed(&mut self) -> usize {
        match &self.last_report {
            Some(report) => self.cart.discard_committed(report),
            None => 0,
        }
    }

    /// Overwrite a product's stock count (manual recount or restock).
    ///
    /// Catalog edits are authoritative: cart lines keep their add-time figures and are
    /// re-checked against the refreshed snapshot at commit.
    pub async fn adjust_stock(&mut self, product_id: ProductId, quantity: u32) -> StoreResult<Product> {
        let product = self
            .committer
            .catalog()
            .update(product_id, ProductPatch::quantity(quantity))
            .await?;
        tracing::info!(%product_id, quantity, "stock adjusted");

        if let Err(e) = self.load().await {
            tracing::warn!(error = %e, "reload after stock adjustment failed");
        }
        Ok(product)
    }

    pub fn stats(&self) -> SalesStats {
        SalesStats::compute(&self.sales, &self.cart, &Local, Local::now().date_naive())
    }

    pub fn inventory_stats(&self) -> InventoryStats {
        InventoryStats::from_products(self.snapshot.products())
    }

    pub fn alert_stats(&self) -> AlertStats {
        AlertStats::from_products(self.snapshot.products())
    }

    pub fn alerts(&self, filter: AlertFilter) -> Vec<&Product> {
        alerts(self.snapshot.products(), filter)
    }

    pub fn low_stock_banner(&self) -> Vec<&Product> {
        low_stock_banner(self.snapshot.products())
    }

    /// Ask the catalog directly for products at or below `threshold`.
    pub async fn reorder_list(&self, threshold: u32) -> Vec<Product> {
        self.committer.catalog().low_stock(threshold).await
    }

    pub async fn todays_sales(&self) -> Vec<SaleRecord> {
        self.committer.ledger().todays_sales().await
    }
}

fn warn_rejected(result: Result<CartUpdate, CartWarning>) -> Result<CartUpdate, CartWarning> {
    if let Err(warning) = &result {
        tracing::warn!(%warning, "cart change rejected");
    }
    result
}
