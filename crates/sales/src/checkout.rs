//! Sale commit orchestrator.
//!
//! Turns a cart into sale records and stock decrements, one line at a time:
//!
//! 1. Re-check the line against the caller's latest catalog snapshot
//! 2. Append the sale record to the ledger (unit price captured on the line)
//! 3. Write `add-time stock - sale quantity` back to the catalog
//!
//! The commit is **not atomic**. The first failing line stops the run; earlier lines
//! stay committed and the cart is left as it was, so re-submitting the same cart
//! sells the committed lines again. [`CommitReport`] records every line's outcome so
//! callers can drop committed lines (see [`Cart::discard_committed`]) before a retry.

use serde::Serialize;
use thiserror::Error;
use tracing::Instrument;

use stockroom_core::{CommitId, ProductId, StoreError};
use stockroom_products::{CatalogSnapshot, Product, ProductCatalog, ProductPatch};

use crate::cart::{Cart, CartLine};
use crate::sale::{NewSale, SaleLedger, SaleRecord};

/// Which write of a line failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitStage {
    Ledger,
    Catalog,
}

impl core::fmt::Display for CommitStage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CommitStage::Ledger => f.write_str("ledger"),
            CommitStage::Catalog => f.write_str("catalog"),
        }
    }
}

/// Sale commit failure. `line` is the 1-based position of the cart line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    #[error("cart is empty")]
    EmptyCart,

    /// Stock known to the caller no longer covers the line.
    #[error(
        "line {line}: insufficient stock for product {product_id} (requested {requested}, available {available})"
    )]
    InsufficientStock {
        line: usize,
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The record store refused or failed a write.
    ///
    /// When `stage` is `Catalog`, the sale record was already appended and is
    /// carried in `recorded_sale`.
    #[error("line {line}: {stage} write failed for product {product_id}: {source}")]
    Persistence {
        line: usize,
        product_id: ProductId,
        stage: CommitStage,
        #[source]
        source: StoreError,
        recorded_sale: Option<SaleRecord>,
    },
}

/// Outcome of one cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineStatus {
    /// Sale appended and stock written; `product` is the catalog's updated record.
    Committed { sale: SaleRecord, product: Product },
    Failed(CommitError),
    /// An earlier line failed, so this one was never tried.
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineOutcome {
    pub line: usize,
    pub product_id: ProductId,
    pub sale_quantity: u32,
    pub status: LineStatus,
}

/// Per-line result of a commit run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    commit_id: CommitId,
    lines: Vec<LineOutcome>,
}

impl CommitReport {
    pub fn commit_id(&self) -> CommitId {
        self.commit_id
    }

    pub fn lines(&self) -> &[LineOutcome] {
        &self.lines
    }

    pub fn is_success(&self) -> bool {
        self.lines
            .iter()
            .all(|l| matches!(l.status, LineStatus::Committed { .. }))
    }

    pub fn committed_sales(&self) -> Vec<&SaleRecord> {
        self.lines
            .iter()
            .filter_map(|l| match &l.status {
                LineStatus::Committed { sale, .. } => Some(sale),
                _ => None,
            })
            .collect()
    }

    pub fn committed_product_ids(&self) -> Vec<ProductId> {
        self.lines
            .iter()
            .filter(|l| matches!(l.status, LineStatus::Committed { .. }))
            .map(|l| l.product_id)
            .collect()
    }

    pub fn failure(&self) -> Option<&CommitError> {
        self.lines.iter().find_map(|l| match &l.status {
            LineStatus::Failed(e) => Some(e),
            _ => None,
        })
    }

    /// Collapse into the first failure, or every sale record on success.
    pub fn into_result(self) -> Result<Vec<SaleRecord>, CommitError> {
        let mut sales = Vec::with_capacity(self.lines.len());
        for outcome in self.lines {
            match outcome.status {
                LineStatus::Committed { sale, .. } => sales.push(sale),
                LineStatus::Failed(e) => return Err(e),
                LineStatus::NotAttempted => {}
            }
        }
        Ok(sales)
    }
}

impl Cart {
    /// Drop the lines a report shows as committed, returning how many were dropped.
    ///
    /// Opt-in helper for retrying a partially committed cart without selling the
    /// committed lines twice.
    pub fn discard_committed(&mut self, report: &CommitReport) -> usize {
        let committed = report.committed_product_ids();
        self.retain_lines(|line| !committed.contains(&line.product_id()))
    }
}

/// Commits carts against a catalog and a ledger.
#[derive(Debug, Clone)]
pub struct SaleCommitter<C, L> {
    catalog: C,
    ledger: L,
}

impl<C, L> SaleCommitter<C, L>
where
    C: ProductCatalog,
    L: SaleLedger,
{
    pub fn new(catalog: C, ledger: L) -> Self {
        Self { catalog, ledger }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Commit every line of `cart`, sequentially.
    ///
    /// Returns `Err(CommitError::EmptyCart)` without any I/O for an empty cart.
    /// Otherwise returns a report; the cart is cleared only if every line committed.
    pub async fn process_sale(
        &self,
        cart: &mut Cart,
        snapshot: &CatalogSnapshot,
    ) -> Result<CommitReport, CommitError> {
        if cart.is_empty() {
            tracing::warn!("refusing to process an empty cart");
            return Err(CommitError::EmptyCart);
        }

        let commit_id = CommitId::new();
        let span = tracing::info_span!("process_sale", %commit_id, lines = cart.len());
        let report = self
            .commit_lines(commit_id, cart.lines(), snapshot)
            .instrument(span)
            .await;

        if report.is_success() {
            cart.clear();
            tracing::info!(%commit_id, sales = report.lines.len(), "sale processed");
        } else if let Some(e) = report.failure() {
            tracing::error!(
                %commit_id,
                committed = report.committed_product_ids().len(),
                error = %e,
                "sale only partially processed; cart kept"
            );
        }

        Ok(report)
    }

    async fn commit_lines(
        &self,
        commit_id: CommitId,
        lines: &[CartLine],
        snapshot: &CatalogSnapshot,
    ) -> CommitReport {
        let mut outcomes = Vec::with_capacity(lines.len());
        let mut failed = false;

        for (idx, cart_line) in lines.iter().enumerate() {
            let line = idx + 1;
            let status = if failed {
                LineStatus::NotAttempted
            } else {
                match self.commit_line(line, cart_line, snapshot).await {
                    Ok((sale, product)) => LineStatus::Committed { sale, product },
                    Err(e) => {
                        failed = true;
                        LineStatus::Failed(e)
                    }
                }
            };

            outcomes.push(LineOutcome {
                line,
                product_id: cart_line.product_id(),
                sale_quantity: cart_line.sale_quantity(),
                status,
            });
        }

        CommitReport {
            commit_id,
            lines: outcomes,
        }
    }

    async fn commit_line(
        &self,
        line: usize,
        cart_line: &CartLine,
        snapshot: &CatalogSnapshot,
    ) -> Result<(SaleRecord, Product), CommitError> {
        let product_id = cart_line.product_id();
        let requested = cart_line.sale_quantity();

        // Remaining stock is computed from the add-time snapshot, not a fresh read.
        // The live snapshot only guards against stock that has visibly shrunk since.
        let live = snapshot.get(product_id).map_or(0, |p| p.quantity);
        let available = live.min(cart_line.product().quantity);
        let Some(updated_quantity) = cart_line
            .product()
            .quantity
            .checked_sub(requested)
            .filter(|_| requested <= live)
        else {
            tracing::warn!(line, %product_id, requested, available, "stock changed underneath the cart");
            return Err(CommitError::InsufficientStock {
                line,
                product_id,
                requested,
                available,
            });
        };

        let sale = self
            .ledger
            .create(NewSale {
                product_id,
                quantity: requested,
                price: cart_line.unit_price(),
            })
            .await
            .map_err(|source| CommitError::Persistence {
                line,
                product_id,
                stage: CommitStage::Ledger,
                source,
                recorded_sale: None,
            })?;

        let product = self
            .catalog
            .update(product_id, ProductPatch::quantity(updated_quantity))
            .await
            .map_err(|source| CommitError::Persistence {
                line,
                product_id,
                stage: CommitStage::Catalog,
                source,
                recorded_sale: Some(sale.clone()),
            })?;

        tracing::debug!(line, %product_id, sale_id = %sale.id, remaining = updated_quantity, "line committed");
        Ok((sale, product))
    }
}
