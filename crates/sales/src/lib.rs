//! Sales domain module.
//!
//! The cart reservation engine, the sale commit orchestrator, the sale ledger
//! contract and the session that ties them to a catalog.

pub mod cart;
pub mod checkout;
pub mod sale;
pub mod session;
pub mod stats;

pub use cart::{Cart, CartLine, CartTotals, CartUpdate, CartWarning};
pub use checkout::{CommitError, CommitReport, CommitStage, LineOutcome, LineStatus, SaleCommitter};
pub use sale::{NewSale, SaleLedger, SaleRecord, day_bounds};
pub use session::SalesSession;
pub use stats::SalesStats;
