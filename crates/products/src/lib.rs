//! Products domain module.
//!
//! Product records, the catalog contract the record store fulfils, the
//! caller-held catalog snapshot, and read-only stock alert projections.

pub mod alerts;
pub mod catalog;
pub mod product;

pub use alerts::{AlertFilter, AlertStats, InventoryStats};
pub use catalog::{CatalogSnapshot, ProductCatalog};
pub use product::{
    DEFAULT_LOW_STOCK_THRESHOLD, Product, ProductDraft, ProductPatch, StockStatus,
};
