//! `stockroom-core`: domain building blocks shared by the catalog, ledger and
//! point-of-sale crates.
//!
//! This crate contains **pure domain** primitives (no IO, no HTTP, no storage).

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, StoreError, StoreResult};
pub use id::{CommitId, ProductId, SaleId};
pub use money::Money;
pub use value_object::ValueObject;
