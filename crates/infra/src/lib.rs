//! Infrastructure layer: record store adapters, in-memory backends, config.

pub mod catalog;
pub mod config;
pub mod ledger;
pub mod memory;
pub mod records;


pub use catalog::RemoteProductCatalog;
pub use config::{Backend, ConfigError, PosConfig, RemoteConfig};
pub use ledger::RemoteSaleLedger;
pub use memory::{InMemoryProductCatalog, InMemorySaleLedger};
pub use records::{HttpRecordClient, RecordClient};
