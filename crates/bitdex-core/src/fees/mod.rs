//! Fee estimates from an external service, used in place of the node's
//! estimator while they are fresh.

mod mempoolspace;
mod provider;
mod table;

pub use mempoolspace::{FeeProviderConfig, FeeSource};
pub use provider::AlternativeFeeProvider;
pub use table::{FeeEntry, FeeTable, MAX_TABLE_AGE};
