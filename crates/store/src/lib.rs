//! Finance storage collaborator for Acqledger.
//!
//! The aggregation engine reads and writes records only through
//! [`FinanceStorage`]. Two implementations are provided:
//! - [`InMemoryStorage`] - ordered maps, used by tests and local runs
//! - [`HttpStorage`] - the finance storage REST service, via `reqwest`

pub mod collection;
pub mod error;
pub mod http;
pub mod memory;
pub mod query;
pub mod storage;

pub use collection::Collection;
pub use error::StoreError;
pub use http::HttpStorage;
pub use memory::InMemoryStorage;
pub use query::Query;
pub use storage::{FinanceStorage, StoreResult, budget_of_fund, by_budget, by_fiscal_year};
