//! Fund groups and their per fiscal year summaries.

pub mod aggregator;
pub mod types;

pub use aggregator::GroupFiscalYearAggregator;
pub use types::{GroupFiscalYearSummary, GroupFundFiscalYear};
