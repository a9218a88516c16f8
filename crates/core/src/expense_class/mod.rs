//! Expense classes, their budget links and per-class totals.

pub mod aggregator;
pub mod types;

pub use aggregator::ExpenseClassTotalsAggregator;
pub use types::{BudgetExpenseClass, ExpenseClass, ExpenseClassStatus, ExpenseClassTotal};
