//! Budgets: cached aggregates, admission rules, incremental application and
//! full recomputation.

pub mod effect;
pub mod recalculator;
pub mod types;
pub mod validation;

#[cfg(test)]
mod effect_props;

pub use effect::{TransactionEffect, TransactionEffectApplier};
pub use recalculator::{BudgetRecalculator, initial_allocation_id};
pub use types::{Budget, BudgetReconciliation, BudgetStatus, BudgetTotals, FieldDrift};
pub use validation::{TransactionContext, TransactionValidator};
