//! Core computation for the acquisitions ledger.
//!
//! This crate has no I/O. It validates transactions, applies them to cached
//! budget aggregates, recomputes those aggregates from the full history, and
//! rolls budgets up into group and expense class summaries.
//!
//! # Modules
//!
//! - `transaction` - Transactions and the encumbrance sub-ledger
//! - `fund` - Funds and allocation linkage
//! - `budget` - Budget aggregates, validation, incremental and full recompute
//! - `group` - Group fiscal-year summaries
//! - `expense_class` - Expense class links and totals
//! - `error` - Finance error kinds

pub mod budget;
pub mod error;
pub mod expense_class;
pub mod fund;
pub mod group;
pub mod transaction;

pub use acqledger_shared::types::{
    BudgetExpenseClassId, BudgetId, Currency, ExpenseClassId, FiscalYearId, FundId,
    GroupFundFiscalYearId, GroupId, LedgerId, Money, TransactionId,
};
pub use budget::{
    Budget, BudgetReconciliation, BudgetRecalculator, BudgetStatus, BudgetTotals, FieldDrift,
    TransactionContext, TransactionEffect, TransactionEffectApplier, TransactionValidator,
    initial_allocation_id,
};
pub use error::{Entity, ErrorKind, FinanceError, VERSION_CONFLICT, ValidationIssue};
pub use expense_class::{
    BudgetExpenseClass, ExpenseClass, ExpenseClassStatus, ExpenseClassTotal,
    ExpenseClassTotalsAggregator,
};
pub use fund::{Fund, FundStatus};
pub use group::{GroupFiscalYearAggregator, GroupFiscalYearSummary, GroupFundFiscalYear};
pub use transaction::{
    Encumbrance, EncumbranceStatus, FundRole, ReleaseOutcome, Transaction, TransactionSource,
    TransactionType,
};
