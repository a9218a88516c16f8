//! Finance operations for Acqledger.
//!
//! [`FinanceService`] orchestrates reads from the storage collaborator,
//! validation, incremental application and persistence. Independent reads
//! are issued concurrently and joined before computing; the first failure
//! is surfaced to the caller.

pub mod service;


pub use service::{
    BUDGET_HAS_TRANSACTIONS, EXPENSE_CLASS_IN_USE, ExpenseClassScope, FinanceResult,
    FinanceService,
};
