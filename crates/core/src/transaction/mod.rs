//! Financial transactions and the encumbrance sub-ledger.
//!
//! Transactions are immutable once created, except for the two controlled
//! encumbrance mutations: release and move-to-awaiting-payment.

pub mod types;

pub use types::{
    Encumbrance, EncumbranceStatus, FundRole, ReleaseOutcome, Transaction, TransactionSource,
    TransactionType,
};
