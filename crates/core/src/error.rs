//! Finance error types.
//!
//! Every rejection the engine can produce maps onto one [`ErrorKind`]. Validation
//! problems are collected into a list of [`ValidationIssue`]s so independent
//! violations (e.g. both allowable limits) are reported together.

use rust_decimal::Decimal;
use thiserror::Error;

use acqledger_shared::AppError;
use acqledger_shared::types::{BudgetId, Currency, ExpenseClassId, FundId};

use crate::transaction::TransactionType;

/// Coarse classification of a [`FinanceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected by a business rule before any write.
    Validation,
    /// A referenced record does not exist.
    NotFound,
    /// The operation conflicts with existing records.
    Conflict,
    /// An operation was attempted on the wrong transaction type.
    TransactionTypeMismatch,
    /// The storage collaborator failed.
    Upstream,
}

/// A single business-rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    /// Sending and receiving fund linkage does not permit the movement.
    #[error("Fund {from_fund_id} is not allowed to move money to fund {to_fund_id}")]
    AllocationTransferMismatch {
        /// Sending fund.
        from_fund_id: FundId,
        /// Receiving fund.
        to_fund_id: FundId,
    },

    /// A fund id required by the transaction type is missing.
    #[error("{transaction_type} transaction is missing its {role} fund id")]
    MissingFundId {
        /// Type of the offending transaction.
        transaction_type: TransactionType,
        /// Which side is missing ("from", "to" or "from or to").
        role: &'static str,
    },

    /// Amount must not be negative for this transaction type.
    #[error("{0} amount cannot be negative")]
    NegativeAmount(TransactionType),

    /// The affected budget is inactive.
    #[error("Budget {0} is inactive")]
    BudgetIsInactive(BudgetId),

    /// Transaction currency differs from the budget currency.
    #[error("Currency mismatch for budget {budget_id}: expected {expected}, got {got}")]
    CurrencyMismatch {
        /// Affected budget.
        budget_id: BudgetId,
        /// Budget currency.
        expected: Currency,
        /// Transaction currency.
        got: Currency,
    },

    /// The expense class is inactive on the budget.
    #[error("Expense class {0} is inactive for this budget")]
    InactiveExpenseClass(ExpenseClassId),

    /// Projected commitments exceed the allowable encumbrance.
    #[error("Allowable encumbrance limit exceeded for budget {budget_id}: {projected} > {limit}")]
    AllowableEncumbranceLimitExceeded {
        /// Affected budget.
        budget_id: BudgetId,
        /// `allocated * allowableEncumbrance / 100`.
        limit: Decimal,
        /// Projected committed amount.
        projected: Decimal,
    },

    /// Projected spend exceeds the allowable expenditure.
    #[error("Allowable expenditure limit exceeded for budget {budget_id}: {projected} > {limit}")]
    AllowableExpenditureLimitExceeded {
        /// Affected budget.
        budget_id: BudgetId,
        /// `allocated * allowableExpenditure / 100`.
        limit: Decimal,
        /// Projected spent amount.
        projected: Decimal,
    },
}

impl ValidationIssue {
    /// Returns the stable error code of this violation.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllocationTransferMismatch { .. } => "ALLOCATION_TRANSFER_MISMATCH",
            Self::MissingFundId { .. } => "MISSING_FUND_ID",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::BudgetIsInactive(_) => "BUDGET_IS_INACTIVE",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::InactiveExpenseClass(_) => "INACTIVE_EXPENSE_CLASS",
            Self::AllowableEncumbranceLimitExceeded { .. } => {
                "ALLOWABLE_ENCUMBRANCE_LIMIT_EXCEEDED"
            }
            Self::AllowableExpenditureLimitExceeded { .. } => {
                "ALLOWABLE_EXPENDITURE_LIMIT_EXCEEDED"
            }
        }
    }
}

/// Kind of record referenced by a [`FinanceError::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// A budget.
    Budget,
    /// A fund.
    Fund,
    /// A transaction.
    Transaction,
    /// An expense class.
    ExpenseClass,
    /// A budget/expense-class link.
    BudgetExpenseClass,
    /// Any other collaborator record.
    Record,
}

impl Entity {
    /// Stable error code for a missing record of this kind.
    #[must_use]
    pub const fn not_found_code(self) -> &'static str {
        match self {
            Self::Budget => "BUDGET_NOT_FOUND",
            Self::Fund => "FUND_NOT_FOUND",
            Self::Transaction => "TRANSACTION_NOT_FOUND",
            Self::ExpenseClass => "EXPENSE_CLASS_NOT_FOUND",
            Self::BudgetExpenseClass => "BUDGET_EXPENSE_CLASS_NOT_FOUND",
            Self::Record => "NOT_FOUND",
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Budget => "Budget",
            Self::Fund => "Fund",
            Self::Transaction => "Transaction",
            Self::ExpenseClass => "Expense class",
            Self::BudgetExpenseClass => "Budget expense class",
            Self::Record => "Record",
        };
        f.write_str(name)
    }
}

/// Errors produced by the aggregation engine.
#[derive(Debug, Error)]
pub enum FinanceError {
    /// One or more business rules rejected the operation.
    #[error("{}", join_issues(.0))]
    Validation(Vec<ValidationIssue>),

    /// A referenced record is absent.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of the missing record.
        entity: Entity,
        /// Identifier or query that matched nothing.
        id: String,
    },

    /// The operation conflicts with existing records.
    #[error("{message}")]
    Conflict {
        /// Stable error code.
        code: &'static str,
        /// Human readable message.
        message: String,
    },

    /// An operation was attempted on the wrong transaction type.
    #[error("{} expected", .expected.label())]
    TransactionTypeMismatch {
        /// Required type.
        expected: TransactionType,
        /// Actual type.
        actual: TransactionType,
    },

    /// Storage collaborator failure, propagated as-is.
    #[error("Upstream failure: {0}")]
    Upstream(String),
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl FinanceError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(entity: Entity, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::TransactionTypeMismatch { .. } => ErrorKind::TransactionTypeMismatch,
            Self::Upstream(_) => ErrorKind::Upstream,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(issues) => issues
                .first()
                .map_or("VALIDATION_ERROR", ValidationIssue::code),
            Self::NotFound { entity, .. } => entity.not_found_code(),
            Self::Conflict { code, .. } => *code,
            Self::TransactionTypeMismatch { .. } => "TRANSACTION_TYPE_MISMATCH",
            Self::Upstream(_) => "UPSTREAM_FAILURE",
        }
    }

    /// Returns every validation code carried by this error.
    #[must_use]
    pub fn issue_codes(&self) -> Vec<&'static str> {
        match self {
            Self::Validation(issues) => issues.iter().map(ValidationIssue::code).collect(),
            _ => Vec::new(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::TransactionTypeMismatch { .. } => 422,
            Self::NotFound { .. } => 404,
            Self::Conflict { .. } => 409,
            Self::Upstream(_) => 500,
        }
    }

    /// Returns true if retrying the same request may succeed.
    ///
    /// Validation and type-mismatch errors are never retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upstream(_) => true,
            Self::Conflict { code, .. } => *code == VERSION_CONFLICT,
            _ => false,
        }
    }
}

/// Conflict code for a stale optimistic-concurrency version.
pub const VERSION_CONFLICT: &str = "VERSION_CONFLICT";

impl From<FinanceError> for AppError {
    fn from(err: FinanceError) -> Self {
        let code = err.error_code();
        match err {
            FinanceError::Validation(_) | FinanceError::TransactionTypeMismatch { .. } => {
                Self::Validation {
                    code,
                    message: err.to_string(),
                }
            }
            FinanceError::NotFound { .. } => Self::NotFound {
                code,
                message: err.to_string(),
            },
            FinanceError::Conflict { .. } => Self::Conflict {
                code,
                message: err.to_string(),
            },
            FinanceError::Upstream(message) => Self::Upstream(message),
        }
    }
}
