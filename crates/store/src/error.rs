//! Storage error types.

use thiserror::Error;

use acqledger_core::error::{Entity, FinanceError, VERSION_CONFLICT};

use crate::collection::Collection;

/// Storage collaborator errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with this id.
    #[error("{collection} record not found: {id}")]
    NotFound {
        /// Collection searched.
        collection: Collection,
        /// Requested id.
        id: String,
    },

    /// Update carried a stale `_version`.
    #[error("{collection} record {id} was modified concurrently")]
    VersionConflict {
        /// Collection updated.
        collection: Collection,
        /// Record id.
        id: String,
    },

    /// Query string could not be parsed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Storage service answered with an unexpected status.
    #[error("storage service returned {status} for {url}: {body}")]
    Status {
        /// HTTP status.
        status: u16,
        /// Request URL.
        url: String,
        /// Response body, if readable.
        body: String,
    },

    /// Request could not be sent or the response not read.
    #[error("storage transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected record shape.
    #[error("malformed storage response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Storage is unavailable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(collection: Collection, id: impl ToString) -> Self {
        Self::NotFound {
            collection,
            id: id.to_string(),
        }
    }

    /// Create a version conflict error.
    #[must_use]
    pub fn version_conflict(collection: Collection, id: impl ToString) -> Self {
        Self::VersionConflict {
            collection,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for FinanceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => Self::NotFound {
                entity: collection.entity(),
                id,
            },
            StoreError::VersionConflict { .. } => Self::conflict(VERSION_CONFLICT, err.to_string()),
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl Collection {
    /// Entity reported when a record of this collection is missing.
    #[must_use]
    pub const fn entity(self) -> Entity {
        match self {
            Self::Transactions => Entity::Transaction,
            Self::Budgets => Entity::Budget,
            Self::Funds => Entity::Fund,
            Self::ExpenseClasses => Entity::ExpenseClass,
            Self::BudgetExpenseClasses => Entity::BudgetExpenseClass,
            Self::GroupFundFiscalYears => Entity::Record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acqledger_core::error::ErrorKind;

    #[test]
    fn test_maps_onto_finance_errors() {
        let err: FinanceError = StoreError::not_found(Collection::Budgets, "b-1").into();
        assert_eq!(err.error_code(), "BUDGET_NOT_FOUND");

        let err: FinanceError = StoreError::version_conflict(Collection::Budgets, "b-1").into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.is_retryable());

        let err: FinanceError = StoreError::Unavailable("connection reset".into()).into();
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(err.to_string(), "Upstream failure: storage unavailable: connection reset");
    }
}
