//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `FundId` where a `BudgetId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(TransactionId, "Unique identifier for a financial transaction.");
typed_id!(BudgetId, "Unique identifier for a budget.");
typed_id!(FundId, "Unique identifier for a fund.");
typed_id!(LedgerId, "Unique identifier for a ledger.");
typed_id!(FiscalYearId, "Unique identifier for a fiscal year.");
typed_id!(GroupId, "Unique identifier for a fund group.");
typed_id!(ExpenseClassId, "Unique identifier for an expense class.");
typed_id!(
    GroupFundFiscalYearId,
    "Unique identifier for a group/fund/fiscal-year link."
);
typed_id!(
    BudgetExpenseClassId,
    "Unique identifier for a budget/expense-class link."
);
