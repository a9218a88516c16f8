//! Expense class data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use acqledger_shared::types::{BudgetExpenseClassId, BudgetId, ExpenseClassId};

/// An expense class, e.g. "Print" or "Electronic".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseClass {
    /// Expense class ID.
    pub id: ExpenseClassId,
    /// Display name.
    pub name: String,
    /// Short code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Suffix appended to external account numbers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_account_number_ext: Option<String>,
}

impl ExpenseClass {
    /// Creates an expense class with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ExpenseClassId::new(),
            name: name.into(),
            code: None,
            external_account_number_ext: None,
        }
    }
}

/// Status of an expense class on a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExpenseClassStatus {
    /// New encumbrances may use the class.
    #[default]
    Active,
    /// The class is closed for new encumbrances.
    Inactive,
}

/// Link between a budget and an expense class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetExpenseClass {
    /// Link ID.
    pub id: BudgetExpenseClassId,
    /// Budget.
    pub budget_id: BudgetId,
    /// Expense class.
    pub expense_class_id: ExpenseClassId,
    /// Status.
    #[serde(default)]
    pub status: ExpenseClassStatus,
}

impl BudgetExpenseClass {
    /// Creates an active link.
    #[must_use]
    pub fn new(budget_id: BudgetId, expense_class_id: ExpenseClassId) -> Self {
        Self {
            id: BudgetExpenseClassId::new(),
            budget_id,
            expense_class_id,
            status: ExpenseClassStatus::Active,
        }
    }
}

/// Totals of one expense class within a budget or group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseClassTotal {
    /// Expense class ID.
    pub id: ExpenseClassId,
    /// Expense class name.
    pub expense_class_name: String,
    /// Sum of encumbrances.
    pub encumbered: Decimal,
    /// Sum of pending payments.
    pub awaiting_payment: Decimal,
    /// Payments minus credits.
    pub expended: Decimal,
    /// Share of the scope's expended grand total. `None` when that total is zero.
    pub percentage_expended: Option<Decimal>,
}
