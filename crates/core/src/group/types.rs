//! Group data types.

use serde::{Deserialize, Serialize};

use acqledger_shared::types::{BudgetId, FiscalYearId, FundId, GroupFundFiscalYearId, GroupId};

use crate::budget::BudgetTotals;

/// Membership of a fund's budget in a group for one fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupFundFiscalYear {
    /// Link ID.
    pub id: GroupFundFiscalYearId,
    /// Group.
    pub group_id: GroupId,
    /// Fund.
    pub fund_id: FundId,
    /// Fiscal year.
    pub fiscal_year_id: FiscalYearId,
    /// The fund's budget, once one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_id: Option<BudgetId>,
}

impl GroupFundFiscalYear {
    /// Creates a link without a budget.
    #[must_use]
    pub fn new(group_id: GroupId, fund_id: FundId, fiscal_year_id: FiscalYearId) -> Self {
        Self {
            id: GroupFundFiscalYearId::new(),
            group_id,
            fund_id,
            fiscal_year_id,
            budget_id: None,
        }
    }

    /// Sets the budget.
    #[must_use]
    pub fn with_budget(mut self, budget_id: BudgetId) -> Self {
        self.budget_id = Some(budget_id);
        self
    }
}

/// Financial summary of a group for one fiscal year. Computed on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupFiscalYearSummary {
    /// Group.
    pub group_id: GroupId,
    /// Fiscal year.
    pub fiscal_year_id: FiscalYearId,
    /// Reduced aggregates of every budget in the group.
    #[serde(flatten)]
    pub totals: BudgetTotals,
}
