//! Budget data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use acqledger_shared::types::{BudgetId, Currency, FiscalYearId, FundId};

/// Budget status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BudgetStatus {
    /// Budget accepts transactions.
    #[default]
    Active,
    /// Budget only accepts transactions that reduce it.
    Inactive,
}

/// Cached aggregate fields of a budget.
///
/// The first eight fields are sums over the transaction history; the rest are
/// derived from them by [`BudgetTotals::refresh_derived`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetTotals {
    /// Earliest allocation received.
    pub initial_allocation: Decimal,
    /// Later allocations received.
    pub allocation_to: Decimal,
    /// Allocations sent away.
    pub allocation_from: Decimal,
    /// Signed sum of transfers.
    pub net_transfers: Decimal,
    /// Reserved against future spend.
    pub encumbered: Decimal,
    /// Pending payments.
    pub awaiting_payment: Decimal,
    /// Payments.
    pub expenditures: Decimal,
    /// Credits.
    pub credits: Decimal,
    /// `initialAllocation + allocationTo - allocationFrom`.
    pub allocated: Decimal,
    /// `allocated + netTransfers`.
    pub total_funding: Decimal,
    /// `encumbered + awaitingPayment + expenditures - credits`.
    pub unavailable: Decimal,
    /// `totalFunding - unavailable`.
    pub available: Decimal,
    /// `totalFunding - expenditures`.
    pub cash_balance: Decimal,
    /// Encumbered beyond the positive part of total funding.
    pub over_encumbrance: Decimal,
    /// Spent and awaiting payment beyond the positive part of total funding.
    pub over_expended: Decimal,
}

impl BudgetTotals {
    /// Recomputes every derived field from the summed fields.
    pub fn refresh_derived(&mut self) {
        self.allocated = self.initial_allocation + self.allocation_to - self.allocation_from;
        self.total_funding = self.allocated + self.net_transfers;
        self.unavailable = self.encumbered + self.awaiting_payment + self.expenditures - self.credits;
        self.available = self.total_funding - self.unavailable;
        self.cash_balance = self.total_funding - self.expenditures;

        let funding_floor = self.total_funding.max(Decimal::ZERO);
        self.over_encumbrance = (self.encumbered - funding_floor).max(Decimal::ZERO);
        self.over_expended =
            (self.expenditures + self.awaiting_payment - funding_floor).max(Decimal::ZERO);
    }

    /// Returns a copy with derived fields refreshed.
    #[must_use]
    pub fn with_derived(mut self) -> Self {
        self.refresh_derived();
        self
    }

    /// Returns a copy with every field rounded to `currency`.
    #[must_use]
    pub fn rounded(self, currency: Currency) -> Self {
        let mut out = self;
        for (_, value) in out.fields_mut() {
            *value = currency.round(*value);
        }
        out
    }

    /// Named view over every field, in declaration order.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, Decimal); 15] {
        [
            ("initialAllocation", self.initial_allocation),
            ("allocationTo", self.allocation_to),
            ("allocationFrom", self.allocation_from),
            ("netTransfers", self.net_transfers),
            ("encumbered", self.encumbered),
            ("awaitingPayment", self.awaiting_payment),
            ("expenditures", self.expenditures),
            ("credits", self.credits),
            ("allocated", self.allocated),
            ("totalFunding", self.total_funding),
            ("unavailable", self.unavailable),
            ("available", self.available),
            ("cashBalance", self.cash_balance),
            ("overEncumbrance", self.over_encumbrance),
            ("overExpended", self.over_expended),
        ]
    }

    fn fields_mut(&mut self) -> [(&'static str, &mut Decimal); 15] {
        [
            ("initialAllocation", &mut self.initial_allocation),
            ("allocationTo", &mut self.allocation_to),
            ("allocationFrom", &mut self.allocation_from),
            ("netTransfers", &mut self.net_transfers),
            ("encumbered", &mut self.encumbered),
            ("awaitingPayment", &mut self.awaiting_payment),
            ("expenditures", &mut self.expenditures),
            ("credits", &mut self.credits),
            ("allocated", &mut self.allocated),
            ("totalFunding", &mut self.total_funding),
            ("unavailable", &mut self.unavailable),
            ("available", &mut self.available),
            ("cashBalance", &mut self.cash_balance),
            ("overEncumbrance", &mut self.over_encumbrance),
            ("overExpended", &mut self.over_expended),
        ]
    }
}

/// A budget: one per fund and fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// Budget ID.
    pub id: BudgetId,
    /// Budget name.
    pub name: String,
    /// Owning fund.
    pub fund_id: FundId,
    /// Fiscal year.
    pub fiscal_year_id: FiscalYearId,
    /// Currency of every amount on this budget.
    pub currency: Currency,
    /// Status.
    #[serde(default)]
    pub budget_status: BudgetStatus,
    /// Allowable encumbrance, percent of `allocated`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowable_encumbrance: Option<Decimal>,
    /// Allowable expenditure, percent of `allocated`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowable_expenditure: Option<Decimal>,
    /// Cached aggregates.
    #[serde(flatten)]
    pub totals: BudgetTotals,
    /// Optimistic concurrency version.
    #[serde(default, rename = "_version")]
    pub version: i64,
}

impl Budget {
    /// Creates an active budget with all aggregates zero.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        fund_id: FundId,
        fiscal_year_id: FiscalYearId,
        currency: Currency,
    ) -> Self {
        Self {
            id: BudgetId::new(),
            name: name.into(),
            fund_id,
            fiscal_year_id,
            currency,
            budget_status: BudgetStatus::Active,
            allowable_encumbrance: None,
            allowable_expenditure: None,
            totals: BudgetTotals::default(),
            version: 0,
        }
    }

    /// Returns true if the budget is inactive.
    #[must_use]
    pub fn is_inactive(&self) -> bool {
        self.budget_status == BudgetStatus::Inactive
    }
}

/// Difference between a cached field and its recomputed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDrift {
    /// Field name.
    pub field: String,
    /// Value stored on the budget.
    pub cached: Decimal,
    /// Value recomputed from the transaction history.
    pub recomputed: Decimal,
}

/// Outcome of a full budget recalculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetReconciliation {
    /// Budget with recomputed aggregates.
    pub budget: Budget,
    /// Fields whose cached value disagreed.
    pub drift: Vec<FieldDrift>,
}

impl BudgetReconciliation {
    /// Returns true when the cached aggregates already matched.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.drift.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_derived_formulas() {
        let totals = BudgetTotals {
            initial_allocation: dec!(1500),
            allocation_to: dec!(100),
            allocation_from: dec!(200),
            net_transfers: dec!(54),
            encumbered: dec!(300),
            awaiting_payment: dec!(50),
            expenditures: dec!(400),
            credits: dec!(25),
            ..BudgetTotals::default()
        }
        .with_derived();

        assert_eq!(totals.allocated, dec!(1400));
        assert_eq!(totals.total_funding, dec!(1454));
        assert_eq!(totals.unavailable, dec!(725));
        assert_eq!(totals.available, dec!(729));
        assert_eq!(totals.cash_balance, dec!(1054));
        assert_eq!(totals.over_encumbrance, dec!(0));
        assert_eq!(totals.over_expended, dec!(0));
    }

    #[test]
    fn test_over_amounts_use_positive_funding_floor() {
        let totals = BudgetTotals {
            allocation_from: dec!(100),
            encumbered: dec!(30),
            awaiting_payment: dec!(5),
            expenditures: dec!(10),
            ..BudgetTotals::default()
        }
        .with_derived();

        assert_eq!(totals.total_funding, dec!(-100));
        assert_eq!(totals.over_encumbrance, dec!(30));
        assert_eq!(totals.over_expended, dec!(15));
    }

    #[test]
    fn test_rounded_rounds_every_field() {
        let totals = BudgetTotals {
            encumbered: dec!(10.835),
            credits: dec!(0.004),
            ..BudgetTotals::default()
        }
        .rounded(Currency::Usd);
        assert_eq!(totals.encumbered, dec!(10.84));
        assert_eq!(totals.credits, dec!(0.00));
    }

    #[test]
    fn test_budget_wire_format_flattens_totals() {
        let mut budget = Budget::new("HIST-FY26", FundId::new(), FiscalYearId::new(), Currency::Usd);
        budget.totals.encumbered = dec!(12.5);
        let json = serde_json::to_value(&budget).unwrap();
        assert_eq!(json["budgetStatus"], "Active");
        assert!(json.get("encumbered").is_some());
        assert!(json.get("totals").is_none());
        assert_eq!(json["_version"], 0);

        let back: Budget = serde_json::from_value(json).unwrap();
        assert_eq!(back, budget);
    }
}
