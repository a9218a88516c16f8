//! Incremental application of admitted transactions to a budget.
//!
//! Each transaction is translated into one or more [`TransactionEffect`]s for
//! the fund being updated. Every effect except a displaced initial allocation
//! touches exactly one summed field of [`BudgetTotals`]; the derived fields
//! are refreshed afterwards.

use rust_decimal::Decimal;

use acqledger_shared::types::FundId;

use crate::budget::recalculator::{initial_allocation_id, rounded_amount};
use crate::budget::types::{Budget, BudgetTotals};
use crate::budget::validation::TransactionValidator;
use crate::error::FinanceError;
use crate::transaction::{Encumbrance, FundRole, ReleaseOutcome, Transaction, TransactionType};

/// Effect of a transaction on one fund's budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionEffect {
    /// Allocation received or sent.
    Allocation {
        /// Side the fund plays.
        role: FundRole,
        /// True for the chronologically first allocation received by the fund.
        initial: bool,
        /// Transaction amount.
        amount: Decimal,
    },
    /// Transfer received or sent.
    Transfer {
        /// Side the fund plays.
        role: FundRole,
        /// Transaction amount.
        amount: Decimal,
    },
    /// Rollover transfer received or sent.
    RolloverTransfer {
        /// Side the fund plays.
        role: FundRole,
        /// Transaction amount.
        amount: Decimal,
    },
    /// Reservation by the from-fund.
    Encumbrance {
        /// Transaction amount.
        amount: Decimal,
    },
    /// Pending payment, possibly negative.
    PendingPayment {
        /// Transaction amount.
        amount: Decimal,
    },
    /// Confirmed payment.
    Payment {
        /// Transaction amount.
        amount: Decimal,
    },
    /// Credit.
    Credit {
        /// Transaction amount.
        amount: Decimal,
    },
    /// A backdated allocation took over as the initial one; the previous
    /// initial allocation becomes an ordinary received allocation.
    InitialAllocationDisplaced {
        /// Amount of the previous initial allocation.
        amount: Decimal,
    },
}

impl TransactionEffect {
    /// Effects of `tx` on the budget of `fund_id`.
    ///
    /// `initial_allocation` marks a received ALLOCATION as the fund's first one.
    /// Returns an empty list when the transaction does not touch the fund.
    /// The amount is rounded to the transaction currency.
    #[must_use]
    pub fn for_fund(tx: &Transaction, fund_id: FundId, initial_allocation: bool) -> Vec<Self> {
        let amount = rounded_amount(tx);
        let is_from = tx.has_role(fund_id, FundRole::From);
        let is_to = tx.has_role(fund_id, FundRole::To);
        let roles = [(is_from, FundRole::From), (is_to, FundRole::To)]
            .into_iter()
            .filter_map(|(present, role)| present.then_some(role));

        match tx.transaction_type {
            TransactionType::Allocation => roles
                .map(|role| Self::Allocation {
                    role,
                    initial: role == FundRole::To && initial_allocation,
                    amount,
                })
                .collect(),
            TransactionType::Transfer => roles.map(|role| Self::Transfer { role, amount }).collect(),
            TransactionType::RolloverTransfer => roles
                .map(|role| Self::RolloverTransfer { role, amount })
                .collect(),
            TransactionType::Encumbrance if is_from => vec![Self::Encumbrance { amount }],
            TransactionType::Encumbrance => Vec::new(),
            TransactionType::PendingPayment if is_from || is_to => {
                vec![Self::PendingPayment { amount }]
            }
            TransactionType::Payment if is_from || is_to => vec![Self::Payment { amount }],
            TransactionType::Credit if is_from || is_to => vec![Self::Credit { amount }],
            TransactionType::PendingPayment | TransactionType::Payment | TransactionType::Credit => {
                Vec::new()
            }
        }
    }

    /// Adds this effect to the summed fields of `totals`.
    ///
    /// Derived fields are left stale; call [`BudgetTotals::refresh_derived`].
    pub fn accumulate(self, totals: &mut BudgetTotals) {
        match self {
            Self::Allocation {
                role: FundRole::To,
                initial: true,
                amount,
            } => totals.initial_allocation += amount,
            Self::Allocation {
                role: FundRole::To,
                amount,
                ..
            } => totals.allocation_to += amount,
            Self::Allocation {
                role: FundRole::From,
                amount,
                ..
            } => totals.allocation_from += amount,
            Self::Transfer { role, amount } | Self::RolloverTransfer { role, amount } => {
                totals.net_transfers += signed(role, amount);
            }
            Self::Encumbrance { amount } => totals.encumbered += amount,
            Self::PendingPayment { amount } => totals.awaiting_payment += amount,
            Self::Payment { amount } => totals.expenditures += amount,
            Self::Credit { amount } => totals.credits += amount,
            Self::InitialAllocationDisplaced { amount } => {
                totals.initial_allocation -= amount;
                totals.allocation_to += amount;
            }
        }
    }
}

fn signed(role: FundRole, amount: Decimal) -> Decimal {
    match role {
        FundRole::To => amount,
        FundRole::From => -amount,
    }
}

/// Applies admitted transactions to cached budget aggregates.
pub struct TransactionEffectApplier;

impl TransactionEffectApplier {
    /// Applies `tx` to `budget` in place.
    ///
    /// Derived fields are refreshed and every field is rounded to the budget
    /// currency. Transactions that do not touch the budget's fund leave it
    /// unchanged.
    pub fn apply(budget: &mut Budget, tx: &Transaction, initial_allocation: bool) {
        let effects = TransactionEffect::for_fund(tx, budget.fund_id, initial_allocation);
        Self::apply_effects(budget, effects);
    }

    /// Applies `tx` to `budget` given the transactions already recorded for it.
    ///
    /// Works out whether `tx` is the fund's initial allocation. When `tx` is
    /// dated before the current initial allocation, that allocation is moved
    /// from `initialAllocation` to `allocationTo` in the same update.
    pub fn apply_with_history(budget: &mut Budget, tx: &Transaction, recorded: &[Transaction]) {
        let fund = budget.fund_id;
        let earlier: Vec<&Transaction> = recorded
            .iter()
            .filter(|t| t.id != tx.id && t.fiscal_year_id == tx.fiscal_year_id)
            .collect();
        let current_initial = initial_allocation_id(earlier.iter().copied(), fund);
        let initial =
            initial_allocation_id(earlier.iter().copied().chain([tx]), fund) == Some(tx.id);

        let mut effects = TransactionEffect::for_fund(tx, fund, initial);
        if initial {
            let displaced = current_initial
                .and_then(|id| earlier.iter().find(|t| t.id == id))
                .map(|t| TransactionEffect::InitialAllocationDisplaced {
                    amount: rounded_amount(t),
                });
            effects.extend(displaced);
        }
        Self::apply_effects(budget, effects);
    }

    fn apply_effects(budget: &mut Budget, effects: Vec<TransactionEffect>) {
        if effects.is_empty() {
            return;
        }
        for effect in effects {
            effect.accumulate(&mut budget.totals);
        }
        budget.totals.refresh_derived();
        budget.totals = budget.totals.rounded(budget.currency);
    }

    /// Releases an encumbrance. Releasing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `FinanceError::TransactionTypeMismatch` for non-ENCUMBRANCE transactions.
    pub fn release(tx: &mut Transaction) -> Result<ReleaseOutcome, FinanceError> {
        TransactionValidator::validate_encumbrance_operation(tx)?;
        Ok(sub_ledger(tx).release())
    }

    /// Moves `amount` of an encumbrance from expended back to awaiting payment.
    ///
    /// Only the transaction's own sub-ledger changes.
    ///
    /// # Errors
    ///
    /// Returns `FinanceError::TransactionTypeMismatch` for non-ENCUMBRANCE transactions.
    pub fn move_to_awaiting_payment(
        tx: &mut Transaction,
        amount: Decimal,
    ) -> Result<(), FinanceError> {
        TransactionValidator::validate_encumbrance_operation(tx)?;
        let currency = tx.currency;
        sub_ledger(tx).move_to_awaiting_payment(amount, currency);
        Ok(())
    }
}

fn sub_ledger(tx: &mut Transaction) -> &mut Encumbrance {
    let amount = tx.amount;
    tx.encumbrance.get_or_insert_with(|| Encumbrance::new(amount))
}
