//! Full recomputation of budget aggregates from the transaction history.

use rust_decimal::Decimal;

use acqledger_shared::types::{FundId, Money, TransactionId};

use crate::budget::types::{Budget, BudgetReconciliation, BudgetTotals, FieldDrift};
use crate::transaction::{Transaction, TransactionType};

/// Id of the chronologically first ALLOCATION received by `fund_id`.
///
/// Ties on `createdDate` are broken by transaction id.
#[must_use]
pub fn initial_allocation_id<'a, I>(transactions: I, fund_id: FundId) -> Option<TransactionId>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions
        .into_iter()
        .filter(|tx| tx.transaction_type == TransactionType::Allocation)
        .filter(|tx| tx.to_fund_id == Some(fund_id))
        .min_by_key(|tx| tx.chronological_key())
        .map(|tx| tx.id)
}

/// Amount of `tx` at its currency's precision.
pub(crate) fn rounded_amount(tx: &Transaction) -> Decimal {
    tx.currency.round(tx.amount)
}

/// Recomputes budget aggregates from scratch.
pub struct BudgetRecalculator;

impl BudgetRecalculator {
    /// Recomputes every aggregate of `budget` from `transactions`.
    ///
    /// Transactions of other fiscal years or funds are ignored. Each amount is
    /// rounded to its currency before summing, like the incremental path.
    #[must_use]
    pub fn recompute(budget: &Budget, transactions: &[Transaction]) -> BudgetTotals {
        let fund = budget.fund_id;
        let in_scope: Vec<&Transaction> = transactions
            .iter()
            .filter(|tx| tx.fiscal_year_id == budget.fiscal_year_id && tx.touches(fund))
            .collect();

        let of_type = |kind: TransactionType| {
            in_scope
                .iter()
                .copied()
                .filter(move |tx| tx.transaction_type == kind)
        };
        let sum = |amounts: Vec<Decimal>| Money::sum(amounts, budget.currency).amount;

        let initial_id = initial_allocation_id(in_scope.iter().copied(), fund);
        let received: Vec<&Transaction> = of_type(TransactionType::Allocation)
            .filter(|tx| tx.to_fund_id == Some(fund))
            .collect();

        let initial_allocation = sum(received
            .iter()
            .filter(|tx| Some(tx.id) == initial_id)
            .map(|tx| rounded_amount(tx))
            .collect());
        let allocation_to = sum(received
            .iter()
            .filter(|tx| Some(tx.id) != initial_id)
            .map(|tx| rounded_amount(tx))
            .collect());
        let allocation_from = sum(of_type(TransactionType::Allocation)
            .filter(|tx| tx.from_fund_id == Some(fund))
            .map(|tx| rounded_amount(tx))
            .collect());

        let net_transfers = sum(of_type(TransactionType::Transfer)
            .chain(of_type(TransactionType::RolloverTransfer))
            .flat_map(|tx| {
                let inflow = (tx.to_fund_id == Some(fund)).then_some(rounded_amount(tx));
                let outflow = (tx.from_fund_id == Some(fund)).then_some(-rounded_amount(tx));
                inflow.into_iter().chain(outflow)
            })
            .collect());

        let encumbered = sum(of_type(TransactionType::Encumbrance)
            .filter(|tx| tx.from_fund_id == Some(fund))
            .map(|tx| rounded_amount(tx))
            .collect());
        let amounts = |kind| sum(of_type(kind).map(|tx| rounded_amount(tx)).collect());

        BudgetTotals {
            initial_allocation,
            allocation_to,
            allocation_from,
            net_transfers,
            encumbered,
            awaiting_payment: amounts(TransactionType::PendingPayment),
            expenditures: amounts(TransactionType::Payment),
            credits: amounts(TransactionType::Credit),
            ..BudgetTotals::default()
        }
        .with_derived()
        .rounded(budget.currency)
    }

    /// Fields whose cached value differs from `recomputed`.
    #[must_use]
    pub fn drift(cached: &BudgetTotals, recomputed: &BudgetTotals) -> Vec<FieldDrift> {
        cached
            .fields()
            .into_iter()
            .zip(recomputed.fields())
            .filter(|((_, old), (_, new))| old != new)
            .map(|((field, cached), (_, recomputed))| FieldDrift {
                field: field.to_string(),
                cached,
                recomputed,
            })
            .collect()
    }

    /// Recomputes `budget` and reports every field that had drifted.
    #[must_use]
    pub fn reconcile(budget: &Budget, transactions: &[Transaction]) -> BudgetReconciliation {
        let recomputed = Self::recompute(budget, transactions);
        let drift = Self::drift(&budget.totals, &recomputed);
        let mut budget = budget.clone();
        budget.totals = recomputed;
        BudgetReconciliation { budget, drift }
    }
}
