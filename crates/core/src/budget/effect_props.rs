//! Property-based tests: incremental application against full recomputation.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use acqledger_shared::types::{Currency, FiscalYearId, FundId};

use super::effect::TransactionEffectApplier;
use super::recalculator::BudgetRecalculator;
use super::types::Budget;
use crate::transaction::{Encumbrance, Transaction, TransactionType};

/// Strategy for a non-negative amount with two decimals.
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for a non-negative amount with up to four decimals.
fn fine_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64, 0u32..=4).prop_map(|(units, scale)| Decimal::new(units, scale))
}

fn type_strategy() -> impl Strategy<Value = TransactionType> {
    proptest::sample::select(TransactionType::ALL.to_vec())
}

/// Which side of the transaction the budget's fund takes.
#[derive(Debug, Clone, Copy)]
enum Side {
    From,
    To,
    Unrelated,
}

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![
        4 => Just(Side::From),
        4 => Just(Side::To),
        1 => Just(Side::Unrelated),
    ]
}

type Step = (TransactionType, Decimal, Side, bool, i64);

/// Each step is dated `offset` seconds after a fixed epoch, so steps arrive
/// out of `createdDate` order and may share a timestamp.
fn build_history(fund: FundId, fy: FiscalYearId, steps: &[Step]) -> Vec<Transaction> {
    let epoch = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_else(Utc::now);
    steps
        .iter()
        .map(|&(kind, amount, side, negate, offset)| {
            let amount = if kind == TransactionType::PendingPayment && negate {
                -amount
            } else {
                amount
            };
            let other = FundId::new();
            let tx = Transaction::new(kind, amount, Currency::Usd, fy)
                .created_at(epoch + Duration::seconds(offset));
            match side {
                Side::From => tx.from_fund(fund).to_fund(other),
                Side::To => tx.from_fund(other).to_fund(fund),
                Side::Unrelated => tx.from_fund(other).to_fund(FundId::new()),
            }
        })
        .collect()
}

fn history_strategy() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(
        (
            type_strategy(),
            fine_amount(),
            side_strategy(),
            any::<bool>(),
            0i64..30,
        ),
        0..40,
    )
}

/// Applies `history` in arrival order, each transaction seeing the ones before it.
fn apply_all(budget: &Budget, history: &[Transaction]) -> Budget {
    let mut budget = budget.clone();
    for (i, tx) in history.iter().enumerate() {
        TransactionEffectApplier::apply_with_history(&mut budget, tx, &history[..i]);
    }
    budget
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Running totals built one transaction at a time equal the full recompute.
    #[test]
    fn prop_applier_agrees_with_recalculator(steps in history_strategy()) {
        let budget = Budget::new("P", FundId::new(), FiscalYearId::new(), Currency::Usd);
        let history = build_history(budget.fund_id, budget.fiscal_year_id, &steps);

        let incremental = apply_all(&budget, &history);
        let recomputed = BudgetRecalculator::recompute(&budget, &history);

        prop_assert_eq!(incremental.totals, recomputed);
        prop_assert!(BudgetRecalculator::drift(&incremental.totals, &recomputed).is_empty());
    }

    /// Recomputing twice yields identical aggregates.
    #[test]
    fn prop_recompute_is_idempotent(steps in history_strategy()) {
        let budget = Budget::new("P", FundId::new(), FiscalYearId::new(), Currency::Usd);
        let history = build_history(budget.fund_id, budget.fiscal_year_id, &steps);

        let first = BudgetRecalculator::reconcile(&budget, &history);
        let second = BudgetRecalculator::reconcile(&first.budget, &history);

        prop_assert_eq!(first.budget.totals, second.budget.totals);
        prop_assert!(second.is_consistent());
    }

    /// `available + unavailable == totalFunding` and `totalFunding == allocated + netTransfers`.
    #[test]
    fn prop_conservation(steps in history_strategy()) {
        let budget = Budget::new("P", FundId::new(), FiscalYearId::new(), Currency::Usd);
        let history = build_history(budget.fund_id, budget.fiscal_year_id, &steps);
        let totals = BudgetRecalculator::recompute(&budget, &history);

        prop_assert_eq!(totals.available + totals.unavailable, totals.total_funding);
        prop_assert_eq!(totals.total_funding, totals.allocated + totals.net_transfers);
        prop_assert!(totals.over_encumbrance >= Decimal::ZERO);
        prop_assert!(totals.over_expended >= Decimal::ZERO);
    }

    /// Moving money to awaiting payment only changes the split.
    #[test]
    fn prop_move_to_awaiting_payment_conserves(
        awaiting in amount(),
        expended in amount(),
        moved in fine_amount(),
    ) {
        let mut tx = Transaction::new(
            TransactionType::Encumbrance,
            awaiting + expended,
            Currency::Usd,
            FiscalYearId::new(),
        );
        tx.encumbrance = Some(Encumbrance {
            amount_awaiting_payment: awaiting,
            amount_expended: expended,
            ..Encumbrance::new(awaiting + expended)
        });

        TransactionEffectApplier::move_to_awaiting_payment(&mut tx, moved).unwrap();

        let sub = tx.encumbrance.unwrap();
        prop_assert_eq!(sub.amount_awaiting_payment + sub.amount_expended, awaiting + expended);
        prop_assert_eq!(sub.amount_awaiting_payment, awaiting + Currency::Usd.round(moved));
    }
}
