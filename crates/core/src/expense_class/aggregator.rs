//! Per expense class breakdown of a budget's or a group's transactions.

use std::collections::HashMap;

use rust_decimal::Decimal;

use acqledger_shared::types::{Currency, ExpenseClassId, Money};

use super::types::{ExpenseClass, ExpenseClassTotal};
use crate::transaction::{Transaction, TransactionType};

/// Buckets transactions by expense class.
pub struct ExpenseClassTotalsAggregator;

impl ExpenseClassTotalsAggregator {
    /// Totals for every class in `expense_classes`, in input order.
    ///
    /// The expended grand total spans every transaction, including those
    /// without an expense class. A class with no transactions reports zero
    /// amounts and a percentage of zero.
    #[must_use]
    pub fn totals(
        expense_classes: &[ExpenseClass],
        transactions: &[Transaction],
        currency: Currency,
    ) -> Vec<ExpenseClassTotal> {
        let grand_total = currency.round(net_expended(transactions.iter()));

        let mut buckets: HashMap<ExpenseClassId, Vec<&Transaction>> = HashMap::new();
        for tx in transactions {
            if let Some(id) = tx.expense_class_id {
                buckets.entry(id).or_default().push(tx);
            }
        }

        expense_classes
            .iter()
            .map(|class| match buckets.get(&class.id) {
                Some(bucket) => {
                    let sum_of = |kind: TransactionType| {
                        let amounts = bucket
                            .iter()
                            .filter(|tx| tx.transaction_type == kind)
                            .map(|tx| tx.amount);
                        Money::sum(amounts, currency).rounded().amount
                    };
                    let expended = currency.round(net_expended(bucket.iter().copied()));
                    ExpenseClassTotal {
                        id: class.id,
                        expense_class_name: class.name.clone(),
                        encumbered: sum_of(TransactionType::Encumbrance),
                        awaiting_payment: sum_of(TransactionType::PendingPayment),
                        expended,
                        percentage_expended: Money::percentage(expended, grand_total),
                    }
                }
                None => ExpenseClassTotal {
                    id: class.id,
                    expense_class_name: class.name.clone(),
                    encumbered: Decimal::ZERO,
                    awaiting_payment: Decimal::ZERO,
                    expended: Decimal::ZERO,
                    percentage_expended: Some(Decimal::ZERO),
                },
            })
            .collect()
    }
}

/// `Σ PAYMENT − Σ CREDIT`, unrounded.
fn net_expended<'a>(transactions: impl Iterator<Item = &'a Transaction>) -> Decimal {
    transactions
        .map(|tx| match tx.transaction_type {
            TransactionType::Payment => tx.amount,
            TransactionType::Credit => -tx.amount,
            _ => Decimal::ZERO,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use acqledger_shared::types::{FiscalYearId, FundId};
    use rust_decimal_macros::dec;

    fn tx(kind: TransactionType, amount: Decimal, class: Option<&ExpenseClass>) -> Transaction {
        let tx = Transaction::new(kind, amount, Currency::Usd, FiscalYearId::new())
            .from_fund(FundId::new());
        match class {
            Some(class) => tx.with_expense_class(class.id),
            None => tx,
        }
    }

    #[test]
    fn test_class_sums_and_zero_percentage() {
        let print = ExpenseClass::new("Print");
        let electronic = ExpenseClass::new("Electronic");
        let history = vec![
            tx(TransactionType::Encumbrance, dec!(7.5), Some(&print)),
            tx(TransactionType::Encumbrance, dec!(3.33), Some(&print)),
            tx(TransactionType::PendingPayment, dec!(5), Some(&print)),
            tx(TransactionType::PendingPayment, dec!(4.44), Some(&print)),
            tx(TransactionType::Payment, dec!(20), Some(&electronic)),
        ];

        let totals = ExpenseClassTotalsAggregator::totals(
            &[print.clone(), electronic.clone()],
            &history,
            Currency::Usd,
        );

        assert_eq!(totals[0].id, print.id);
        assert_eq!(totals[0].encumbered, dec!(10.83));
        assert_eq!(totals[0].awaiting_payment, dec!(9.44));
        assert_eq!(totals[0].expended, dec!(0));
        assert_eq!(totals[0].percentage_expended, Some(dec!(0)));

        assert_eq!(totals[1].expended, dec!(20));
        assert_eq!(totals[1].percentage_expended, Some(dec!(100)));
    }

    #[test]
    fn test_zero_grand_total_gives_none() {
        let print = ExpenseClass::new("Print");
        let history = vec![tx(TransactionType::Encumbrance, dec!(10), Some(&print))];
        let totals = ExpenseClassTotalsAggregator::totals(&[print], &history, Currency::Usd);
        assert_eq!(totals[0].percentage_expended, None);
    }

    #[test]
    fn test_class_without_transactions_reports_zero() {
        let print = ExpenseClass::new("Print");
        let unused = ExpenseClass::new("Unused");
        let history = vec![tx(TransactionType::Payment, dec!(10), Some(&print))];
        let totals = ExpenseClassTotalsAggregator::totals(&[print, unused], &history, Currency::Usd);
        assert_eq!(totals[1].expense_class_name, "Unused");
        assert_eq!(totals[1].expended, Decimal::ZERO);
        assert_eq!(totals[1].percentage_expended, Some(Decimal::ZERO));
    }

    #[test]
    fn test_unclassified_spend_counts_toward_grand_total() {
        let print = ExpenseClass::new("Print");
        let history = vec![
            tx(TransactionType::Payment, dec!(30), Some(&print)),
            tx(TransactionType::Credit, dec!(5), Some(&print)),
            tx(TransactionType::Payment, dec!(75), None),
        ];
        let totals = ExpenseClassTotalsAggregator::totals(&[print], &history, Currency::Usd);
        assert_eq!(totals[0].expended, dec!(25));
        assert_eq!(totals[0].percentage_expended, Some(dec!(25)));
    }

    #[test]
    fn test_percentage_rounds_to_two_places() {
        let a = ExpenseClass::new("A");
        let b = ExpenseClass::new("B");
        let history = vec![
            tx(TransactionType::Payment, dec!(1), Some(&a)),
            tx(TransactionType::Payment, dec!(2), Some(&b)),
        ];
        let totals = ExpenseClassTotalsAggregator::totals(&[a, b], &history, Currency::Usd);
        assert_eq!(totals[0].percentage_expended, Some(dec!(33.33)));
        assert_eq!(totals[1].percentage_expended, Some(dec!(66.67)));
    }
}
