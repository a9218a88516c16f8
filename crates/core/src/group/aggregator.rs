//! Reduction of member budgets into one summary per group and fiscal year.

use std::collections::{BTreeMap, BTreeSet};

use acqledger_shared::types::{FiscalYearId, FundId, GroupId};

use super::types::{GroupFiscalYearSummary, GroupFundFiscalYear};
use crate::budget::{Budget, BudgetTotals, initial_allocation_id};
use crate::transaction::{Transaction, TransactionType};

/// Builds group fiscal-year summaries.
pub struct GroupFiscalYearAggregator;

impl GroupFiscalYearAggregator {
    /// One summary per distinct `(group, fiscal year)` among `links`.
    ///
    /// `budgets` are the candidate member budgets; a link is matched by its
    /// `budget_id`, or by fund and fiscal year when it has none.
    /// `funding` holds the ALLOCATION and TRANSFER / ROLLOVER_TRANSFER
    /// transactions of the member funds; other types are ignored.
    ///
    /// Member budgets contribute their encumbrance and spend fields and their
    /// initial allocation. Later allocations and transfers are summed from
    /// `funding`, skipping each receiving fund's earliest allocation. Derived
    /// fields are evaluated once per group, after summation.
    #[must_use]
    pub fn summarize(
        links: &[GroupFundFiscalYear],
        budgets: &[Budget],
        funding: &[Transaction],
    ) -> Vec<GroupFiscalYearSummary> {
        let mut groups: BTreeMap<(GroupId, FiscalYearId), Vec<&GroupFundFiscalYear>> =
            BTreeMap::new();
        for link in links {
            groups
                .entry((link.group_id, link.fiscal_year_id))
                .or_default()
                .push(link);
        }

        groups
            .into_iter()
            .map(|((group_id, fiscal_year_id), members)| GroupFiscalYearSummary {
                group_id,
                fiscal_year_id,
                totals: Self::reduce(&members, budgets, funding, fiscal_year_id),
            })
            .collect()
    }

    fn reduce(
        members: &[&GroupFundFiscalYear],
        budgets: &[Budget],
        funding: &[Transaction],
        fiscal_year_id: FiscalYearId,
    ) -> BudgetTotals {
        let mut seen = BTreeSet::new();
        let member_budgets: Vec<&Budget> = members
            .iter()
            .filter_map(|link| budget_of(link, budgets))
            .filter(|budget| seen.insert(budget.id))
            .collect();

        let Some(currency) = member_budgets.first().map(|b| b.currency) else {
            return BudgetTotals::default();
        };

        let mut totals = BudgetTotals::default();
        for budget in &member_budgets {
            totals.initial_allocation += budget.totals.initial_allocation;
            totals.encumbered += budget.totals.encumbered;
            totals.awaiting_payment += budget.totals.awaiting_payment;
            totals.expenditures += budget.totals.expenditures;
            totals.credits += budget.totals.credits;
        }

        let funds: BTreeSet<FundId> = member_budgets.iter().map(|b| b.fund_id).collect();
        let in_year: Vec<&Transaction> = funding
            .iter()
            .filter(|tx| tx.fiscal_year_id == fiscal_year_id)
            .collect();
        let initial: BTreeSet<_> = funds
            .iter()
            .filter_map(|fund| initial_allocation_id(in_year.iter().copied(), *fund))
            .collect();
        let is_member = |fund: Option<FundId>| fund.is_some_and(|id| funds.contains(&id));

        for tx in in_year {
            match tx.transaction_type {
                TransactionType::Allocation => {
                    if is_member(tx.to_fund_id) && !initial.contains(&tx.id) {
                        totals.allocation_to += tx.amount;
                    }
                    if is_member(tx.from_fund_id) {
                        totals.allocation_from += tx.amount;
                    }
                }
                TransactionType::Transfer | TransactionType::RolloverTransfer => {
                    if is_member(tx.to_fund_id) {
                        totals.net_transfers += tx.amount;
                    }
                    if is_member(tx.from_fund_id) {
                        totals.net_transfers -= tx.amount;
                    }
                }
                _ => {}
            }
        }

        totals.with_derived().rounded(currency)
    }
}

fn budget_of<'a>(link: &GroupFundFiscalYear, budgets: &'a [Budget]) -> Option<&'a Budget> {
    match link.budget_id {
        Some(id) => budgets.iter().find(|b| b.id == id),
        None => budgets
            .iter()
            .find(|b| b.fund_id == link.fund_id && b.fiscal_year_id == link.fiscal_year_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::BudgetRecalculator;
    use acqledger_shared::types::Currency;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct Fixture {
        group: GroupId,
        fy: FiscalYearId,
        budgets: Vec<Budget>,
        history: Vec<Transaction>,
    }

    fn tx(fy: FiscalYearId, kind: TransactionType, amount: Decimal) -> Transaction {
        Transaction::new(kind, amount, Currency::Usd, fy)
    }

    /// Two member funds, each with an initial allocation, plus movements
    /// between them and to an outside fund.
    fn fixture() -> Fixture {
        let fy = FiscalYearId::new();
        let now = Utc::now();
        let mut a = Budget::new("A", FundId::new(), fy, Currency::Usd);
        let mut b = Budget::new("B", FundId::new(), fy, Currency::Usd);
        let outside = FundId::new();

        let history = vec![
            tx(fy, TransactionType::Allocation, dec!(1000))
                .to_fund(a.fund_id)
                .created_at(now - Duration::days(3)),
            tx(fy, TransactionType::Allocation, dec!(500))
                .to_fund(b.fund_id)
                .created_at(now - Duration::days(3)),
            tx(fy, TransactionType::Allocation, dec!(200))
                .from_fund(a.fund_id)
                .to_fund(b.fund_id)
                .created_at(now - Duration::days(2)),
            tx(fy, TransactionType::Allocation, dec!(50))
                .to_fund(a.fund_id)
                .created_at(now - Duration::days(1)),
            tx(fy, TransactionType::Transfer, dec!(30))
                .from_fund(b.fund_id)
                .to_fund(outside),
            tx(fy, TransactionType::RolloverTransfer, dec!(4))
                .from_fund(outside)
                .to_fund(a.fund_id),
            tx(fy, TransactionType::Encumbrance, dec!(120)).from_fund(a.fund_id),
            tx(fy, TransactionType::PendingPayment, dec!(40)).from_fund(b.fund_id),
            tx(fy, TransactionType::Payment, dec!(80)).from_fund(b.fund_id),
            tx(fy, TransactionType::Credit, dec!(10)).to_fund(a.fund_id),
        ];

        a.totals = BudgetRecalculator::recompute(&a, &history);
        b.totals = BudgetRecalculator::recompute(&b, &history);

        Fixture {
            group: GroupId::new(),
            fy,
            budgets: vec![a, b],
            history,
        }
    }

    #[test]
    fn test_group_equals_sum_of_members() {
        let f = fixture();
        let links: Vec<_> = f
            .budgets
            .iter()
            .map(|b| GroupFundFiscalYear::new(f.group, b.fund_id, f.fy).with_budget(b.id))
            .collect();

        let summaries = GroupFiscalYearAggregator::summarize(&links, &f.budgets, &f.history);
        assert_eq!(summaries.len(), 1);
        let totals = summaries[0].totals;

        let (a, b) = (&f.budgets[0].totals, &f.budgets[1].totals);
        for ((name, group), ((_, x), (_, y))) in totals
            .fields()
            .into_iter()
            .zip(a.fields().into_iter().zip(b.fields()))
            .take(12)
        {
            assert_eq!(group, x + y, "{name}");
        }

        assert_eq!(totals.initial_allocation, dec!(1500));
        assert_eq!(totals.allocation_to, dec!(250));
        assert_eq!(totals.allocation_from, dec!(200));
        assert_eq!(totals.allocated, dec!(1550));
        assert_eq!(totals.net_transfers, dec!(-26));
        assert_eq!(totals.total_funding, dec!(1524));
        assert_eq!(totals.available + totals.unavailable, totals.total_funding);
    }

    #[test]
    fn test_link_without_budget_yields_zero_summary() {
        let f = fixture();
        let empty_group = GroupId::new();
        let links = vec![GroupFundFiscalYear::new(empty_group, FundId::new(), f.fy)];
        let summaries = GroupFiscalYearAggregator::summarize(&links, &f.budgets, &f.history);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].group_id, empty_group);
        assert_eq!(summaries[0].totals, BudgetTotals::default());
    }

    #[test]
    fn test_budget_matched_by_fund_when_link_lacks_id() {
        let f = fixture();
        let a = &f.budgets[0];
        let links = vec![
            GroupFundFiscalYear::new(f.group, a.fund_id, f.fy),
            GroupFundFiscalYear::new(f.group, a.fund_id, f.fy).with_budget(a.id),
        ];
        let summaries = GroupFiscalYearAggregator::summarize(&links, &f.budgets, &f.history);
        assert_eq!(summaries[0].totals.initial_allocation, dec!(1000));
        assert_eq!(summaries[0].totals.encumbered, dec!(120));
    }

    #[test]
    fn test_one_summary_per_group_and_year() {
        let f = fixture();
        let other_group = GroupId::new();
        let (a, b) = (&f.budgets[0], &f.budgets[1]);
        let links = vec![
            GroupFundFiscalYear::new(f.group, a.fund_id, f.fy).with_budget(a.id),
            GroupFundFiscalYear::new(other_group, b.fund_id, f.fy).with_budget(b.id),
            GroupFundFiscalYear::new(other_group, a.fund_id, f.fy).with_budget(a.id),
        ];
        let summaries = GroupFiscalYearAggregator::summarize(&links, &f.budgets, &f.history);
        assert_eq!(summaries.len(), 2);

        let only_a = summaries.iter().find(|s| s.group_id == f.group).unwrap();
        assert_eq!(only_a.totals, f.budgets[0].totals);
    }
}
