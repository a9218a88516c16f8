//! Finance operations over a storage collaborator.

use std::collections::BTreeSet;

use futures::future::{try_join, try_join_all};
use futures::try_join;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use acqledger_core::{
    Budget, BudgetExpenseClass, BudgetId, BudgetReconciliation, BudgetRecalculator, Currency,
    Entity, ExpenseClassId, ExpenseClassTotal, ExpenseClassTotalsAggregator, FinanceError,
    FiscalYearId, Fund, FundId, GroupFiscalYearAggregator, GroupFiscalYearSummary, GroupId,
    ReleaseOutcome, Transaction, TransactionContext, TransactionEffectApplier, TransactionId,
    TransactionType, TransactionValidator,
};
use acqledger_store::{FinanceStorage, Query, budget_of_fund, by_budget, by_fiscal_year};

/// Result type for finance operations.
pub type FinanceResult<T> = Result<T, FinanceError>;

/// Conflict code for deleting a budget that still has transactions.
pub const BUDGET_HAS_TRANSACTIONS: &str = "BUDGET_HAS_TRANSACTIONS";

/// Conflict code for removing an expense class still used by transactions.
pub const EXPENSE_CLASS_IN_USE: &str = "EXPENSE_CLASS_IN_USE";

static FUNDING_TYPES: [TransactionType; 3] = [
    TransactionType::Allocation,
    TransactionType::Transfer,
    TransactionType::RolloverTransfer,
];

/// Scope of an expense class breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum ExpenseClassScope {
    /// One budget.
    Budget(BudgetId),
    /// Every budget of a group.
    Group(GroupId),
}

/// Finance operations.
///
/// Writes are applied one record at a time. When a step fails, the error is
/// returned and earlier writes stay in place; recalculation repairs any
/// partially updated budget.
pub struct FinanceService<S> {
    storage: S,
}

impl<S: FinanceStorage> FinanceService<S> {
    /// Creates a service over `storage`.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Returns the storage collaborator.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Validates a transaction, persists it, and applies it to every affected budget.
    ///
    /// The amount is rounded to the transaction currency first.
    pub async fn validate_and_create_transaction(
        &self,
        mut tx: Transaction,
    ) -> FinanceResult<Transaction> {
        tx.amount = tx.currency.round(tx.amount);
        if let Some(encumbrance) = tx.encumbrance.as_mut() {
            encumbrance.initial_amount_encumbered = tx.amount;
        }

        let (mut budgets, (from_fund, to_fund)) =
            try_join(self.budgets_for(&tx), self.linked_funds(&tx)).await?;
        let links = self.expense_class_links_for(&tx, &budgets).await?;

        let ctx = TransactionContext {
            budgets: &budgets,
            from_fund: from_fund.as_ref(),
            to_fund: to_fund.as_ref(),
            expense_class_links: &links,
        };
        if let Err(err) = TransactionValidator::validate(&tx, &ctx) {
            warn!(
                transaction_id = %tx.id,
                transaction_type = %tx.transaction_type,
                error = %err,
                "Transaction rejected"
            );
            return Err(err);
        }

        let recorded = self.recorded_allocations(&tx).await?;
        let created = self.storage.create_transaction(&tx).await?;
        info!(
            transaction_id = %created.id,
            transaction_type = %created.transaction_type,
            amount = %created.amount,
            "Transaction created"
        );

        for budget in &mut budgets {
            TransactionEffectApplier::apply_with_history(budget, &created, &recorded);
            let saved = self.storage.update_budget(budget).await?;
            debug!(budget_id = %saved.id, version = saved.version, "Budget updated");
        }

        Ok(created)
    }

    /// Releases an encumbrance. Releasing an already released one succeeds
    /// without writing.
    pub async fn release_encumbrance(&self, id: TransactionId) -> FinanceResult<Transaction> {
        let mut tx = self.storage.get_transaction(id).await?;
        match TransactionEffectApplier::release(&mut tx)? {
            ReleaseOutcome::Released => {
                self.storage.update_transaction(&tx).await?;
                info!(transaction_id = %id, "Encumbrance released");
            }
            ReleaseOutcome::AlreadyReleased => {
                debug!(transaction_id = %id, "Encumbrance already released");
            }
        }
        Ok(tx)
    }

    /// Moves `amount` of an encumbrance from expended back to awaiting payment.
    pub async fn move_to_awaiting_payment(
        &self,
        id: TransactionId,
        amount: Decimal,
    ) -> FinanceResult<Transaction> {
        let mut tx = self.storage.get_transaction(id).await?;
        TransactionEffectApplier::move_to_awaiting_payment(&mut tx, amount)?;
        self.storage.update_transaction(&tx).await?;
        info!(transaction_id = %id, amount = %amount, "Moved to awaiting payment");
        Ok(tx)
    }

    /// Persists a budget after refreshing derived fields and checking the
    /// allowable encumbrance and expenditure limits.
    pub async fn update_budget(&self, mut budget: Budget) -> FinanceResult<Budget> {
        budget.totals.refresh_derived();
        budget.totals = budget.totals.rounded(budget.currency);

        if let Err(err) = TransactionValidator::validate_budget_limits(&budget) {
            warn!(budget_id = %budget.id, error = %err, "Budget update rejected");
            return Err(err);
        }

        let saved = self.storage.update_budget(&budget).await?;
        info!(budget_id = %saved.id, version = saved.version, "Budget updated");
        Ok(saved)
    }

    /// Recomputes a budget from its full transaction history and persists it.
    pub async fn recalculate_budget(&self, id: BudgetId) -> FinanceResult<BudgetReconciliation> {
        let budget = self.storage.get_budget(id).await?;
        self.recalculate(budget).await
    }

    /// Recalculates every budget of a fiscal year, one at a time.
    ///
    /// Stops at the first failure; budgets already recalculated stay persisted.
    pub async fn recalculate_fiscal_year_budgets(
        &self,
        fiscal_year_id: FiscalYearId,
    ) -> FinanceResult<Vec<BudgetReconciliation>> {
        let budgets = self
            .storage
            .query_budgets(&by_fiscal_year(fiscal_year_id))
            .await?;
        info!(
            fiscal_year_id = %fiscal_year_id,
            budgets = budgets.len(),
            "Recalculating fiscal year"
        );

        let mut out = Vec::with_capacity(budgets.len());
        for budget in budgets {
            out.push(self.recalculate(budget).await?);
        }
        Ok(out)
    }

    async fn recalculate(&self, budget: Budget) -> FinanceResult<BudgetReconciliation> {
        let history = self
            .storage
            .get_transactions_by_funds(&[budget.fund_id], budget.fiscal_year_id, &[])
            .await?;
        let mut reconciliation = BudgetRecalculator::reconcile(&budget, &history);

        for drift in &reconciliation.drift {
            warn!(
                budget_id = %budget.id,
                field = %drift.field,
                cached = %drift.cached,
                recomputed = %drift.recomputed,
                "Budget aggregate drift"
            );
        }

        reconciliation.budget = self.storage.update_budget(&reconciliation.budget).await?;
        info!(
            budget_id = %budget.id,
            transactions = history.len(),
            drifted = reconciliation.drift.len(),
            "Budget recalculated"
        );
        Ok(reconciliation)
    }

    /// One summary per group and fiscal year among the links matching `query`.
    pub async fn get_group_fiscal_year_summaries(
        &self,
        query: &Query,
    ) -> FinanceResult<Vec<GroupFiscalYearSummary>> {
        let links = self.storage.query_group_fund_fiscal_years(query).await?;
        let years: BTreeSet<FiscalYearId> = links.iter().map(|l| l.fiscal_year_id).collect();

        let per_year = try_join_all(years.into_iter().map(|fy| {
            let funds: Vec<FundId> = links
                .iter()
                .filter(|l| l.fiscal_year_id == fy)
                .map(|l| l.fund_id)
                .collect();
            self.group_inputs(fy, funds)
        }))
        .await?;

        let (budgets, funding): (Vec<_>, Vec<_>) = per_year.into_iter().unzip();
        let budgets: Vec<Budget> = budgets.into_iter().flatten().collect();
        let funding: Vec<Transaction> = funding.into_iter().flatten().collect();

        Ok(GroupFiscalYearAggregator::summarize(
            &links, &budgets, &funding,
        ))
    }

    async fn group_inputs(
        &self,
        fiscal_year_id: FiscalYearId,
        funds: Vec<FundId>,
    ) -> FinanceResult<(Vec<Budget>, Vec<Transaction>)> {
        debug!(fiscal_year_id = %fiscal_year_id, funds = funds.len(), "Fetching group inputs");
        let query = by_fiscal_year(fiscal_year_id);
        let (budgets, allocations, transfers) = try_join!(
            self.storage.query_budgets(&query),
            self.storage.get_transactions_by_funds(
                &funds,
                fiscal_year_id,
                &FUNDING_TYPES[..1],
            ),
            self.storage.get_transactions_by_funds(
                &funds,
                fiscal_year_id,
                &FUNDING_TYPES[1..],
            ),
        )?;

        let budgets = budgets
            .into_iter()
            .filter(|b| funds.contains(&b.fund_id))
            .collect();
        let funding = allocations.into_iter().chain(transfers).collect();
        Ok((budgets, funding))
    }

    /// Per expense class totals of a budget or a group for a fiscal year.
    pub async fn get_expense_class_totals(
        &self,
        scope: ExpenseClassScope,
        fiscal_year_id: FiscalYearId,
    ) -> FinanceResult<Vec<ExpenseClassTotal>> {
        let budgets = match scope {
            ExpenseClassScope::Budget(id) => vec![self.storage.get_budget(id).await?],
            ExpenseClassScope::Group(group_id) => {
                let query = Query::new()
                    .where_eq("groupId", group_id)
                    .and(by_fiscal_year(fiscal_year_id));
                let links = self.storage.query_group_fund_fiscal_years(&query).await?;
                let budgets = self
                    .storage
                    .query_budgets(&by_fiscal_year(fiscal_year_id))
                    .await?;
                budgets
                    .into_iter()
                    .filter(|b| links.iter().any(|l| l.fund_id == b.fund_id))
                    .collect()
            }
        };

        let funds: Vec<FundId> = budgets.iter().map(|b| b.fund_id).collect();
        let currency = budgets.first().map_or_else(Currency::default, |b| b.currency);

        let (transactions, links) = try_join(
            async {
                self.storage
                    .get_transactions_by_funds(&funds, fiscal_year_id, &[])
                    .await
                    .map_err(FinanceError::from)
            },
            try_join_all(budgets.iter().map(|b| async move {
                self.storage
                    .query_budget_expense_classes(&by_budget(b.id))
                    .await
                    .map_err(FinanceError::from)
            })),
        )
        .await?;

        let class_ids: Vec<ExpenseClassId> = links
            .into_iter()
            .flatten()
            .map(|l| l.expense_class_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let expense_classes = self.storage.get_expense_classes(&class_ids).await?;

        Ok(ExpenseClassTotalsAggregator::totals(
            &expense_classes,
            &transactions,
            currency,
        ))
    }

    /// Deletes a budget and its expense class links.
    ///
    /// Fails with a conflict while any transaction of the fund and fiscal year exists.
    pub async fn delete_budget(&self, id: BudgetId) -> FinanceResult<()> {
        let budget = self.storage.get_budget(id).await?;
        let (transactions, links) = try_join(
            self.storage
                .get_transactions_by_funds(&[budget.fund_id], budget.fiscal_year_id, &[]),
            self.storage.query_budget_expense_classes(&by_budget(id)),
        )
        .await?;

        if !transactions.is_empty() {
            return Err(FinanceError::conflict(
                BUDGET_HAS_TRANSACTIONS,
                format!("Budget {id} has {} related transactions", transactions.len()),
            ));
        }

        for link in links {
            self.storage.delete_budget_expense_class(link.id).await?;
        }
        self.storage.delete_budget(id).await?;
        info!(budget_id = %id, "Budget deleted");
        Ok(())
    }

    /// Removes an expense class from a budget.
    ///
    /// Fails with a conflict while any transaction of the budget uses the class.
    pub async fn remove_budget_expense_class(
        &self,
        budget_id: BudgetId,
        expense_class_id: ExpenseClassId,
    ) -> FinanceResult<()> {
        let budget = self.storage.get_budget(budget_id).await?;
        let query = by_budget(budget_id).where_eq("expenseClassId", expense_class_id);
        let (links, transactions) = try_join(
            self.storage.query_budget_expense_classes(&query),
            self.storage
                .get_transactions_by_funds(&[budget.fund_id], budget.fiscal_year_id, &[]),
        )
        .await?;

        let link: BudgetExpenseClass = links.into_iter().next().ok_or_else(|| {
            FinanceError::not_found(Entity::BudgetExpenseClass, expense_class_id)
        })?;

        if transactions
            .iter()
            .any(|tx| tx.expense_class_id == Some(expense_class_id))
        {
            return Err(FinanceError::conflict(
                EXPENSE_CLASS_IN_USE,
                format!("Expense class {expense_class_id} is used by budget {budget_id}"),
            ));
        }

        self.storage.delete_budget_expense_class(link.id).await?;
        info!(
            budget_id = %budget_id,
            expense_class_id = %expense_class_id,
            "Expense class removed"
        );
        Ok(())
    }

    async fn budgets_for(&self, tx: &Transaction) -> FinanceResult<Vec<Budget>> {
        let found = try_join_all(tx.fund_ids().into_iter().map(|fund| async move {
            let query = budget_of_fund(fund, tx.fiscal_year_id);
            self.storage.query_budgets(&query).await
        }))
        .await?;
        Ok(found.into_iter().filter_map(|b| b.into_iter().next()).collect())
    }

    async fn linked_funds(&self, tx: &Transaction) -> FinanceResult<(Option<Fund>, Option<Fund>)> {
        match (tx.from_fund_id, tx.to_fund_id) {
            (Some(from), Some(to)) if tx.transaction_type.is_funding_movement() => {
                let (from, to) =
                    try_join(self.storage.get_fund(from), self.storage.get_fund(to)).await?;
                Ok((Some(from), Some(to)))
            }
            _ => Ok((None, None)),
        }
    }

    async fn expense_class_links_for(
        &self,
        tx: &Transaction,
        budgets: &[Budget],
    ) -> FinanceResult<Vec<BudgetExpenseClass>> {
        let from_budget = tx
            .from_fund_id
            .and_then(|fund| budgets.iter().find(|b| b.fund_id == fund));
        match (tx.transaction_type, tx.expense_class_id, from_budget) {
            (TransactionType::Encumbrance, Some(_), Some(budget)) => Ok(self
                .storage
                .query_budget_expense_classes(&by_budget(budget.id))
                .await?),
            _ => Ok(Vec::new()),
        }
    }

    /// Allocations already received by the to-fund of an incoming allocation.
    async fn recorded_allocations(&self, tx: &Transaction) -> FinanceResult<Vec<Transaction>> {
        match (tx.transaction_type, tx.to_fund_id) {
            (TransactionType::Allocation, Some(to)) => Ok(self
                .storage
                .get_transactions_by_funds(&[to], tx.fiscal_year_id, &FUNDING_TYPES[..1])
                .await?),
            _ => Ok(Vec::new()),
        }
    }
}
