//! In-memory storage, used by tests and local runs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use acqledger_core::{
    Budget, BudgetExpenseClass, ExpenseClass, Fund, GroupFundFiscalYear, Transaction,
    TransactionType,
};
use acqledger_shared::types::{
    BudgetExpenseClassId, BudgetId, ExpenseClassId, FiscalYearId, FundId, GroupFundFiscalYearId,
    TransactionId,
};

use crate::collection::Collection;
use crate::error::StoreError;
use crate::query::Query;
use crate::storage::{FinanceStorage, StoreResult};

#[derive(Debug, Default)]
struct Records {
    transactions: BTreeMap<TransactionId, Transaction>,
    budgets: BTreeMap<BudgetId, Budget>,
    funds: BTreeMap<FundId, Fund>,
    group_fund_fiscal_years: BTreeMap<GroupFundFiscalYearId, GroupFundFiscalYear>,
    expense_classes: BTreeMap<ExpenseClassId, ExpenseClass>,
    budget_expense_classes: BTreeMap<BudgetExpenseClassId, BudgetExpenseClass>,
}

/// Storage backed by ordered maps.
///
/// Queries are evaluated against each record's JSON form. Budget updates
/// enforce the `_version` check.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    records: RwLock<Records>,
}

impl InMemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a transaction.
    #[must_use]
    pub fn with_transaction(mut self, tx: Transaction) -> Self {
        self.records.get_mut().transactions.insert(tx.id, tx);
        self
    }

    /// Adds a budget.
    #[must_use]
    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.records.get_mut().budgets.insert(budget.id, budget);
        self
    }

    /// Adds a fund.
    #[must_use]
    pub fn with_fund(mut self, fund: Fund) -> Self {
        self.records.get_mut().funds.insert(fund.id, fund);
        self
    }

    /// Adds a group/fund/fiscal-year link.
    #[must_use]
    pub fn with_group_fund_fiscal_year(mut self, link: GroupFundFiscalYear) -> Self {
        self.records
            .get_mut()
            .group_fund_fiscal_years
            .insert(link.id, link);
        self
    }

    /// Adds an expense class.
    #[must_use]
    pub fn with_expense_class(mut self, class: ExpenseClass) -> Self {
        self.records.get_mut().expense_classes.insert(class.id, class);
        self
    }

    /// Adds a budget/expense-class link.
    #[must_use]
    pub fn with_budget_expense_class(mut self, link: BudgetExpenseClass) -> Self {
        self.records
            .get_mut()
            .budget_expense_classes
            .insert(link.id, link);
        self
    }
}

fn matching<'a, T: serde::Serialize + Clone + 'a>(
    records: impl Iterator<Item = &'a T>,
    query: &Query,
) -> Vec<T> {
    records.filter(|r| query.matches(r)).cloned().collect()
}

#[async_trait]
impl FinanceStorage for InMemoryStorage {
    async fn get_transaction(&self, id: TransactionId) -> StoreResult<Transaction> {
        self.records
            .read()
            .await
            .transactions
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(Collection::Transactions, id))
    }

    async fn get_transactions_by_funds(
        &self,
        fund_ids: &[FundId],
        fiscal_year_id: FiscalYearId,
        types: &[TransactionType],
    ) -> StoreResult<Vec<Transaction>> {
        let records = self.records.read().await;
        Ok(records
            .transactions
            .values()
            .filter(|tx| tx.fiscal_year_id == fiscal_year_id)
            .filter(|tx| types.is_empty() || types.contains(&tx.transaction_type))
            .filter(|tx| fund_ids.iter().any(|fund| tx.touches(*fund)))
            .cloned()
            .collect())
    }

    async fn query_transactions(&self, query: &Query) -> StoreResult<Vec<Transaction>> {
        Ok(matching(self.records.read().await.transactions.values(), query))
    }

    async fn create_transaction(&self, tx: &Transaction) -> StoreResult<Transaction> {
        self.records
            .write()
            .await
            .transactions
            .insert(tx.id, tx.clone());
        Ok(tx.clone())
    }

    async fn update_transaction(&self, tx: &Transaction) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let stored = records
            .transactions
            .get_mut(&tx.id)
            .ok_or_else(|| StoreError::not_found(Collection::Transactions, tx.id))?;
        *stored = tx.clone();
        Ok(())
    }

    async fn get_budget(&self, id: BudgetId) -> StoreResult<Budget> {
        self.records
            .read()
            .await
            .budgets
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(Collection::Budgets, id))
    }

    async fn query_budgets(&self, query: &Query) -> StoreResult<Vec<Budget>> {
        Ok(matching(self.records.read().await.budgets.values(), query))
    }

    async fn update_budget(&self, budget: &Budget) -> StoreResult<Budget> {
        let mut records = self.records.write().await;
        let stored = records
            .budgets
            .get_mut(&budget.id)
            .ok_or_else(|| StoreError::not_found(Collection::Budgets, budget.id))?;
        if stored.version != budget.version {
            return Err(StoreError::version_conflict(Collection::Budgets, budget.id));
        }
        *stored = Budget {
            version: budget.version + 1,
            ..budget.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_budget(&self, id: BudgetId) -> StoreResult<()> {
        self.records
            .write()
            .await
            .budgets
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(Collection::Budgets, id))
    }

    async fn get_fund(&self, id: FundId) -> StoreResult<Fund> {
        self.records
            .read()
            .await
            .funds
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(Collection::Funds, id))
    }

    async fn query_group_fund_fiscal_years(
        &self,
        query: &Query,
    ) -> StoreResult<Vec<GroupFundFiscalYear>> {
        Ok(matching(
            self.records.read().await.group_fund_fiscal_years.values(),
            query,
        ))
    }

    async fn get_expense_classes(&self, ids: &[ExpenseClassId]) -> StoreResult<Vec<ExpenseClass>> {
        let records = self.records.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| records.expense_classes.get(id))
            .cloned()
            .collect())
    }

    async fn query_budget_expense_classes(
        &self,
        query: &Query,
    ) -> StoreResult<Vec<BudgetExpenseClass>> {
        Ok(matching(
            self.records.read().await.budget_expense_classes.values(),
            query,
        ))
    }

    async fn delete_budget_expense_class(&self, id: BudgetExpenseClassId) -> StoreResult<()> {
        self.records
            .write()
            .await
            .budget_expense_classes
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(Collection::BudgetExpenseClasses, id))
    }
}
