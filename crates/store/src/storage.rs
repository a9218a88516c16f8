//! The storage collaborator seam.

use async_trait::async_trait;

use acqledger_core::{
    Budget, BudgetExpenseClass, ExpenseClass, Fund, GroupFundFiscalYear, Transaction,
    TransactionType,
};
use acqledger_shared::types::{
    BudgetExpenseClassId, BudgetId, ExpenseClassId, FiscalYearId, FundId, TransactionId,
};

use crate::error::StoreError;
use crate::query::Query;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence and retrieval of finance records.
///
/// Reads return every matching record. Writes are single-record and not
/// transactional across calls.
#[async_trait]
pub trait FinanceStorage: Send + Sync {
    /// Fetches one transaction.
    async fn get_transaction(&self, id: TransactionId) -> StoreResult<Transaction>;

    /// Transactions of `fiscal_year_id` referencing any of `fund_ids` in either
    /// role. An empty `types` slice matches every type.
    async fn get_transactions_by_funds(
        &self,
        fund_ids: &[FundId],
        fiscal_year_id: FiscalYearId,
        types: &[TransactionType],
    ) -> StoreResult<Vec<Transaction>>;

    /// Transactions matching `query`.
    async fn query_transactions(&self, query: &Query) -> StoreResult<Vec<Transaction>>;

    /// Persists a new transaction.
    async fn create_transaction(&self, tx: &Transaction) -> StoreResult<Transaction>;

    /// Replaces an existing transaction.
    async fn update_transaction(&self, tx: &Transaction) -> StoreResult<()>;

    /// Fetches one budget.
    async fn get_budget(&self, id: BudgetId) -> StoreResult<Budget>;

    /// Budgets matching `query`.
    async fn query_budgets(&self, query: &Query) -> StoreResult<Vec<Budget>>;

    /// Replaces a budget, checking its `_version`.
    ///
    /// Returns the stored budget with its new version.
    async fn update_budget(&self, budget: &Budget) -> StoreResult<Budget>;

    /// Deletes a budget.
    async fn delete_budget(&self, id: BudgetId) -> StoreResult<()>;

    /// Fetches one fund.
    async fn get_fund(&self, id: FundId) -> StoreResult<Fund>;

    /// Group/fund/fiscal-year links matching `query`.
    async fn query_group_fund_fiscal_years(
        &self,
        query: &Query,
    ) -> StoreResult<Vec<GroupFundFiscalYear>>;

    /// Expense classes with the given ids. Unknown ids are skipped.
    async fn get_expense_classes(&self, ids: &[ExpenseClassId]) -> StoreResult<Vec<ExpenseClass>>;

    /// Budget/expense-class links matching `query`.
    async fn query_budget_expense_classes(
        &self,
        query: &Query,
    ) -> StoreResult<Vec<BudgetExpenseClass>>;

    /// Deletes a budget/expense-class link.
    async fn delete_budget_expense_class(&self, id: BudgetExpenseClassId) -> StoreResult<()>;
}

/// Query on the `budgetId` field.
#[must_use]
pub fn by_budget(budget_id: BudgetId) -> Query {
    Query::new().where_eq("budgetId", budget_id)
}

/// Query on the `fiscalYearId` field.
#[must_use]
pub fn by_fiscal_year(fiscal_year_id: FiscalYearId) -> Query {
    Query::new().where_eq("fiscalYearId", fiscal_year_id)
}

/// Query for the budget of a fund in a fiscal year.
#[must_use]
pub fn budget_of_fund(fund_id: FundId, fiscal_year_id: FiscalYearId) -> Query {
    Query::new()
        .where_eq("fundId", fund_id)
        .and(by_fiscal_year(fiscal_year_id))
}
