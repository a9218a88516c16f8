//! Record collections exposed by the storage service.

/// A storage collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Transactions.
    Transactions,
    /// Budgets.
    Budgets,
    /// Funds.
    Funds,
    /// Group/fund/fiscal-year links.
    GroupFundFiscalYears,
    /// Expense classes.
    ExpenseClasses,
    /// Budget/expense-class links.
    BudgetExpenseClasses,
}

impl Collection {
    /// REST path of the collection.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Transactions => "finance-storage/transactions",
            Self::Budgets => "finance-storage/budgets",
            Self::Funds => "finance-storage/funds",
            Self::GroupFundFiscalYears => "finance-storage/group-fund-fiscal-years",
            Self::ExpenseClasses => "finance-storage/expense-classes",
            Self::BudgetExpenseClasses => "finance-storage/budget-expense-classes",
        }
    }

    /// Key of the record array in a collection response.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::Budgets => "budgets",
            Self::Funds => "funds",
            Self::GroupFundFiscalYears => "groupFundFiscalYears",
            Self::ExpenseClasses => "expenseClasses",
            Self::BudgetExpenseClasses => "budgetExpenseClasses",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
