//! Admission rules for transactions and budget updates.
//!
//! Nothing here touches an aggregate: every check runs before any write.

use rust_decimal::Decimal;

use crate::budget::types::Budget;
use crate::error::{Entity, FinanceError, ValidationIssue};
use crate::expense_class::{BudgetExpenseClass, ExpenseClassStatus};
use crate::fund::Fund;
use crate::transaction::{FundRole, Transaction, TransactionType};

/// Records the validator needs to admit a transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionContext<'a> {
    /// Budgets of the fiscal year for the funds the transaction touches.
    pub budgets: &'a [Budget],
    /// Sending fund, when the transaction is an internal allocation or transfer.
    pub from_fund: Option<&'a Fund>,
    /// Receiving fund, when the transaction is an internal allocation or transfer.
    pub to_fund: Option<&'a Fund>,
    /// Expense class links of the from-fund budget.
    pub expense_class_links: &'a [BudgetExpenseClass],
}

impl<'a> TransactionContext<'a> {
    /// Returns the budget of `fund_id`, if loaded.
    #[must_use]
    pub fn budget_for(&self, fund_id: crate::FundId) -> Option<&'a Budget> {
        self.budgets.iter().find(|b| b.fund_id == fund_id)
    }
}

/// Transaction and budget validation rules.
pub struct TransactionValidator;

impl TransactionValidator {
    /// Validates a proposed transaction.
    ///
    /// Structural problems (missing fund ids, negative amounts) are reported
    /// first and on their own. Otherwise every remaining rule runs and all
    /// violations are reported together.
    ///
    /// # Errors
    ///
    /// Returns `FinanceError::NotFound` if an affected fund has no budget or an
    /// expense class link is missing, `FinanceError::Validation` otherwise.
    pub fn validate(tx: &Transaction, ctx: &TransactionContext<'_>) -> Result<(), FinanceError> {
        let structural: Vec<ValidationIssue> = [Self::check_fund_ids(tx), Self::check_amount(tx)]
            .into_iter()
            .flatten()
            .collect();
        if !structural.is_empty() {
            return Err(FinanceError::Validation(structural));
        }

        let mut issues = Vec::new();

        if let Some(issue) = Self::check_linkage(tx, ctx.from_fund, ctx.to_fund) {
            issues.push(issue);
        }

        for fund_id in tx.fund_ids() {
            let budget = ctx
                .budget_for(fund_id)
                .ok_or_else(|| FinanceError::not_found(Entity::Budget, fund_id))?;
            issues.extend(Self::check_budget_active(tx, budget));
            issues.extend(Self::check_currency(tx, budget));
        }

        issues.extend(Self::check_expense_class(tx, ctx.expense_class_links)?);

        if issues.is_empty() {
            Ok(())
        } else {
            Err(FinanceError::Validation(issues))
        }
    }

    /// Checks that the fund ids required by the transaction type are present.
    #[must_use]
    pub fn check_fund_ids(tx: &Transaction) -> Option<ValidationIssue> {
        let missing = |role| {
            Some(ValidationIssue::MissingFundId {
                transaction_type: tx.transaction_type,
                role,
            })
        };
        match tx.transaction_type {
            TransactionType::Allocation if tx.from_fund_id.is_none() && tx.to_fund_id.is_none() => {
                missing("from or to")
            }
            TransactionType::Transfer | TransactionType::RolloverTransfer
                if tx.from_fund_id.is_none() =>
            {
                missing("from")
            }
            TransactionType::Transfer | TransactionType::RolloverTransfer
                if tx.to_fund_id.is_none() =>
            {
                missing("to")
            }
            TransactionType::Encumbrance
            | TransactionType::PendingPayment
            | TransactionType::Payment
                if tx.from_fund_id.is_none() =>
            {
                missing("from")
            }
            TransactionType::Credit if tx.to_fund_id.is_none() => missing("to"),
            _ => None,
        }
    }

    /// Only pending payments may carry a negative amount.
    #[must_use]
    pub fn check_amount(tx: &Transaction) -> Option<ValidationIssue> {
        (tx.transaction_type != TransactionType::PendingPayment && tx.amount < Decimal::ZERO)
            .then_some(ValidationIssue::NegativeAmount(tx.transaction_type))
    }

    /// Checks the allocated-from / allocated-to linkage of an internal
    /// allocation or transfer.
    ///
    /// Skipped for other types, for external movements, and when the funds
    /// were not supplied.
    #[must_use]
    pub fn check_linkage(
        tx: &Transaction,
        from_fund: Option<&Fund>,
        to_fund: Option<&Fund>,
    ) -> Option<ValidationIssue> {
        if !tx.transaction_type.is_funding_movement() || !tx.is_internal() {
            return None;
        }
        let (from_fund, to_fund) = (from_fund?, to_fund?);
        let allowed = to_fund.accepts_from(from_fund.id) && from_fund.sends_to(to_fund.id);
        (!allowed).then_some(ValidationIssue::AllocationTransferMismatch {
            from_fund_id: from_fund.id,
            to_fund_id: to_fund.id,
        })
    }

    /// Inactive budgets only admit effects that exclusively decrease them:
    /// the sending side of a transfer, or a negative pending payment.
    #[must_use]
    pub fn check_budget_active(tx: &Transaction, budget: &Budget) -> Option<ValidationIssue> {
        if !budget.is_inactive() || Self::only_decreases(tx, budget) {
            return None;
        }
        Some(ValidationIssue::BudgetIsInactive(budget.id))
    }

    fn only_decreases(tx: &Transaction, budget: &Budget) -> bool {
        match tx.transaction_type {
            TransactionType::Transfer | TransactionType::RolloverTransfer => {
                tx.has_role(budget.fund_id, FundRole::From)
                    && !tx.has_role(budget.fund_id, FundRole::To)
            }
            TransactionType::PendingPayment => tx.amount < Decimal::ZERO,
            _ => false,
        }
    }

    /// Transaction and budget must share a currency.
    #[must_use]
    pub fn check_currency(tx: &Transaction, budget: &Budget) -> Option<ValidationIssue> {
        (tx.currency != budget.currency).then_some(ValidationIssue::CurrencyMismatch {
            budget_id: budget.id,
            expected: budget.currency,
            got: tx.currency,
        })
    }

    /// New encumbrances need an active expense class link on the budget.
    ///
    /// # Errors
    ///
    /// Returns `FinanceError::NotFound` when the budget has no link for the class.
    pub fn check_expense_class(
        tx: &Transaction,
        links: &[BudgetExpenseClass],
    ) -> Result<Option<ValidationIssue>, FinanceError> {
        let Some(expense_class_id) = tx.expense_class_id else {
            return Ok(None);
        };
        if tx.transaction_type != TransactionType::Encumbrance {
            return Ok(None);
        }
        let link = links
            .iter()
            .find(|l| l.expense_class_id == expense_class_id)
            .ok_or_else(|| FinanceError::not_found(Entity::BudgetExpenseClass, expense_class_id))?;
        Ok((link.status == ExpenseClassStatus::Inactive)
            .then_some(ValidationIssue::InactiveExpenseClass(expense_class_id)))
    }

    /// Validates the allowable limits of a budget about to be persisted.
    ///
    /// Encumbrance: `encumbered + awaitingPayment + expenditures` must not
    /// exceed `allocated * allowableEncumbrance / 100`.
    /// Expenditure: `awaitingPayment + expenditures` must not exceed
    /// `allocated * allowableExpenditure / 100`.
    /// Both violations are reported together.
    ///
    /// # Errors
    ///
    /// Returns `FinanceError::Validation` listing every exceeded limit.
    pub fn validate_budget_limits(budget: &Budget) -> Result<(), FinanceError> {
        let totals = &budget.totals;
        let mut issues = Vec::new();

        if let Some(pct) = budget.allowable_encumbrance {
            let limit = totals.allocated * pct / Decimal::ONE_HUNDRED;
            let projected = totals.encumbered + totals.awaiting_payment + totals.expenditures;
            if projected > limit {
                issues.push(ValidationIssue::AllowableEncumbranceLimitExceeded {
                    budget_id: budget.id,
                    limit,
                    projected,
                });
            }
        }

        if let Some(pct) = budget.allowable_expenditure {
            let limit = totals.allocated * pct / Decimal::ONE_HUNDRED;
            let projected = totals.awaiting_payment + totals.expenditures;
            if projected > limit {
                issues.push(ValidationIssue::AllowableExpenditureLimitExceeded {
                    budget_id: budget.id,
                    limit,
                    projected,
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(FinanceError::Validation(issues))
        }
    }

    /// Only ENCUMBRANCE transactions can be released or moved to awaiting payment.
    ///
    /// # Errors
    ///
    /// Returns `FinanceError::TransactionTypeMismatch` ("Encumbrance expected").
    pub fn validate_encumbrance_operation(tx: &Transaction) -> Result<(), FinanceError> {
        if tx.transaction_type == TransactionType::Encumbrance {
            Ok(())
        } else {
            Err(FinanceError::TransactionTypeMismatch {
                expected: TransactionType::Encumbrance,
                actual: tx.transaction_type,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense_class::BudgetExpenseClass;
    use crate::{BudgetStatus, FiscalYearId, FundId, LedgerId};
    use acqledger_shared::types::{Currency, ExpenseClassId};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn budget_for(fund_id: FundId, fy: FiscalYearId) -> Budget {
        Budget::new("B", fund_id, fy, Currency::Usd)
    }

    fn tx(kind: TransactionType, amount: Decimal, fy: FiscalYearId) -> Transaction {
        Transaction::new(kind, amount, Currency::Usd, fy)
    }

    #[rstest]
    #[case(TransactionType::Allocation, false, false, Some("from or to"))]
    #[case(TransactionType::Allocation, true, false, None)]
    #[case(TransactionType::Allocation, false, true, None)]
    #[case(TransactionType::Transfer, true, false, Some("to"))]
    #[case(TransactionType::Transfer, false, true, Some("from"))]
    #[case(TransactionType::Transfer, true, true, None)]
    #[case(TransactionType::RolloverTransfer, false, true, Some("from"))]
    #[case(TransactionType::Encumbrance, false, true, Some("from"))]
    #[case(TransactionType::Payment, true, false, None)]
    #[case(TransactionType::Credit, true, false, Some("to"))]
    #[case(TransactionType::Credit, false, true, None)]
    fn test_required_fund_ids(
        #[case] kind: TransactionType,
        #[case] has_from: bool,
        #[case] has_to: bool,
        #[case] missing: Option<&'static str>,
    ) {
        let mut t = tx(kind, dec!(1), FiscalYearId::new());
        if has_from {
            t = t.from_fund(FundId::new());
        }
        if has_to {
            t = t.to_fund(FundId::new());
        }
        let expected = missing.map(|role| ValidationIssue::MissingFundId {
            transaction_type: kind,
            role,
        });
        assert_eq!(TransactionValidator::check_fund_ids(&t), expected);
    }

    #[test]
    fn test_negative_amount_only_for_pending_payment() {
        let fy = FiscalYearId::new();
        let payment = tx(TransactionType::Payment, dec!(-1), fy).from_fund(FundId::new());
        assert_eq!(
            TransactionValidator::check_amount(&payment),
            Some(ValidationIssue::NegativeAmount(TransactionType::Payment))
        );
        let pending = tx(TransactionType::PendingPayment, dec!(-1), fy).from_fund(FundId::new());
        assert_eq!(TransactionValidator::check_amount(&pending), None);
    }

    #[test]
    fn test_allocation_linkage_mismatch() {
        let ledger = LedgerId::new();
        let from = Fund::new("A", ledger);
        let mut to = Fund::new("B", ledger);
        to.allocated_from_ids.push(FundId::new());

        let fy = FiscalYearId::new();
        let t = tx(TransactionType::Allocation, dec!(10), fy)
            .from_fund(from.id)
            .to_fund(to.id);
        let budgets = vec![budget_for(from.id, fy), budget_for(to.id, fy)];
        let ctx = TransactionContext {
            budgets: &budgets,
            from_fund: Some(&from),
            to_fund: Some(&to),
            ..TransactionContext::default()
        };

        let err = TransactionValidator::validate(&t, &ctx).unwrap_err();
        assert_eq!(err.issue_codes(), vec!["ALLOCATION_TRANSFER_MISMATCH"]);

        to.allocated_from_ids.push(from.id);
        let ctx = TransactionContext {
            budgets: &budgets,
            from_fund: Some(&from),
            to_fund: Some(&to),
            ..TransactionContext::default()
        };
        assert!(TransactionValidator::validate(&t, &ctx).is_ok());
    }

    #[test]
    fn test_sender_linkage_also_checked() {
        let ledger = LedgerId::new();
        let mut from = Fund::new("A", ledger);
        let to = Fund::new("B", ledger);
        from.allocated_to_ids.push(FundId::new());

        let t = tx(TransactionType::Transfer, dec!(10), FiscalYearId::new())
            .from_fund(from.id)
            .to_fund(to.id);
        assert!(matches!(
            TransactionValidator::check_linkage(&t, Some(&from), Some(&to)),
            Some(ValidationIssue::AllocationTransferMismatch { .. })
        ));
    }

    #[test]
    fn test_inactive_budget_rejects_increase() {
        let fy = FiscalYearId::new();
        let fund = FundId::new();
        let mut budget = budget_for(fund, fy);
        budget.budget_status = BudgetStatus::Inactive;
        let budgets = vec![budget.clone()];
        let ctx = TransactionContext {
            budgets: &budgets,
            ..TransactionContext::default()
        };

        let payment = tx(TransactionType::Payment, dec!(5), fy).from_fund(fund);
        let err = TransactionValidator::validate(&payment, &ctx).unwrap_err();
        assert_eq!(err.issue_codes(), vec!["BUDGET_IS_INACTIVE"]);

        let reduction = tx(TransactionType::PendingPayment, dec!(-5), fy).from_fund(fund);
        assert!(TransactionValidator::validate(&reduction, &ctx).is_ok());
    }

    #[test]
    fn test_inactive_budget_may_send_transfer() {
        let fy = FiscalYearId::new();
        let (sender, receiver) = (FundId::new(), FundId::new());
        let mut inactive = budget_for(sender, fy);
        inactive.budget_status = BudgetStatus::Inactive;
        let budgets = vec![inactive, budget_for(receiver, fy)];
        let ctx = TransactionContext {
            budgets: &budgets,
            ..TransactionContext::default()
        };

        let out = tx(TransactionType::Transfer, dec!(5), fy)
            .from_fund(sender)
            .to_fund(receiver);
        assert!(TransactionValidator::validate(&out, &ctx).is_ok());

        let back = tx(TransactionType::Transfer, dec!(5), fy)
            .from_fund(receiver)
            .to_fund(sender);
        assert!(TransactionValidator::validate(&back, &ctx).is_err());
    }

    #[test]
    fn test_missing_budget_is_not_found() {
        let t = tx(TransactionType::Payment, dec!(5), FiscalYearId::new()).from_fund(FundId::new());
        let err = TransactionValidator::validate(&t, &TransactionContext::default()).unwrap_err();
        assert_eq!(err.error_code(), "BUDGET_NOT_FOUND");
    }

    #[test]
    fn test_currency_mismatch() {
        let fy = FiscalYearId::new();
        let fund = FundId::new();
        let budgets = vec![budget_for(fund, fy)];
        let t = Transaction::new(TransactionType::Payment, dec!(5), Currency::Eur, fy).from_fund(fund);
        let ctx = TransactionContext {
            budgets: &budgets,
            ..TransactionContext::default()
        };
        let err = TransactionValidator::validate(&t, &ctx).unwrap_err();
        assert_eq!(err.issue_codes(), vec!["CURRENCY_MISMATCH"]);
    }

    #[test]
    fn test_encumbrance_requires_active_expense_class_link() {
        let fy = FiscalYearId::new();
        let fund = FundId::new();
        let budget = budget_for(fund, fy);
        let class = ExpenseClassId::new();
        let budgets = vec![budget.clone()];

        let t = tx(TransactionType::Encumbrance, dec!(5), fy)
            .from_fund(fund)
            .with_expense_class(class);

        let ctx = TransactionContext {
            budgets: &budgets,
            ..TransactionContext::default()
        };
        let err = TransactionValidator::validate(&t, &ctx).unwrap_err();
        assert_eq!(err.error_code(), "BUDGET_EXPENSE_CLASS_NOT_FOUND");

        let mut link = BudgetExpenseClass::new(budget.id, class);
        link.status = ExpenseClassStatus::Inactive;
        let links = vec![link];
        let ctx = TransactionContext {
            expense_class_links: &links,
            ..ctx
        };
        let err = TransactionValidator::validate(&t, &ctx).unwrap_err();
        assert_eq!(err.issue_codes(), vec!["INACTIVE_EXPENSE_CLASS"]);

        let links = vec![BudgetExpenseClass::new(budget.id, class)];
        let ctx = TransactionContext {
            expense_class_links: &links,
            ..ctx
        };
        assert!(TransactionValidator::validate(&t, &ctx).is_ok());
    }

    #[test]
    fn test_both_limits_reported_together() {
        let mut budget = budget_for(FundId::new(), FiscalYearId::new());
        budget.allowable_encumbrance = Some(dec!(1));
        budget.allowable_expenditure = Some(dec!(100));
        budget.totals.initial_allocation = dec!(25000);
        budget.totals.awaiting_payment = Decimal::from(i32::MAX);
        budget.totals.refresh_derived();

        let err = TransactionValidator::validate_budget_limits(&budget).unwrap_err();
        assert_eq!(
            err.issue_codes(),
            vec![
                "ALLOWABLE_ENCUMBRANCE_LIMIT_EXCEEDED",
                "ALLOWABLE_EXPENDITURE_LIMIT_EXCEEDED"
            ]
        );
    }

    #[test]
    fn test_limits_within_bounds_or_unset() {
        let mut budget = budget_for(FundId::new(), FiscalYearId::new());
        budget.totals.initial_allocation = dec!(1000);
        budget.totals.encumbered = dec!(900);
        budget.totals.refresh_derived();
        assert!(TransactionValidator::validate_budget_limits(&budget).is_ok());

        budget.allowable_encumbrance = Some(dec!(90));
        assert!(TransactionValidator::validate_budget_limits(&budget).is_ok());

        budget.totals.expenditures = dec!(0.01);
        budget.totals.refresh_derived();
        let err = TransactionValidator::validate_budget_limits(&budget).unwrap_err();
        assert_eq!(err.issue_codes(), vec!["ALLOWABLE_ENCUMBRANCE_LIMIT_EXCEEDED"]);
    }

    #[test]
    fn test_release_requires_encumbrance() {
        let payment = tx(TransactionType::Payment, dec!(1), FiscalYearId::new());
        let err = TransactionValidator::validate_encumbrance_operation(&payment).unwrap_err();
        assert_eq!(err.to_string(), "Encumbrance expected");

        let encumbrance = tx(TransactionType::Encumbrance, dec!(1), FiscalYearId::new());
        assert!(TransactionValidator::validate_encumbrance_operation(&encumbrance).is_ok());
    }
}
