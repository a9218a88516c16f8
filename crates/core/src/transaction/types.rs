//! Transaction domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use acqledger_shared::types::{Currency, ExpenseClassId, FiscalYearId, FundId, TransactionId};

/// Transaction type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Grants money to a fund or removes it.
    Allocation,
    /// Moves money between two funds.
    Transfer,
    /// Transfer created by the fiscal year rollover.
    RolloverTransfer,
    /// Reservation against future spend.
    Encumbrance,
    /// Payment awaiting confirmation.
    PendingPayment,
    /// Confirmed payment.
    Payment,
    /// Reversal of recorded spend.
    Credit,
}

impl TransactionType {
    /// Every transaction type.
    pub const ALL: [Self; 7] = [
        Self::Allocation,
        Self::Transfer,
        Self::RolloverTransfer,
        Self::Encumbrance,
        Self::PendingPayment,
        Self::Payment,
        Self::Credit,
    ];

    /// Wire name (e.g. `PENDING_PAYMENT`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allocation => "ALLOCATION",
            Self::Transfer => "TRANSFER",
            Self::RolloverTransfer => "ROLLOVER_TRANSFER",
            Self::Encumbrance => "ENCUMBRANCE",
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::Payment => "PAYMENT",
            Self::Credit => "CREDIT",
        }
    }

    /// Human readable label (e.g. `Pending payment`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Allocation => "Allocation",
            Self::Transfer => "Transfer",
            Self::RolloverTransfer => "Rollover transfer",
            Self::Encumbrance => "Encumbrance",
            Self::PendingPayment => "Pending payment",
            Self::Payment => "Payment",
            Self::Credit => "Credit",
        }
    }

    /// Returns true for movements of funding between funds.
    #[must_use]
    pub const fn is_funding_movement(self) -> bool {
        matches!(
            self,
            Self::Allocation | Self::Transfer | Self::RolloverTransfer
        )
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionSource {
    /// Entered by a user.
    #[default]
    User,
    /// Created from a purchase order line.
    PoLine,
    /// Created from an invoice.
    Invoice,
    /// Created by the fiscal year rollover.
    FiscalYear,
}

/// Side a fund plays in a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FundRole {
    /// The fund money leaves (`fromFundId`).
    From,
    /// The fund money enters (`toFundId`).
    To,
}

/// Encumbrance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EncumbranceStatus {
    /// Reservation still holds.
    #[default]
    Unreleased,
    /// Reservation has been released.
    Released,
}

/// Result of releasing an encumbrance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Status moved from UNRELEASED to RELEASED.
    Released,
    /// The encumbrance was already released; nothing changed.
    AlreadyReleased,
}

/// Sub-ledger embedded in ENCUMBRANCE transactions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encumbrance {
    /// Amount originally reserved.
    pub initial_amount_encumbered: Decimal,
    /// Part of the reservation currently awaiting payment.
    pub amount_awaiting_payment: Decimal,
    /// Part of the reservation already spent.
    pub amount_expended: Decimal,
    /// Release status.
    pub status: EncumbranceStatus,
}

impl Encumbrance {
    /// Creates an unreleased encumbrance reserving `amount`.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self {
            initial_amount_encumbered: amount,
            ..Self::default()
        }
    }

    /// Marks the encumbrance released. Idempotent.
    pub fn release(&mut self) -> ReleaseOutcome {
        match self.status {
            EncumbranceStatus::Released => ReleaseOutcome::AlreadyReleased,
            EncumbranceStatus::Unreleased => {
                self.status = EncumbranceStatus::Released;
                ReleaseOutcome::Released
            }
        }
    }

    /// Moves `amount` from expended back into awaiting payment.
    ///
    /// `amount` is rounded to `currency` once, so
    /// `amount_awaiting_payment + amount_expended` is unchanged.
    pub fn move_to_awaiting_payment(&mut self, amount: Decimal, currency: Currency) {
        let amount = currency.round(amount);
        self.amount_awaiting_payment = currency.round(self.amount_awaiting_payment + amount);
        self.amount_expended = currency.round(self.amount_expended - amount);
    }
}

/// A financial transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// Amount. Non-negative except for pending payments.
    pub amount: Decimal,
    /// Currency of `amount`.
    pub currency: Currency,
    /// Transaction type.
    pub transaction_type: TransactionType,
    /// Fiscal year the transaction belongs to.
    pub fiscal_year_id: FiscalYearId,
    /// Fund money leaves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_fund_id: Option<FundId>,
    /// Fund money enters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_fund_id: Option<FundId>,
    /// Expense class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_class_id: Option<ExpenseClassId>,
    /// Origin.
    #[serde(default)]
    pub source: TransactionSource,
    /// Free text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation timestamp; orders allocations.
    pub created_date: DateTime<Utc>,
    /// Encumbrance sub-ledger, present only for ENCUMBRANCE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encumbrance: Option<Encumbrance>,
}

impl Transaction {
    /// Creates a transaction stamped with the current time.
    ///
    /// ENCUMBRANCE transactions get a fresh sub-ledger reserving `amount`.
    #[must_use]
    pub fn new(
        transaction_type: TransactionType,
        amount: Decimal,
        currency: Currency,
        fiscal_year_id: FiscalYearId,
    ) -> Self {
        let encumbrance =
            (transaction_type == TransactionType::Encumbrance).then(|| Encumbrance::new(amount));
        Self {
            id: TransactionId::new(),
            amount,
            currency,
            transaction_type,
            fiscal_year_id,
            from_fund_id: None,
            to_fund_id: None,
            expense_class_id: None,
            source: TransactionSource::default(),
            description: None,
            created_date: Utc::now(),
            encumbrance,
        }
    }

    /// Sets the sending fund.
    #[must_use]
    pub fn from_fund(mut self, fund_id: FundId) -> Self {
        self.from_fund_id = Some(fund_id);
        self
    }

    /// Sets the receiving fund.
    #[must_use]
    pub fn to_fund(mut self, fund_id: FundId) -> Self {
        self.to_fund_id = Some(fund_id);
        self
    }

    /// Sets the expense class.
    #[must_use]
    pub fn with_expense_class(mut self, expense_class_id: ExpenseClassId) -> Self {
        self.expense_class_id = Some(expense_class_id);
        self
    }

    /// Overrides the creation timestamp.
    #[must_use]
    pub fn created_at(mut self, created_date: DateTime<Utc>) -> Self {
        self.created_date = created_date;
        self
    }

    /// Returns true when both fund ids are set.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.from_fund_id.is_some() && self.to_fund_id.is_some()
    }

    /// Returns true if `fund_id` plays `role` in this transaction.
    #[must_use]
    pub fn has_role(&self, fund_id: FundId, role: FundRole) -> bool {
        match role {
            FundRole::From => self.from_fund_id == Some(fund_id),
            FundRole::To => self.to_fund_id == Some(fund_id),
        }
    }

    /// Returns true if `fund_id` appears in either role.
    #[must_use]
    pub fn touches(&self, fund_id: FundId) -> bool {
        self.has_role(fund_id, FundRole::From) || self.has_role(fund_id, FundRole::To)
    }

    /// Distinct fund ids referenced by this transaction.
    #[must_use]
    pub fn fund_ids(&self) -> Vec<FundId> {
        let mut ids: Vec<FundId> = self.from_fund_id.into_iter().chain(self.to_fund_id).collect();
        ids.dedup();
        ids
    }

    /// Ordering key for "which allocation came first": creation time, then id.
    #[must_use]
    pub fn chronological_key(&self) -> (DateTime<Utc>, TransactionId) {
        (self.created_date, self.id)
    }
}
