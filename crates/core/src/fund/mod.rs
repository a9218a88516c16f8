//! Funds and their allocation linkage.

use serde::{Deserialize, Serialize};

use acqledger_shared::types::{FundId, LedgerId};

/// Fund status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FundStatus {
    /// Fund can receive transactions.
    #[default]
    Active,
    /// Fund is frozen.
    Frozen,
    /// Fund is retired.
    Inactive,
}

/// A fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fund {
    /// Fund ID.
    pub id: FundId,
    /// Short code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Owning ledger.
    pub ledger_id: LedgerId,
    /// Status.
    #[serde(default)]
    pub fund_status: FundStatus,
    /// Funds allowed to send money to this fund. Empty means unrestricted.
    #[serde(default)]
    pub allocated_from_ids: Vec<FundId>,
    /// Funds this fund may send money to. Empty means unrestricted.
    #[serde(default)]
    pub allocated_to_ids: Vec<FundId>,
}

impl Fund {
    /// Creates an unrestricted active fund.
    #[must_use]
    pub fn new(code: impl Into<String>, ledger_id: LedgerId) -> Self {
        let code = code.into();
        Self {
            id: FundId::new(),
            name: code.clone(),
            code,
            ledger_id,
            fund_status: FundStatus::Active,
            allocated_from_ids: Vec::new(),
            allocated_to_ids: Vec::new(),
        }
    }

    /// Returns true if this fund's linkage accepts money from `sender`.
    #[must_use]
    pub fn accepts_from(&self, sender: FundId) -> bool {
        self.allocated_from_ids.is_empty() || self.allocated_from_ids.contains(&sender)
    }

    /// Returns true if this fund's linkage allows sending money to `receiver`.
    #[must_use]
    pub fn sends_to(&self, receiver: FundId) -> bool {
        self.allocated_to_ids.is_empty() || self.allocated_to_ids.contains(&receiver)
    }
}
