//! Transaction descriptors: what a session is authorizing
//!
//! The descriptor is opaque to the authorization core. Amount, recipient,
//! and bank details ride along for display and audit; only the transaction
//! type participates in requirement lookup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Treasury transaction classes that require multi-signature authorization
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Transfer,
    Withdrawal,
    Disbursement,
}

impl TransactionType {
    pub const ALL: [TransactionType; 3] = [
        TransactionType::Transfer,
        TransactionType::Withdrawal,
        TransactionType::Disbursement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Transfer => "transfer",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Disbursement => "disbursement",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A monetary amount in minor units
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(pub u64);

impl Amount {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Describes the treasury transaction a session is collecting signatures for
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionDescriptor {
    /// Transaction class, used for requirement lookup
    pub transaction_type: TransactionType,
    /// Amount in minor units
    pub amount: Amount,
    /// Recipient account or member reference
    pub recipient: String,
    /// Human-readable purpose
    pub description: String,
    /// Free-form bank details, not interpreted by the core
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bank_details: BTreeMap<String, String>,
}

impl TransactionDescriptor {
    pub fn new(
        transaction_type: TransactionType,
        amount: Amount,
        recipient: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            transaction_type,
            amount,
            recipient: recipient.into(),
            description: description.into(),
            bank_details: BTreeMap::new(),
        }
    }

    pub fn with_bank_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.bank_details.insert(key.into(), value.into());
        self
    }
}
