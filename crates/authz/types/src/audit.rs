//! Audit receipts: the accountability record
//!
//! Every significant action on a session produces a receipt, including
//! rejected credential attempts. The log is append-only.

use crate::{OfficerRole, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Who triggered an audited action
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditActor {
    /// A seated officer acting in a role
    Officer(OfficerRole),
    /// The engine itself (sweeps, lazy expiry)
    System,
}

impl std::fmt::Display for AuditActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditActor::Officer(role) => write!(f, "{}", role),
            AuditActor::System => write!(f, "system"),
        }
    }
}

/// A receipt issued for one session lifecycle action
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditReceipt {
    /// Unique receipt identifier
    pub receipt_id: String,
    /// The session the action belongs to
    pub session_id: SessionId,
    /// Who triggered the action
    pub actor: AuditActor,
    /// Machine-readable action name
    pub action: String,
    /// Human-readable description
    pub description: String,
    /// When the receipt was created
    pub timestamp: DateTime<Utc>,
    /// Additional metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl AuditReceipt {
    pub fn new(
        session_id: SessionId,
        actor: AuditActor,
        action: impl Into<String>,
        description: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            receipt_id: uuid::Uuid::new_v4().to_string(),
            session_id,
            actor,
            action: action.into(),
            description: description.into(),
            timestamp,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Append-only log of audit receipts
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuditLog {
    receipts: Vec<AuditReceipt>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            receipts: Vec::new(),
        }
    }

    /// Append a receipt
    pub fn record(&mut self, receipt: AuditReceipt) {
        self.receipts.push(receipt);
    }

    /// All receipts in insertion order
    pub fn receipts(&self) -> &[AuditReceipt] {
        &self.receipts
    }

    /// Receipts for one session, in insertion order
    pub fn for_session(&self, session_id: &SessionId) -> Vec<&AuditReceipt> {
        self.receipts
            .iter()
            .filter(|r| &r.session_id == session_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }
}
