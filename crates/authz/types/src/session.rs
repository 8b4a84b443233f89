//! Authorization sessions: the mutable aggregate root
//!
//! One session tracks one transaction attempt from creation through a
//! single terminal state. Authorizations are keyed by role, at most one
//! entry per role; re-authorizing a role overwrites its timestamp rather
//! than duplicating it.

use crate::{AuthorizationRequirement, OfficerRole, TransactionDescriptor};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Unique identifier for an authorization session
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new random SessionId
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Create a SessionId from a known string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Short display form (first 8 chars)
    pub fn short(&self) -> String {
        self.0.chars().take(8).collect()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of an authorization session
///
/// `Pending` is the only live state; the other three are terminal and no
/// transition ever leaves them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Collecting authorizations
    #[default]
    Pending,
    /// Threshold satisfied; the transaction may execute
    Approved,
    /// TTL elapsed before the threshold was met
    Expired,
    /// Explicitly aborted by the initiator or an admin
    Cancelled,
}

impl SessionStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, SessionStatus::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Approved => "approved",
            SessionStatus::Expired => "expired",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One pending authorization workflow tied to a single transaction attempt
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthorizationSession {
    /// Unique session identifier
    pub id: SessionId,
    /// The transaction being authorized
    pub transaction: TransactionDescriptor,
    /// Requirement snapshot taken at creation; never recomputed mid-flight
    pub requirement: AuthorizationRequirement,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// Hard deadline for collecting authorizations
    pub expires_at: DateTime<Utc>,
    /// Authorizations collected so far, at most one per role
    pub authorizations: BTreeMap<OfficerRole, DateTime<Utc>>,
    /// Current lifecycle state
    pub status: SessionStatus,
    /// When the threshold was satisfied, if it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    /// Why the session was cancelled, if it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
}

impl AuthorizationSession {
    /// Create a new pending session with the requirement snapshot
    pub fn new(
        transaction: TransactionDescriptor,
        requirement: AuthorizationRequirement,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: SessionId::generate(),
            transaction,
            requirement,
            created_at: now,
            expires_at: now + ttl,
            authorizations: BTreeMap::new(),
            status: SessionStatus::Pending,
            approved_at: None,
            cancel_reason: None,
        }
    }

    pub fn with_id(mut self, id: SessionId) -> Self {
        self.id = id;
        self
    }

    /// Roles that have authorized so far
    pub fn authorized_roles(&self) -> BTreeSet<OfficerRole> {
        self.authorizations.keys().copied().collect()
    }

    /// Number of distinct roles that have authorized
    pub fn authorized_count(&self) -> usize {
        self.authorizations.len()
    }

    /// Whether a pending session has passed its deadline
    ///
    /// Terminal sessions are never "expired" in this sense; the answer is
    /// about whether an expiry transition is due, not about the state.
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        self.status.is_pending() && now >= self.expires_at
    }

    /// Record an authorization for a role, overwriting any earlier one
    ///
    /// Returns true exactly when this call moved the session from Pending
    /// to Approved. Calling again with an already-counted role keeps the
    /// count stable and returns false.
    pub fn record_authorization(&mut self, role: OfficerRole, now: DateTime<Utc>) -> bool {
        debug_assert!(self.status.is_pending());
        self.authorizations.insert(role, now);
        if self.requirement.is_satisfied_by(&self.authorized_roles()) {
            self.status = SessionStatus::Approved;
            self.approved_at = Some(now);
            return true;
        }
        false
    }

    /// Transition a past-deadline pending session to Expired
    ///
    /// Idempotent: terminal sessions and pending sessions still inside
    /// their window are untouched.
    pub fn mark_expired(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_past_deadline(now) {
            self.status = SessionStatus::Expired;
            return true;
        }
        false
    }

    /// Abort a pending session
    pub fn mark_cancelled(&mut self, reason: impl Into<String>) -> bool {
        if self.status.is_pending() {
            self.status = SessionStatus::Cancelled;
            self.cancel_reason = Some(reason.into());
            return true;
        }
        false
    }

    /// Pure status projection for callers; never mutates state
    ///
    /// A pending session past its deadline reports Expired here even
    /// before the authoritative transition has committed, so displays stay
    /// honest without trusting client-side clocks.
    pub fn view(&self, now: DateTime<Utc>) -> SessionView {
        let status = if self.is_past_deadline(now) {
            SessionStatus::Expired
        } else {
            self.status
        };
        let time_remaining_secs = if status.is_pending() {
            (self.expires_at - now).num_seconds().max(0)
        } else {
            0
        };
        SessionView {
            session_id: self.id.clone(),
            status,
            authorized_count: self.authorized_count() as u32,
            required_count: self.requirement.required_count,
            authorized_roles: self.authorized_roles(),
            time_remaining_secs,
            expires_at: self.expires_at,
        }
    }
}

/// Read-only projection of a session's progress
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub authorized_count: u32,
    pub required_count: u32,
    pub authorized_roles: BTreeSet<OfficerRole>,
    /// Seconds until expiry, clamped to zero once terminal or past deadline
    pub time_remaining_secs: i64,
    pub expires_at: DateTime<Utc>,
}
