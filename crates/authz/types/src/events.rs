//! Domain events emitted by the authorization engine
//!
//! The engine never moves money. The ledger/execution service subscribes
//! to `SessionApproved` and reacts; notification fan-out subscribes to the
//! rest.

use crate::{OfficerRole, SessionId};
use serde::{Deserialize, Serialize};

/// Lifecycle events published on the authorization event bus
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuthzEvent {
    /// One officer's credential was accepted for a pending session
    OfficerAuthorized {
        session_id: SessionId,
        role: OfficerRole,
    },
    /// The threshold was satisfied; the transaction may execute
    SessionApproved { session_id: SessionId },
    /// The TTL elapsed before the threshold was met
    SessionExpired { session_id: SessionId },
    /// The session was explicitly aborted
    SessionCancelled {
        session_id: SessionId,
        reason: String,
    },
}

impl AuthzEvent {
    /// Stable name used for counters and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            AuthzEvent::OfficerAuthorized { .. } => "officer_authorized",
            AuthzEvent::SessionApproved { .. } => "session_approved",
            AuthzEvent::SessionExpired { .. } => "session_expired",
            AuthzEvent::SessionCancelled { .. } => "session_cancelled",
        }
    }

    /// The session the event belongs to
    pub fn session_id(&self) -> &SessionId {
        match self {
            AuthzEvent::OfficerAuthorized { session_id, .. }
            | AuthzEvent::SessionApproved { session_id }
            | AuthzEvent::SessionExpired { session_id }
            | AuthzEvent::SessionCancelled { session_id, .. } => session_id,
        }
    }
}
