//! Error types for treasury authorization

use crate::{SessionId, SessionStatus};

/// Errors that can occur in authorization operations
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Wrong secret for a role; the caller may retry, subject to rate
    /// limiting. Never retried automatically by the core.
    #[error("Invalid credential")]
    InvalidCredential,

    /// Too many consecutive failed attempts for this session and role
    #[error("Rate limited: retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: i64 },

    /// Operation attempted on a terminal or expired session; recoverable
    /// only by creating a new session
    #[error("Session not actionable: status {status}")]
    SessionNotActionable { status: SessionStatus },

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Unknown officer role: {0}")]
    UnknownOfficerRole(String),

    /// Requirement table inconsistent; fatal at configuration load time
    #[error("Policy configuration error: {0}")]
    PolicyConfiguration(String),

    /// Transient storage failure; retryable with backoff, never treated
    /// as "not approved"
    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Result type alias for authorization operations
pub type AuthzResult<T> = Result<T, AuthzError>;
