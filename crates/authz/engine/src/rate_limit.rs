//! Rate limiting for credential attempts
//!
//! Tracks consecutive failed attempts per (session, role) pair. Once the
//! failure budget is spent, further attempts are locked out until the
//! cooldown window passes. A successful verification clears the pair.

use authz_types::{AuthzError, AuthzResult, OfficerRole, SessionId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rate limiter configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Consecutive failures allowed before lockout
    pub max_failures: u32,
    /// Lockout duration in seconds
    pub cooldown_secs: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            cooldown_secs: 900,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct AttemptState {
    consecutive_failures: u32,
    locked_until: Option<DateTime<Utc>>,
}

/// Consecutive-failure tracker per (session, role) pair
#[derive(Clone, Debug)]
pub struct AttemptTracker {
    config: RateLimitConfig,
    attempts: HashMap<(SessionId, OfficerRole), AttemptState>,
}

impl AttemptTracker {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            attempts: HashMap::new(),
        }
    }

    /// Check whether an attempt is currently allowed
    pub fn check(&self, session_id: &SessionId, role: OfficerRole, now: DateTime<Utc>) -> AuthzResult<()> {
        let Some(state) = self.attempts.get(&(session_id.clone(), role)) else {
            return Ok(());
        };
        match state.locked_until {
            Some(until) if now < until => Err(AuthzError::RateLimited {
                retry_after_secs: (until - now).num_seconds().max(1),
            }),
            _ => Ok(()),
        }
    }

    /// Record a failed verification attempt
    pub fn record_failure(&mut self, session_id: &SessionId, role: OfficerRole, now: DateTime<Utc>) {
        let state = self
            .attempts
            .entry((session_id.clone(), role))
            .or_default();

        // An expired lockout starts a fresh failure budget
        if matches!(state.locked_until, Some(until) if now >= until) {
            state.consecutive_failures = 0;
            state.locked_until = None;
        }

        state.consecutive_failures += 1;
        if state.consecutive_failures >= self.config.max_failures {
            state.locked_until = Some(now + Duration::seconds(self.config.cooldown_secs));
        }
    }

    /// Clear the pair after a successful verification
    pub fn record_success(&mut self, session_id: &SessionId, role: OfficerRole) {
        self.attempts.remove(&(session_id.clone(), role));
    }

    /// Drop tracking for every role of a session (terminal sessions)
    pub fn forget_session(&mut self, session_id: &SessionId) {
        self.attempts.retain(|(id, _), _| id != session_id);
    }
}
