//! The authorization engine: session lifecycle coordination
//!
//! The engine owns the session state machine from creation through
//! signature collection to approval or expiry. It is the only writer of
//! terminal states: expiry commits here (lazily on submission and from the
//! periodic sweep), never from client-side clock math. The engine emits
//! domain events for the ledger and notification services and records an
//! audit receipt for every lifecycle action, including rejected
//! credential attempts.

use crate::{AttemptTracker, CredentialVerifier, EventBus, RateLimitConfig, SessionStore};
use authz_types::{
    AuditActor, AuditLog, AuditReceipt, AuthorizationSession, AuthzError, AuthzEvent,
    AuthzResult, OfficerDirectory, OfficerRole, RequirementTable, SessionId, SessionStatus,
    SessionView, TransactionDescriptor,
};
use chrono::{DateTime, Duration, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Engine configuration
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Session time-to-live in seconds
    pub session_ttl_secs: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Observed production window: 24 hours
            session_ttl_secs: 86_400,
        }
    }
}

impl EngineConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_secs)
    }
}

/// Coordinates multi-signature authorization sessions
///
/// Single-writer: callers serialize state-changing methods behind a lock.
pub struct AuthorizationEngine {
    config: EngineConfig,
    table: RequirementTable,
    directory: OfficerDirectory,
    verifier: CredentialVerifier,
    attempts: AttemptTracker,
    store: Box<dyn SessionStore>,
    events: EventBus,
    audit: AuditLog,
}

impl AuthorizationEngine {
    /// Build an engine, validating the requirement table against the
    /// seated officer pool
    ///
    /// A `PolicyConfiguration` error here must prevent service startup.
    pub fn new(
        config: EngineConfig,
        table: RequirementTable,
        directory: OfficerDirectory,
        verifier: CredentialVerifier,
        rate_limit: RateLimitConfig,
        store: Box<dyn SessionStore>,
    ) -> AuthzResult<Self> {
        table.validate(directory.seated_count())?;
        Ok(Self {
            config,
            table,
            directory,
            verifier,
            attempts: AttemptTracker::new(rate_limit),
            store,
            events: EventBus::new(),
            audit: AuditLog::new(),
        })
    }

    /// Open a new authorization session for a transaction
    ///
    /// The requirement snapshot is taken here; later table edits never
    /// affect this session.
    pub fn create_session(
        &mut self,
        transaction: TransactionDescriptor,
        initiator_role: OfficerRole,
        now: DateTime<Utc>,
    ) -> AuthzResult<SessionId> {
        let requirement = self
            .table
            .requirement_for(transaction.transaction_type, initiator_role)?;
        let session = AuthorizationSession::new(
            transaction,
            requirement,
            now,
            self.config.session_ttl(),
        );
        let session_id = session.id.clone();

        self.audit.record(
            AuditReceipt::new(
                session_id.clone(),
                AuditActor::Officer(initiator_role),
                "session_created",
                format!(
                    "{} of {} to {} awaiting {} signatories",
                    session.transaction.transaction_type,
                    session.transaction.amount,
                    session.transaction.recipient,
                    session.requirement.required_count
                ),
                now,
            )
            .with_metadata("amount", session.transaction.amount.to_string())
            .with_metadata("initiator", initiator_role.as_str()),
        );
        self.store.put(session)?;

        info!(
            session_id = %session_id,
            initiator = %initiator_role,
            "Authorization session created"
        );

        Ok(session_id)
    }

    /// Submit one officer's credential for a pending session
    ///
    /// Expiry takes precedence over everything: a past-deadline session is
    /// committed to `Expired` before the credential is even looked at.
    /// A failed verification leaves the session untouched. Re-submitting a
    /// role that already counted is a no-op returning the current view,
    /// including after the session has been approved.
    pub fn submit_authorization(
        &mut self,
        session_id: &SessionId,
        role: OfficerRole,
        secret: &str,
        now: DateTime<Utc>,
    ) -> AuthzResult<SessionView> {
        let mut session = self
            .store
            .get(session_id)?
            .ok_or_else(|| AuthzError::SessionNotFound(session_id.clone()))?;

        if session.is_past_deadline(now) {
            self.commit_expiry(&mut session, now)?;
            return Err(AuthzError::SessionNotActionable {
                status: session.status,
            });
        }

        if session.status.is_terminal() {
            // Retrying a previously successful authorization after approval
            // is a safe no-op, not an error
            if session.status == SessionStatus::Approved
                && session.authorizations.contains_key(&role)
                && self.verifier.verify(role, secret)
            {
                return Ok(session.view(now));
            }
            return Err(AuthzError::SessionNotActionable {
                status: session.status,
            });
        }

        // A role with no seated officer cannot sign, regardless of secret
        if !self
            .directory
            .eligible_roles(session.transaction.transaction_type)
            .contains(&role)
        {
            warn!(session_id = %session_id, role = %role, "No seated officer for role");
            return Err(AuthzError::InvalidCredential);
        }

        self.attempts.check(session_id, role, now)?;

        if !self.verifier.verify(role, secret) {
            self.attempts.record_failure(session_id, role, now);
            self.audit.record(AuditReceipt::new(
                session_id.clone(),
                AuditActor::Officer(role),
                "credential_rejected",
                format!("{} submitted an invalid credential", role),
                now,
            ));
            warn!(session_id = %session_id, role = %role, "Credential rejected");
            return Err(AuthzError::InvalidCredential);
        }
        self.attempts.record_success(session_id, role);

        let first_authorization = !session.authorizations.contains_key(&role);
        let newly_approved = session.record_authorization(role, now);
        self.store.put(session.clone())?;

        if first_authorization {
            let signer = self
                .directory
                .officer_for(role)
                .map(|o| o.display_name.clone())
                .unwrap_or_else(|| role.to_string());
            self.audit.record(
                AuditReceipt::new(
                    session_id.clone(),
                    AuditActor::Officer(role),
                    "officer_authorized",
                    format!("{} authorized the transaction", role),
                    now,
                )
                .with_metadata("officer", signer),
            );
            self.events.publish(AuthzEvent::OfficerAuthorized {
                session_id: session_id.clone(),
                role,
            });
            debug!(
                session_id = %session_id,
                role = %role,
                authorized = session.authorized_count(),
                required = session.requirement.required_count,
                "Authorization recorded"
            );
        }

        if newly_approved {
            self.attempts.forget_session(session_id);
            self.audit.record(AuditReceipt::new(
                session_id.clone(),
                AuditActor::Officer(role),
                "session_approved",
                "Signatory threshold satisfied",
                now,
            ));
            self.events.publish(AuthzEvent::SessionApproved {
                session_id: session_id.clone(),
            });
            info!(session_id = %session_id, "Signatory threshold satisfied");
        }

        Ok(session.view(now))
    }

    /// Transition a past-deadline pending session to Expired
    ///
    /// Idempotent and safe to call redundantly; returns true only for the
    /// call that commits the transition, so side effects never double-fire.
    pub fn expire_session(
        &mut self,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> AuthzResult<bool> {
        let mut session = self
            .store
            .get(session_id)?
            .ok_or_else(|| AuthzError::SessionNotFound(session_id.clone()))?;

        if !session.is_past_deadline(now) {
            return Ok(false);
        }
        self.commit_expiry(&mut session, now)?;
        Ok(true)
    }

    /// Expire every pending session past its deadline
    ///
    /// Runs from the periodic sweep so sessions expire even if nobody
    /// queries them. Returns the affected ids for audit logging.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> AuthzResult<Vec<SessionId>> {
        let mut expired = Vec::new();
        for session_id in self.store.pending_ids()? {
            if self.expire_session(&session_id, now)? {
                expired.push(session_id);
            }
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "Expired stale authorization sessions");
        }
        Ok(expired)
    }

    /// Abort a pending session
    pub fn cancel_session(
        &mut self,
        session_id: &SessionId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AuthzResult<()> {
        let mut session = self
            .store
            .get(session_id)?
            .ok_or_else(|| AuthzError::SessionNotFound(session_id.clone()))?;

        if !session.mark_cancelled(reason) {
            return Err(AuthzError::SessionNotActionable {
                status: session.status,
            });
        }
        self.store.put(session.clone())?;
        self.attempts.forget_session(session_id);

        self.audit.record(AuditReceipt::new(
            session_id.clone(),
            AuditActor::System,
            "session_cancelled",
            format!("Session cancelled: {}", reason),
            now,
        ));
        self.events.publish(AuthzEvent::SessionCancelled {
            session_id: session_id.clone(),
            reason: reason.to_string(),
        });
        warn!(session_id = %session_id, reason = reason, "Session cancelled");

        Ok(())
    }

    /// Current progress of a session; never mutates state
    pub fn status(&self, session_id: &SessionId, now: DateTime<Utc>) -> AuthzResult<SessionView> {
        let session = self
            .store
            .get(session_id)?
            .ok_or_else(|| AuthzError::SessionNotFound(session_id.clone()))?;
        Ok(session.view(now))
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<AuthzEvent> {
        self.events.subscribe()
    }

    /// The accountability record
    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Events published so far, by kind
    pub fn event_count_of(&self, kind: &str) -> u64 {
        self.events.count_of(kind)
    }

    /// Number of stored sessions
    pub fn session_count(&self) -> usize {
        self.store.len()
    }

    fn commit_expiry(
        &mut self,
        session: &mut AuthorizationSession,
        now: DateTime<Utc>,
    ) -> AuthzResult<()> {
        if !session.mark_expired(now) {
            return Ok(());
        }
        self.store.put(session.clone())?;
        self.attempts.forget_session(&session.id);
        self.audit.record(AuditReceipt::new(
            session.id.clone(),
            AuditActor::System,
            "session_expired",
            format!(
                "Deadline passed with {} of {} signatories",
                session.authorized_count(),
                session.requirement.required_count
            ),
            now,
        ));
        self.events.publish(AuthzEvent::SessionExpired {
            session_id: session.id.clone(),
        });
        warn!(session_id = %session.id, "Authorization session expired");
        Ok(())
    }
}
