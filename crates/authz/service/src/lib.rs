#![deny(unsafe_code)]

//! REST surface for the Mobigate treasury authorization engine
//!
//! The engine is a single-writer state machine; all state-changing calls
//! are serialized behind one async lock so near-simultaneous officer
//! submissions can never lose an authorization and the approval
//! transition fires exactly once. The background sweep shares the same
//! lock, so sweep and submission cannot produce conflicting terminal
//! writes.

pub mod config;

use authz_engine::{
    AuthorizationEngine, CredentialVerifier, EngineConfig, FileStore, MemoryStore, SessionStore,
};
use authz_types::{
    AuthzError, OfficerRole, SessionId, SessionView, TransactionDescriptor,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use config::{
    load_credentials, load_officers, load_requirement_table, ServiceConfig, SessionStorageConfig,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Shared service state
#[derive(Clone)]
pub struct ServiceState {
    pub engine: Arc<Mutex<AuthorizationEngine>>,
}

impl std::fmt::Debug for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceState").finish_non_exhaustive()
    }
}

impl ServiceState {
    /// Load configuration, validate policy, and build the engine
    ///
    /// A `PolicyConfiguration` error here aborts startup.
    pub fn bootstrap(config: ServiceConfig) -> Result<Self, AuthzError> {
        let table = load_requirement_table(config.requirement_table_path.as_deref())?;
        let directory = load_officers(config.officers_path.as_deref())?;
        let credentials = load_credentials(&config.credentials_path)?;

        let store: Box<dyn SessionStore> = match &config.session_storage {
            SessionStorageConfig::Memory => Box::new(MemoryStore::new()),
            SessionStorageConfig::File(path) => Box::new(FileStore::load(path)?),
        };

        let engine = AuthorizationEngine::new(
            EngineConfig {
                session_ttl_secs: config.session_ttl_secs,
            },
            table,
            directory,
            CredentialVerifier::new(credentials),
            config.rate_limit.clone(),
            store,
        )?;

        Ok(Self {
            engine: Arc::new(Mutex::new(engine)),
        })
    }

    /// Wrap an already-built engine
    pub fn from_engine(engine: AuthorizationEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }
}

/// Spawn the periodic expiry sweep
///
/// Runs independently of any read request so sessions expire even if
/// nobody queries them.
pub fn spawn_sweep(state: ServiceState, every: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let mut engine = state.engine.lock().await;
            if let Err(e) = engine.sweep_expired(Utc::now()) {
                warn!(error = %e, "Expiry sweep failed; will retry next tick");
            }
        }
    })
}

pub fn build_router(state: ServiceState) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/sessions", post(create_session))
        .route("/v1/sessions/:session_id", get(session_status))
        .route("/v1/sessions/:session_id/authorizations", post(submit_authorization))
        .route("/v1/sessions/:session_id/cancel", post(cancel_session))
        .with_state(state)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Authz(#[from] AuthzError),
}

fn status_for(error: &AuthzError) -> StatusCode {
    match error {
        AuthzError::InvalidCredential => StatusCode::UNAUTHORIZED,
        AuthzError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        AuthzError::SessionNotActionable { .. } => StatusCode::CONFLICT,
        AuthzError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        AuthzError::UnknownOfficerRole(_) => StatusCode::BAD_REQUEST,
        AuthzError::PolicyConfiguration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        AuthzError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError::Authz(error) = self;
        let status = status_for(&error);
        (
            status,
            Json(serde_json::json!({ "error": error.to_string() })),
        )
            .into_response()
    }
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    sessions: usize,
}

async fn health(State(state): State<ServiceState>) -> Json<HealthResponse> {
    let engine = state.engine.lock().await;
    Json(HealthResponse {
        status: "ok",
        service: "authz-service",
        sessions: engine.session_count(),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    pub transaction: TransactionDescriptor,
    pub initiator_role: OfficerRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: SessionId,
    pub view: SessionView,
}

async fn create_session(
    State(state): State<ServiceState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let now = Utc::now();
    let mut engine = state.engine.lock().await;
    let session_id = engine.create_session(request.transaction, request.initiator_role, now)?;
    let view = engine.status(&session_id, now)?;
    Ok(Json(CreateSessionResponse { session_id, view }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeRequest {
    pub role: OfficerRole,
    pub secret: String,
}

async fn submit_authorization(
    Path(session_id): Path<String>,
    State(state): State<ServiceState>,
    Json(request): Json<AuthorizeRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let mut engine = state.engine.lock().await;
    let view = engine.submit_authorization(
        &SessionId::new(session_id),
        request.role,
        &request.secret,
        Utc::now(),
    )?;
    Ok(Json(view))
}

async fn session_status(
    Path(session_id): Path<String>,
    State(state): State<ServiceState>,
) -> Result<Json<SessionView>, ApiError> {
    let engine = state.engine.lock().await;
    let view = engine.status(&SessionId::new(session_id), Utc::now())?;
    Ok(Json(view))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

async fn cancel_session(
    Path(session_id): Path<String>,
    State(state): State<ServiceState>,
    Json(request): Json<CancelRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let session_id = SessionId::new(session_id);
    let now = Utc::now();
    let mut engine = state.engine.lock().await;
    engine.cancel_session(&session_id, &request.reason, now)?;
    let view = engine.status(&session_id, now)?;
    info!(session_id = %session_id, "Session cancelled via API");
    Ok(Json(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use authz_engine::{CredentialSet, RateLimitConfig};
    use authz_types::{Amount, RequirementTable, SessionStatus, TransactionType};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn secret_for(role: OfficerRole) -> &'static str {
        match role {
            OfficerRole::President => "north-star-7",
            OfficerRole::Treasurer => "ledger-keeper-3",
            OfficerRole::Secretary => "minute-book-5",
            OfficerRole::FinancialSecretary => "vault-keeper-9",
        }
    }

    fn test_engine() -> AuthorizationEngine {
        let mut credentials = CredentialSet::new();
        for role in OfficerRole::ALL {
            credentials.set_secret(role, secret_for(role));
        }
        AuthorizationEngine::new(
            EngineConfig::default(),
            RequirementTable::mobigate_default(),
            config::load_officers(None).unwrap(),
            CredentialVerifier::new(credentials),
            RateLimitConfig::default(),
            Box::new(MemoryStore::new()),
        )
        .unwrap()
    }

    fn test_state() -> ServiceState {
        ServiceState::from_engine(test_engine())
    }

    fn create_payload() -> serde_json::Value {
        serde_json::json!({
            "transaction": {
                "transaction_type": "transfer",
                "amount": 100_000,
                "recipient": "member-42",
                "description": "Community hall deposit"
            },
            "initiator_role": "president"
        })
    }

    async fn post_json(
        app: &Router,
        uri: &str,
        payload: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn create_session_via_api(app: &Router) -> String {
        let (status, body) = post_json(app, "/v1/sessions", create_payload()).await;
        assert_eq!(status, StatusCode::OK);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn session_reaches_approval_through_the_api() {
        let app = build_router(test_state());
        let session_id = create_session_via_api(&app).await;

        for (role, expected_status) in [
            (OfficerRole::President, "pending"),
            (OfficerRole::Treasurer, "pending"),
            (OfficerRole::Secretary, "approved"),
        ] {
            let (status, body) = post_json(
                &app,
                &format!("/v1/sessions/{}/authorizations", session_id),
                serde_json::json!({ "role": role.as_str(), "secret": secret_for(role) }),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], expected_status);
        }

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/v1/sessions/{}", session_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let view: SessionView = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(view.status, SessionStatus::Approved);
        assert_eq!(view.authorized_count, 3);
    }

    #[tokio::test]
    async fn invalid_credential_maps_to_unauthorized() {
        let app = build_router(test_state());
        let session_id = create_session_via_api(&app).await;

        let (status, body) = post_json(
            &app,
            &format!("/v1/sessions/{}/authorizations", session_id),
            serde_json::json!({ "role": "president", "secret": "wrong" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].as_str().unwrap().contains("Invalid credential"));
    }

    #[tokio::test]
    async fn cancelled_session_rejects_further_submissions() {
        let app = build_router(test_state());
        let session_id = create_session_via_api(&app).await;

        let (status, body) = post_json(
            &app,
            &format!("/v1/sessions/{}/cancel", session_id),
            serde_json::json!({ "reason": "initiator aborted" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "cancelled");

        let (status, _) = post_json(
            &app,
            &format!("/v1/sessions/{}/authorizations", session_id),
            serde_json::json!({
                "role": "president",
                "secret": secret_for(OfficerRole::President)
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_session_maps_to_not_found() {
        let app = build_router(test_state());
        let (status, _) = post_json(
            &app,
            &format!("/v1/sessions/{}/cancel", Uuid::new_v4()),
            serde_json::json!({ "reason": "nothing here" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn concurrent_submissions_both_land() {
        let state = test_state();
        let now = Utc::now();
        let session_id = {
            let mut engine = state.engine.lock().await;
            engine
                .create_session(
                    TransactionDescriptor::new(
                        TransactionType::Transfer,
                        Amount::new(100_000),
                        "member-42",
                        "Community hall deposit",
                    ),
                    OfficerRole::President,
                    now,
                )
                .unwrap()
        };

        let mut handles = Vec::new();
        for role in [OfficerRole::President, OfficerRole::Treasurer] {
            let state = state.clone();
            let session_id = session_id.clone();
            handles.push(tokio::spawn(async move {
                let mut engine = state.engine.lock().await;
                engine.submit_authorization(&session_id, role, secret_for(role), Utc::now())
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let engine = state.engine.lock().await;
        let view = engine.status(&session_id, Utc::now()).unwrap();
        assert_eq!(view.authorized_count, 2);
        assert_eq!(view.status, SessionStatus::Pending);
    }

    #[tokio::test]
    async fn sweep_task_expires_stale_sessions() {
        let state = test_state();
        let stale_id = {
            let mut engine = state.engine.lock().await;
            engine
                .create_session(
                    TransactionDescriptor::new(
                        TransactionType::Withdrawal,
                        Amount::new(40_000),
                        "acct-main",
                        "Generator fuel",
                    ),
                    OfficerRole::Treasurer,
                    Utc::now() - chrono::Duration::hours(25),
                )
                .unwrap()
        };

        let sweep = spawn_sweep(state.clone(), std::time::Duration::from_millis(20));
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        sweep.abort();

        let engine = state.engine.lock().await;
        let view = engine.status(&stale_id, Utc::now()).unwrap();
        assert_eq!(view.status, SessionStatus::Expired);
        assert_eq!(engine.event_count_of("session_expired"), 1);
    }

    #[tokio::test]
    async fn bootstrap_rejects_inconsistent_policy() {
        let dir = std::env::temp_dir().join(format!("authz-service-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut credentials = CredentialSet::new();
        credentials.set_secret(OfficerRole::President, "north-star-7");
        let credentials_path = dir.join("credentials.json");
        std::fs::write(
            &credentials_path,
            serde_json::to_vec(&credentials).unwrap(),
        )
        .unwrap();

        let mut table = RequirementTable::mobigate_default();
        table.signatory_counts.insert(OfficerRole::President, 9);
        let table_path = dir.join("table.json");
        std::fs::write(&table_path, serde_json::to_vec(&table).unwrap()).unwrap();

        let config = ServiceConfig {
            requirement_table_path: Some(table_path),
            credentials_path,
            ..ServiceConfig::default()
        };
        let err = ServiceState::bootstrap(config).unwrap_err();
        assert!(matches!(err, AuthzError::PolicyConfiguration(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn bootstrap_with_file_store_survives_restart() {
        let dir = std::env::temp_dir().join(format!("authz-service-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut credentials = CredentialSet::new();
        for role in OfficerRole::ALL {
            credentials.set_secret(role, secret_for(role));
        }
        let credentials_path = dir.join("credentials.json");
        std::fs::write(
            &credentials_path,
            serde_json::to_vec(&credentials).unwrap(),
        )
        .unwrap();

        let config = ServiceConfig {
            credentials_path,
            session_storage: SessionStorageConfig::File(dir.join("sessions.json")),
            ..ServiceConfig::default()
        };

        let session_id = {
            let state = ServiceState::bootstrap(config.clone()).unwrap();
            let mut engine = state.engine.lock().await;
            engine
                .create_session(
                    TransactionDescriptor::new(
                        TransactionType::Disbursement,
                        Amount::new(75_000),
                        "vendor-3",
                        "Borehole drilling",
                    ),
                    OfficerRole::President,
                    Utc::now(),
                )
                .unwrap()
        };

        let state = ServiceState::bootstrap(config).unwrap();
        let engine = state.engine.lock().await;
        let view = engine.status(&session_id, Utc::now()).unwrap();
        assert_eq!(view.status, SessionStatus::Pending);

        std::fs::remove_dir_all(&dir).ok();
    }
}
