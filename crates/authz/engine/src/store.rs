//! Keyed storage for in-flight authorization sessions
//!
//! The engine reads and writes whole sessions through the `SessionStore`
//! seam. The memory store backs tests and single-node deployments; the
//! file store persists after every mutation so pending sessions survive
//! service restarts. Storage failures surface as `StoreUnavailable` after
//! bounded retries, never as a silent "not approved".

use authz_types::{AuthorizationSession, AuthzError, AuthzResult, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Keyed session storage
pub trait SessionStore: Send {
    /// Fetch a session by id
    fn get(&self, session_id: &SessionId) -> AuthzResult<Option<AuthorizationSession>>;

    /// Insert or replace a session
    fn put(&mut self, session: AuthorizationSession) -> AuthzResult<()>;

    /// Remove a session (terminal archival), returning it if present
    fn remove(&mut self, session_id: &SessionId) -> AuthzResult<Option<AuthorizationSession>>;

    /// Ids of all sessions still pending
    fn pending_ids(&self) -> AuthzResult<Vec<SessionId>>;

    /// Number of stored sessions
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory session store
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: HashMap<SessionId, AuthorizationSession>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, session_id: &SessionId) -> AuthzResult<Option<AuthorizationSession>> {
        Ok(self.sessions.get(session_id).cloned())
    }

    fn put(&mut self, session: AuthorizationSession) -> AuthzResult<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    fn remove(&mut self, session_id: &SessionId) -> AuthzResult<Option<AuthorizationSession>> {
        Ok(self.sessions.remove(session_id))
    }

    fn pending_ids(&self) -> AuthzResult<Vec<SessionId>> {
        Ok(self
            .sessions
            .values()
            .filter(|s| s.status.is_pending())
            .map(|s| s.id.clone())
            .collect())
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct StoreData {
    sessions: BTreeMap<String, AuthorizationSession>,
}

const PERSIST_ATTEMPTS: u32 = 3;

/// File-backed session store
///
/// The document is persisted after every mutation so pending sessions
/// survive service restarts. Writes go to a temp file and rename into
/// place.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: StoreData,
}

impl FileStore {
    pub fn load(path: impl Into<PathBuf>) -> AuthzResult<Self> {
        let path = path.into();
        let data = if path.exists() {
            let bytes = fs::read(&path)
                .map_err(|e| AuthzError::StoreUnavailable(format!("read {}: {}", path.display(), e)))?;
            if bytes.is_empty() {
                StoreData::default()
            } else {
                serde_json::from_slice(&bytes).map_err(|e| {
                    AuthzError::StoreUnavailable(format!("parse {}: {}", path.display(), e))
                })?
            }
        } else {
            StoreData::default()
        };

        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> AuthzResult<()> {
        let bytes = serde_json::to_vec_pretty(&self.data).map_err(|e| {
            AuthzError::StoreUnavailable(format!("serialize sessions: {}", e))
        })?;

        let mut last_error = None;
        for _ in 0..PERSIST_ATTEMPTS {
            match self.persist_once(&bytes) {
                Ok(()) => return Ok(()),
                Err(e) => last_error = Some(e),
            }
        }
        Err(AuthzError::StoreUnavailable(format!(
            "persist {} failed after {} attempts: {}",
            self.path.display(),
            PERSIST_ATTEMPTS,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    fn persist_once(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, bytes)?;
        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, session_id: &SessionId) -> AuthzResult<Option<AuthorizationSession>> {
        Ok(self.data.sessions.get(&session_id.0).cloned())
    }

    fn put(&mut self, session: AuthorizationSession) -> AuthzResult<()> {
        self.data.sessions.insert(session.id.0.clone(), session);
        self.persist()
    }

    fn remove(&mut self, session_id: &SessionId) -> AuthzResult<Option<AuthorizationSession>> {
        let removed = self.data.sessions.remove(&session_id.0);
        if removed.is_some() {
            self.persist()?;
        }
        Ok(removed)
    }

    fn pending_ids(&self) -> AuthzResult<Vec<SessionId>> {
        Ok(self
            .data
            .sessions
            .values()
            .filter(|s| s.status.is_pending())
            .map(|s| s.id.clone())
            .collect())
    }

    fn len(&self) -> usize {
        self.data.sessions.len()
    }
}
