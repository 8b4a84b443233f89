//! Service configuration and startup validation
//!
//! The requirement table, officer roster, and credential set are loaded
//! once at startup. Any inconsistency is a `PolicyConfiguration` error
//! that must prevent the service from starting; nothing here is deferred
//! to request time.

use authz_engine::{CredentialSet, RateLimitConfig};
use authz_types::{AuthzError, AuthzResult, Officer, OfficerDirectory, OfficerRole, RequirementTable};
use std::fs;
use std::path::{Path, PathBuf};

/// Where authorization sessions are persisted
#[derive(Clone, Debug, Default)]
pub enum SessionStorageConfig {
    /// In-memory only; sessions do not survive a restart
    #[default]
    Memory,
    /// JSON document persisted after every mutation
    File(PathBuf),
}

/// Daemon configuration, resolved from CLI flags and defaults
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Session time-to-live in seconds
    pub session_ttl_secs: i64,
    /// How often the expiry sweep runs, in seconds
    pub sweep_interval_secs: u64,
    /// Requirement table JSON; the built-in Mobigate table when absent
    pub requirement_table_path: Option<PathBuf>,
    /// Officer roster JSON; seats one officer per role when absent
    pub officers_path: Option<PathBuf>,
    /// Credential digest file, role -> hex BLAKE3 digest
    pub credentials_path: PathBuf,
    /// Session persistence backend
    pub session_storage: SessionStorageConfig,
    /// Credential attempt limits
    pub rate_limit: RateLimitConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: 86_400,
            sweep_interval_secs: 60,
            requirement_table_path: None,
            officers_path: None,
            credentials_path: PathBuf::from("data/credentials.json"),
            session_storage: SessionStorageConfig::Memory,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Load and validate the requirement table
///
/// With no path configured the observed Mobigate production table is
/// used. Either way the table is validated against the full officer pool
/// before the service accepts traffic.
pub fn load_requirement_table(path: Option<&Path>) -> AuthzResult<RequirementTable> {
    let table = match path {
        None => RequirementTable::mobigate_default(),
        Some(path) => {
            let bytes = fs::read(path).map_err(|e| {
                AuthzError::PolicyConfiguration(format!(
                    "requirement table {}: {}",
                    path.display(),
                    e
                ))
            })?;
            serde_json::from_slice(&bytes).map_err(|e| {
                AuthzError::PolicyConfiguration(format!(
                    "requirement table {}: {}",
                    path.display(),
                    e
                ))
            })?
        }
    };
    table.validate(OfficerRole::ALL.len())?;
    Ok(table)
}

/// Load the officer roster
///
/// With no path configured every role is seated under its role name, the
/// single-community deployment shape. A roster file lists the officers as
/// a JSON array; later entries for the same role replace earlier ones.
pub fn load_officers(path: Option<&Path>) -> AuthzResult<OfficerDirectory> {
    let mut directory = OfficerDirectory::new();
    match path {
        None => {
            for role in OfficerRole::ALL {
                directory.seat(Officer::new(role.as_str(), role));
            }
        }
        Some(path) => {
            let bytes = fs::read(path).map_err(|e| {
                AuthzError::PolicyConfiguration(format!("officers {}: {}", path.display(), e))
            })?;
            let officers: Vec<Officer> = serde_json::from_slice(&bytes).map_err(|e| {
                AuthzError::PolicyConfiguration(format!("officers {}: {}", path.display(), e))
            })?;
            if officers.is_empty() {
                return Err(AuthzError::PolicyConfiguration(format!(
                    "officers {}: roster is empty",
                    path.display()
                )));
            }
            for officer in officers {
                directory.seat(officer);
            }
        }
    }
    Ok(directory)
}

/// Load the credential digest set
pub fn load_credentials(path: &Path) -> AuthzResult<CredentialSet> {
    let bytes = fs::read(path).map_err(|e| {
        AuthzError::PolicyConfiguration(format!("credentials {}: {}", path.display(), e))
    })?;
    let credentials: CredentialSet = serde_json::from_slice(&bytes).map_err(|e| {
        AuthzError::PolicyConfiguration(format!("credentials {}: {}", path.display(), e))
    })?;
    if credentials.is_empty() {
        return Err(AuthzError::PolicyConfiguration(format!(
            "credentials {}: no roles provisioned",
            path.display()
        )));
    }
    Ok(credentials)
}
