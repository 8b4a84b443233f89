//! Credential verification against hashed officer secrets
//!
//! Secrets are provisioned out-of-band by the identity service and stored
//! here only as BLAKE3 digests. Verification hashes the submitted secret
//! and compares digests; `blake3::Hash` equality is constant-time, so the
//! comparison leaks no timing signal. Unknown roles verify false rather
//! than erroring, so a lookup miss can never be mistaken for success.

use authz_types::OfficerRole;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Role-keyed credential digests, loaded from the identity store
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CredentialSet {
    /// Hex-encoded BLAKE3 digest per role
    digests: BTreeMap<OfficerRole, String>,
}

impl CredentialSet {
    pub fn new() -> Self {
        Self {
            digests: BTreeMap::new(),
        }
    }

    /// Provision a credential for a role, replacing any previous one
    ///
    /// Hashes immediately; the plaintext secret is not retained.
    pub fn set_secret(&mut self, role: OfficerRole, secret: &str) {
        let digest = blake3::hash(secret.as_bytes());
        self.digests.insert(role, digest.to_hex().to_string());
    }

    /// Insert an already-hashed digest (hex-encoded)
    pub fn set_digest(&mut self, role: OfficerRole, digest_hex: impl Into<String>) {
        self.digests.insert(role, digest_hex.into());
    }

    /// The stored digest for a role, if provisioned
    pub fn digest_for(&self, role: OfficerRole) -> Option<&str> {
        self.digests.get(&role).map(String::as_str)
    }

    /// Number of provisioned roles
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

/// Validates submitted officer secrets against the credential set
#[derive(Clone, Debug)]
pub struct CredentialVerifier {
    credentials: CredentialSet,
}

impl CredentialVerifier {
    pub fn new(credentials: CredentialSet) -> Self {
        Self { credentials }
    }

    /// Verify a submitted secret for a role
    ///
    /// Fails closed: an unprovisioned role or a malformed stored digest is
    /// false, never an error.
    pub fn verify(&self, role: OfficerRole, submitted_secret: &str) -> bool {
        let Some(stored_hex) = self.credentials.digest_for(role) else {
            return false;
        };
        let Ok(stored_bytes) = hex::decode(stored_hex) else {
            return false;
        };
        let Ok(stored_bytes) = <[u8; 32]>::try_from(stored_bytes) else {
            return false;
        };
        let stored = blake3::Hash::from_bytes(stored_bytes);
        let submitted = blake3::hash(submitted_secret.as_bytes());
        // Hash equality is constant-time
        stored == submitted
    }
}
