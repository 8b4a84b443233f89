//! Officer identities and the seat directory
//!
//! Officers are reference data owned by the community directory service.
//! The authorization core reads them to resolve which seats may sign a
//! given transaction class; it never mutates them mid-session.

use crate::{AuthzError, TransactionType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// The authorization roles a community officer can hold
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfficerRole {
    President,
    Treasurer,
    Secretary,
    FinancialSecretary,
}

impl OfficerRole {
    /// Every role the platform recognizes
    pub const ALL: [OfficerRole; 4] = [
        OfficerRole::President,
        OfficerRole::Treasurer,
        OfficerRole::Secretary,
        OfficerRole::FinancialSecretary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OfficerRole::President => "president",
            OfficerRole::Treasurer => "treasurer",
            OfficerRole::Secretary => "secretary",
            OfficerRole::FinancialSecretary => "financial_secretary",
        }
    }
}

impl std::fmt::Display for OfficerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OfficerRole {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "president" => Ok(OfficerRole::President),
            "treasurer" => Ok(OfficerRole::Treasurer),
            "secretary" => Ok(OfficerRole::Secretary),
            "financial_secretary" => Ok(OfficerRole::FinancialSecretary),
            other => Err(AuthzError::UnknownOfficerRole(other.to_string())),
        }
    }
}

/// Unique identifier for an Officer
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfficerId(pub String);

impl OfficerId {
    /// Generate a new random OfficerId
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Create an OfficerId from a known string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Short display form (first 8 chars)
    pub fn short(&self) -> String {
        self.0.chars().take(8).collect()
    }
}

impl std::fmt::Display for OfficerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A community officer eligible to authorize treasury transactions
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Officer {
    /// Unique officer identity
    pub officer_id: OfficerId,
    /// Human-readable name
    pub display_name: String,
    /// The seat this officer holds
    pub role: OfficerRole,
    /// Opaque reference to a profile image, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl Officer {
    pub fn new(display_name: impl Into<String>, role: OfficerRole) -> Self {
        Self {
            officer_id: OfficerId::generate(),
            display_name: display_name.into(),
            role,
            image_ref: None,
        }
    }

    pub fn with_id(mut self, id: OfficerId) -> Self {
        self.officer_id = id;
        self
    }

    pub fn with_image_ref(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }
}

/// Directory of seated officers, one active officer per role
///
/// Seating a role that is already filled re-points the seat to the new
/// officer; the previous holder loses authorization eligibility.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OfficerDirectory {
    seats: HashMap<OfficerRole, Officer>,
}

impl OfficerDirectory {
    pub fn new() -> Self {
        Self {
            seats: HashMap::new(),
        }
    }

    /// Seat an officer, replacing any previous holder of the role
    pub fn seat(&mut self, officer: Officer) -> Option<Officer> {
        self.seats.insert(officer.role, officer)
    }

    /// The officer currently holding a role
    pub fn officer_for(&self, role: OfficerRole) -> Option<&Officer> {
        self.seats.get(&role)
    }

    /// Lookup an officer by ID
    pub fn lookup(&self, officer_id: &OfficerId) -> Option<&Officer> {
        self.seats.values().find(|o| &o.officer_id == officer_id)
    }

    /// Roles currently eligible to authorize a transaction class
    ///
    /// Every treasury class accepts any seated officer today; the
    /// transaction type is part of the seam so per-class eligibility can
    /// be restricted without touching callers.
    pub fn eligible_roles(&self, _transaction_type: TransactionType) -> BTreeSet<OfficerRole> {
        self.seats.keys().copied().collect()
    }

    /// Number of seated officers
    pub fn seated_count(&self) -> usize {
        self.seats.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in OfficerRole::ALL {
            let parsed: OfficerRole = role.as_str().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        let err = "vice_president".parse::<OfficerRole>().unwrap_err();
        assert!(matches!(err, AuthzError::UnknownOfficerRole(_)));
    }

    #[test]
    fn test_officer_id_generate() {
        let id = OfficerId::generate();
        assert!(!id.0.is_empty());
        assert_eq!(id.short().len(), 8);
    }

    #[test]
    fn test_seat_replaces_previous_holder() {
        let mut directory = OfficerDirectory::new();
        let first = Officer::new("Ada", OfficerRole::Treasurer);
        let second = Officer::new("Grace", OfficerRole::Treasurer);

        assert!(directory.seat(first.clone()).is_none());
        let replaced = directory.seat(second.clone()).unwrap();
        assert_eq!(replaced.officer_id, first.officer_id);
        assert_eq!(
            directory.officer_for(OfficerRole::Treasurer).unwrap().display_name,
            "Grace"
        );
        assert_eq!(directory.seated_count(), 1);
    }

    #[test]
    fn test_eligible_roles_tracks_seats() {
        let mut directory = OfficerDirectory::new();
        directory.seat(Officer::new("Ada", OfficerRole::President));
        directory.seat(Officer::new("Grace", OfficerRole::Treasurer));

        let eligible = directory.eligible_roles(TransactionType::Transfer);
        assert_eq!(eligible.len(), 2);
        assert!(eligible.contains(&OfficerRole::President));
        assert!(!eligible.contains(&OfficerRole::Secretary));
    }

    #[test]
    fn test_lookup_by_id() {
        let mut directory = OfficerDirectory::new();
        let officer = Officer::new("Ada", OfficerRole::Secretary);
        let id = officer.officer_id.clone();
        directory.seat(officer);

        assert_eq!(directory.lookup(&id).unwrap().display_name, "Ada");
        assert!(directory.lookup(&OfficerId::new("missing")).is_none());
    }
}
