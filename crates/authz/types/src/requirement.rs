//! Signatory requirements: who must approve before funds move
//!
//! A requirement is declarative policy data. The decision function over a
//! set of authorized roles is pure and total; configuration consistency is
//! checked once at load time, never per request.

use crate::{AuthzError, AuthzResult, OfficerRole, TransactionType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The signatory rule a single session must satisfy
///
/// Snapshotted into the session at creation time so that table edits never
/// retroactively affect in-flight sessions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequirement {
    /// Transaction class this requirement applies to
    pub transaction_type: TransactionType,
    /// The role that initiated the transaction
    pub initiator_role: OfficerRole,
    /// Minimum number of distinct signatory roles
    pub required_count: u32,
    /// Roles that must all be among the signatories
    pub mandatory_roles: BTreeSet<OfficerRole>,
    /// Role groups where at least one member of each group must sign
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternate_groups: Vec<BTreeSet<OfficerRole>>,
}

impl AuthorizationRequirement {
    /// Check whether a set of authorized roles satisfies this requirement
    ///
    /// True iff the count threshold is met, every mandatory role has
    /// signed, and every alternate group has at least one signer. Pure and
    /// total; adding a role to the set never turns a satisfied result into
    /// an unsatisfied one.
    pub fn is_satisfied_by(&self, authorized: &BTreeSet<OfficerRole>) -> bool {
        if (authorized.len() as u32) < self.required_count {
            return false;
        }
        if !self.mandatory_roles.is_subset(authorized) {
            return false;
        }
        self.alternate_groups
            .iter()
            .all(|group| !group.is_disjoint(authorized))
    }

    /// Validate configuration consistency against the eligible officer pool
    ///
    /// Violations are configuration errors raised at policy load time.
    pub fn validate(&self, eligible_pool: usize) -> AuthzResult<()> {
        if self.required_count == 0 {
            return Err(AuthzError::PolicyConfiguration(format!(
                "{}/{}: required_count must be at least 1",
                self.transaction_type, self.initiator_role
            )));
        }
        if (self.required_count as usize) < self.mandatory_roles.len() {
            return Err(AuthzError::PolicyConfiguration(format!(
                "{}/{}: required_count {} is below the {} mandatory roles",
                self.transaction_type,
                self.initiator_role,
                self.required_count,
                self.mandatory_roles.len()
            )));
        }
        if self.required_count as usize > eligible_pool {
            return Err(AuthzError::PolicyConfiguration(format!(
                "{}/{}: required_count {} exceeds the eligible pool of {}",
                self.transaction_type, self.initiator_role, self.required_count, eligible_pool
            )));
        }
        if self.alternate_groups.iter().any(BTreeSet::is_empty) {
            return Err(AuthzError::PolicyConfiguration(format!(
                "{}/{}: alternate groups must not be empty",
                self.transaction_type, self.initiator_role
            )));
        }
        Ok(())
    }
}

/// Role-composition rule shared by every initiator of a transaction class
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementRule {
    /// Roles that must all sign
    pub mandatory_roles: BTreeSet<OfficerRole>,
    /// Role groups where at least one member of each group must sign
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternate_groups: Vec<BTreeSet<OfficerRole>>,
}

/// The per-deployment requirement table, loaded at startup
///
/// The signatory count depends on who initiated the transaction: the
/// community constitution demands an extra check when anyone other than
/// the president proposes a movement of funds. The asymmetry is data here,
/// not code; operators extend the table without touching the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementTable {
    /// Signatory count per initiating role
    pub signatory_counts: BTreeMap<OfficerRole, u32>,
    /// Role-composition rule per transaction class
    pub rules: BTreeMap<TransactionType, RequirementRule>,
}

impl RequirementTable {
    /// The table observed in the Mobigate production deployment:
    /// president-initiated transactions need 3 signatories, all other
    /// initiators need 4; the president must always sign, and at least one
    /// of treasurer or financial secretary must sign.
    pub fn mobigate_default() -> Self {
        let mut signatory_counts = BTreeMap::new();
        signatory_counts.insert(OfficerRole::President, 3);
        signatory_counts.insert(OfficerRole::Treasurer, 4);
        signatory_counts.insert(OfficerRole::Secretary, 4);
        signatory_counts.insert(OfficerRole::FinancialSecretary, 4);

        let rule = RequirementRule {
            mandatory_roles: BTreeSet::from([OfficerRole::President]),
            alternate_groups: vec![BTreeSet::from([
                OfficerRole::Treasurer,
                OfficerRole::FinancialSecretary,
            ])],
        };

        let mut rules = BTreeMap::new();
        for transaction_type in TransactionType::ALL {
            rules.insert(transaction_type, rule.clone());
        }

        Self {
            signatory_counts,
            rules,
        }
    }

    /// Signatory count for an initiating role
    ///
    /// A missing entry is a configuration error, not a caller error.
    pub fn required_count_for(&self, initiator_role: OfficerRole) -> AuthzResult<u32> {
        self.signatory_counts.get(&initiator_role).copied().ok_or_else(|| {
            AuthzError::PolicyConfiguration(format!(
                "no signatory count configured for initiator {}",
                initiator_role
            ))
        })
    }

    /// Resolve the requirement snapshot for a new session
    pub fn requirement_for(
        &self,
        transaction_type: TransactionType,
        initiator_role: OfficerRole,
    ) -> AuthzResult<AuthorizationRequirement> {
        let required_count = self.required_count_for(initiator_role)?;
        let rule = self.rules.get(&transaction_type).ok_or_else(|| {
            AuthzError::PolicyConfiguration(format!(
                "no requirement rule configured for {}",
                transaction_type
            ))
        })?;

        Ok(AuthorizationRequirement {
            transaction_type,
            initiator_role,
            required_count,
            mandatory_roles: rule.mandatory_roles.clone(),
            alternate_groups: rule.alternate_groups.clone(),
        })
    }

    /// Validate every entry against the eligible officer pool
    ///
    /// Run once at startup; a violation must prevent the service from
    /// starting rather than surface per-request.
    pub fn validate(&self, eligible_pool: usize) -> AuthzResult<()> {
        if self.signatory_counts.is_empty() {
            return Err(AuthzError::PolicyConfiguration(
                "signatory_counts table is empty".to_string(),
            ));
        }
        if self.rules.is_empty() {
            return Err(AuthzError::PolicyConfiguration(
                "requirement rules table is empty".to_string(),
            ));
        }
        for (&transaction_type, _) in &self.rules {
            for (&initiator_role, _) in &self.signatory_counts {
                self.requirement_for(transaction_type, initiator_role)?
                    .validate(eligible_pool)?;
            }
        }
        Ok(())
    }
}
