//! Approver directory entries and their canonical ordering.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use reqflow_core::{DomainError, Entity, OrgUnitId, UserId};

/// Role tag of a directory entry.
///
/// Declared in chain order: `Standard` sorts before `Administrator`, so
/// administrators always land in the final chain positions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApproverRole {
    Standard,
    Administrator,
}

impl ApproverRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ApproverRole::Standard => "standard",
            ApproverRole::Administrator => "administrator",
        }
    }
}

impl core::str::FromStr for ApproverRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(ApproverRole::Standard),
            "administrator" => Ok(ApproverRole::Administrator),
            other => Err(DomainError::validation(format!("unknown approver role '{other}'"))),
        }
    }
}

/// A person authorized to decide on requisitions of some organizational units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approver {
    pub user_id: UserId,
    pub role: ApproverRole,
    pub units: BTreeSet<OrgUnitId>,
}

impl Approver {
    pub fn new(user_id: UserId, role: ApproverRole, units: impl IntoIterator<Item = OrgUnitId>) -> Self {
        Self {
            user_id,
            role,
            units: units.into_iter().collect(),
        }
    }

    pub fn authorized_for(&self, unit: OrgUnitId) -> bool {
        self.units.contains(&unit)
    }
}

impl Entity for Approver {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.user_id
    }
}

/// Canonical chain order: standard approvers by ascending identity, then
/// administrators by ascending identity.
pub fn rank_approvers(mut approvers: Vec<Approver>) -> Vec<Approver> {
    approvers.sort_by_key(|a| (a.role, a.user_id));
    approvers
}

/// Entries authorized for `unit`, in canonical chain order.
pub fn approvers_for_unit<'a>(
    entries: impl IntoIterator<Item = &'a Approver>,
    unit: OrgUnitId,
) -> Vec<Approver> {
    rank_approvers(
        entries
            .into_iter()
            .filter(|a| a.authorized_for(unit))
            .cloned()
            .collect(),
    )
}
