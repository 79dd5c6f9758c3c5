use serde::{Deserialize, Serialize};

use reqflow_core::{OrgUnitId, TenantId, UserId};

use crate::Role;

/// A resolved caller: who they are, where they sit, what they may decide for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub role: Role,
    /// The unit the principal submits requisitions from.
    pub unit: OrgUnitId,
    /// Units whose requisitions the principal may decide on.
    pub authorized_units: Vec<OrgUnitId>,
}

impl Principal {
    pub fn is_administrator(&self) -> bool {
        self.role == Role::Administrator
    }

    pub fn may_decide_for(&self, unit: OrgUnitId) -> bool {
        self.is_administrator() || self.authorized_units.contains(&unit)
    }
}
