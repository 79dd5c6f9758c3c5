use std::collections::HashMap;
use std::sync::RwLock;

use reqflow_core::{OrgUnitId, TenantId, UserId};
use reqflow_requisitions::{Approver, approvers_for_unit};

use super::{ApproverDirectory, DirectoryError};

/// In-memory approver directory for tests and dev wiring.
#[derive(Debug, Default)]
pub struct InMemoryApproverDirectory {
    entries: RwLock<HashMap<TenantId, HashMap<UserId, Approver>>>,
}

impl InMemoryApproverDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry (keyed by user).
    pub fn upsert(&self, tenant_id: TenantId, approver: Approver) -> Result<(), DirectoryError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries
            .entry(tenant_id)
            .or_default()
            .insert(approver.user_id, approver);
        Ok(())
    }

    /// Returns whether an entry was removed.
    pub fn remove(&self, tenant_id: TenantId, user_id: UserId) -> Result<bool, DirectoryError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        Ok(entries
            .get_mut(&tenant_id)
            .and_then(|tenant| tenant.remove(&user_id))
            .is_some())
    }
}

fn poisoned() -> DirectoryError {
    DirectoryError::Unavailable("in-memory directory lock poisoned".to_string())
}

impl ApproverDirectory for InMemoryApproverDirectory {
    fn authorized_approvers(
        &self,
        tenant_id: TenantId,
        unit: OrgUnitId,
    ) -> Result<Vec<Approver>, DirectoryError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries
            .get(&tenant_id)
            .map(|tenant| approvers_for_unit(tenant.values(), unit))
            .unwrap_or_default())
    }
}
