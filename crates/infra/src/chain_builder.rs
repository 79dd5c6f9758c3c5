use chrono::{DateTime, Utc};

use reqflow_core::{OrgUnitId, TenantId, UserId};
use reqflow_requisitions::{ApprovalStep, Approver, build_chain};

use crate::directory::ApproverDirectory;
use crate::error::EngineError;

/// Turns a directory listing into an approval chain.
#[derive(Debug, Clone)]
pub struct ApprovalChainBuilder<D> {
    directory: D,
}

impl<D> ApprovalChainBuilder<D>
where
    D: ApproverDirectory,
{
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn approvers(
        &self,
        tenant_id: TenantId,
        unit: OrgUnitId,
    ) -> Result<Vec<Approver>, EngineError> {
        Ok(self.directory.authorized_approvers(tenant_id, unit)?)
    }

    /// Chain for a new submission from `submitter` in `unit`.
    ///
    /// An empty directory listing yields an empty chain: the requisition skips
    /// approval and is immediately eligible for fulfillment.
    pub fn build(
        &self,
        tenant_id: TenantId,
        unit: OrgUnitId,
        submitter: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<ApprovalStep>, EngineError> {
        let approvers = self.approvers(tenant_id, unit)?;
        if approvers.is_empty() {
            tracing::info!(
                tenant_id = %tenant_id,
                unit = %unit,
                "no approvers configured for unit; requisition needs no approval"
            );
        }

        let chain = build_chain(&approvers, submitter, now)?;
        tracing::debug!(
            tenant_id = %tenant_id,
            unit = %unit,
            steps = chain.len(),
            self_authorized = chain.iter().any(|s| s.approver_id == submitter),
            "approval chain built"
        );
        Ok(chain)
    }
}
