//! Approver directory stores.
//!
//! Read-only from the engine's point of view: it asks which approvers are
//! authorized for a unit. Administrative writes (`upsert`/`remove`) exist on
//! the concrete stores for provisioning and tests.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use thiserror::Error;

use reqflow_core::{OrgUnitId, TenantId};
use reqflow_requisitions::Approver;

pub use in_memory::InMemoryApproverDirectory;
pub use postgres::PostgresApproverDirectory;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("approver directory unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt directory entry: {0}")]
    Corrupt(String),
}

pub trait ApproverDirectory: Send + Sync {
    /// Approvers authorized for `unit`: standard approvers by ascending
    /// identity, then administrators by ascending identity. An empty list is a
    /// valid answer.
    fn authorized_approvers(
        &self,
        tenant_id: TenantId,
        unit: OrgUnitId,
    ) -> Result<Vec<Approver>, DirectoryError>;
}

impl<D> ApproverDirectory for Arc<D>
where
    D: ApproverDirectory + ?Sized,
{
    fn authorized_approvers(
        &self,
        tenant_id: TenantId,
        unit: OrgUnitId,
    ) -> Result<Vec<Approver>, DirectoryError> {
        (**self).authorized_approvers(tenant_id, unit)
    }
}
