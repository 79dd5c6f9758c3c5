//! Postgres-backed approver directory (`approver_directory` + `approver_units`).

use sqlx::Row;
use tracing::instrument;
use uuid::Uuid;

use reqflow_core::{OrgUnitId, TenantId, UserId};
use reqflow_requisitions::{Approver, ApproverRole, rank_approvers};

use super::{ApproverDirectory, DirectoryError};
use crate::db::PgContext;

#[derive(Debug, Clone)]
pub struct PostgresApproverDirectory {
    ctx: PgContext,
}

impl PostgresApproverDirectory {
    pub fn new(ctx: PgContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, unit = %unit), err)]
    pub async fn authorized_approvers_async(
        &self,
        tenant_id: TenantId,
        unit: OrgUnitId,
    ) -> Result<Vec<Approver>, DirectoryError> {
        let rows = sqlx::query(
            r#"
            SELECT d.user_id, d.role, ARRAY_AGG(all_units.unit_id) AS units
            FROM approver_directory d
            JOIN approver_units all_units
              ON all_units.tenant_id = d.tenant_id AND all_units.user_id = d.user_id
            WHERE d.tenant_id = $1
              AND EXISTS (
                  SELECT 1 FROM approver_units u
                  WHERE u.tenant_id = d.tenant_id AND u.user_id = d.user_id AND u.unit_id = $2
              )
            GROUP BY d.user_id, d.role
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(unit.as_uuid())
        .fetch_all(self.ctx.pool())
        .await
        .map_err(unavailable)?;

        let mut approvers = Vec::with_capacity(rows.len());
        for row in rows {
            let user_id: Uuid = row.try_get("user_id").map_err(corrupt)?;
            let role: String = row.try_get("role").map_err(corrupt)?;
            let units: Vec<Uuid> = row.try_get("units").map_err(corrupt)?;
            let role: ApproverRole = role
                .parse()
                .map_err(|e| DirectoryError::Corrupt(format!("{e}")))?;
            approvers.push(Approver::new(
                UserId::from_uuid(user_id),
                role,
                units.into_iter().map(OrgUnitId::from_uuid),
            ));
        }

        Ok(rank_approvers(approvers))
    }

    /// Insert or replace an entry and its unit memberships.
    #[instrument(skip(self, approver), fields(tenant_id = %tenant_id, user_id = %approver.user_id), err)]
    pub async fn upsert(&self, tenant_id: TenantId, approver: &Approver) -> Result<(), DirectoryError> {
        let mut tx = self.ctx.pool().begin().await.map_err(unavailable)?;

        sqlx::query(
            r#"
            INSERT INTO approver_directory (tenant_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, user_id) DO UPDATE SET role = EXCLUDED.role
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(approver.user_id.as_uuid())
        .bind(approver.role.as_str())
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        sqlx::query("DELETE FROM approver_units WHERE tenant_id = $1 AND user_id = $2")
            .bind(tenant_id.as_uuid())
            .bind(approver.user_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;

        for unit in &approver.units {
            sqlx::query(
                "INSERT INTO approver_units (tenant_id, user_id, unit_id) VALUES ($1, $2, $3)",
            )
            .bind(tenant_id.as_uuid())
            .bind(approver.user_id.as_uuid())
            .bind(unit.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;
        }

        tx.commit().await.map_err(unavailable)?;
        Ok(())
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, user_id = %user_id), err)]
    pub async fn remove(&self, tenant_id: TenantId, user_id: UserId) -> Result<bool, DirectoryError> {
        let result = sqlx::query("DELETE FROM approver_directory WHERE tenant_id = $1 AND user_id = $2")
            .bind(tenant_id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(self.ctx.pool())
            .await
            .map_err(unavailable)?;
        Ok(result.rows_affected() > 0)
    }
}

fn unavailable(err: sqlx::Error) -> DirectoryError {
    DirectoryError::Unavailable(err.to_string())
}

fn corrupt(err: sqlx::Error) -> DirectoryError {
    DirectoryError::Corrupt(err.to_string())
}

impl ApproverDirectory for PostgresApproverDirectory {
    fn authorized_approvers(
        &self,
        tenant_id: TenantId,
        unit: OrgUnitId,
    ) -> Result<Vec<Approver>, DirectoryError> {
        self.ctx.block_on(self.authorized_approvers_async(tenant_id, unit))
    }
}
