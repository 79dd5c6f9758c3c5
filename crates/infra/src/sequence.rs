//! Requisition code counters (one per tenant and prefix).
//!
//! Counters are unique and strictly increasing. A counter consumed by a
//! submission that later fails is not reused, so codes may have gaps.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sqlx::Row;
use thiserror::Error;
use tracing::instrument;

use reqflow_core::TenantId;

use crate::db::PgContext;

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("sequence store unavailable: {0}")]
    Unavailable(String),

    #[error("sequence for prefix '{0}' is exhausted")]
    Exhausted(String),
}

pub trait SequenceAllocator: Send + Sync {
    /// Allocate the next counter for `prefix` (first value is 1).
    fn next_value(&self, tenant_id: TenantId, prefix: &str) -> Result<u64, SequenceError>;
}

impl<A> SequenceAllocator for Arc<A>
where
    A: SequenceAllocator + ?Sized,
{
    fn next_value(&self, tenant_id: TenantId, prefix: &str) -> Result<u64, SequenceError> {
        (**self).next_value(tenant_id, prefix)
    }
}

#[derive(Debug, Default)]
pub struct InMemorySequenceAllocator {
    counters: Mutex<HashMap<(TenantId, String), u64>>,
}

impl InMemorySequenceAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SequenceAllocator for InMemorySequenceAllocator {
    fn next_value(&self, tenant_id: TenantId, prefix: &str) -> Result<u64, SequenceError> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| SequenceError::Unavailable("sequence lock poisoned".to_string()))?;
        let counter = counters.entry((tenant_id, prefix.to_string())).or_insert(0);
        *counter = counter
            .checked_add(1)
            .ok_or_else(|| SequenceError::Exhausted(prefix.to_string()))?;
        Ok(*counter)
    }
}

#[derive(Debug, Clone)]
pub struct PostgresSequenceAllocator {
    ctx: PgContext,
}

impl PostgresSequenceAllocator {
    pub fn new(ctx: PgContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    pub async fn next_value_async(
        &self,
        tenant_id: TenantId,
        prefix: &str,
    ) -> Result<u64, SequenceError> {
        let row = sqlx::query(
            r#"
            INSERT INTO requisition_sequences (tenant_id, prefix, last_value)
            VALUES ($1, $2, 1)
            ON CONFLICT (tenant_id, prefix)
            DO UPDATE SET last_value = requisition_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(prefix)
        .fetch_one(self.ctx.pool())
        .await
        .map_err(|e| SequenceError::Unavailable(e.to_string()))?;

        let value: i64 = row
            .try_get("last_value")
            .map_err(|e| SequenceError::Unavailable(e.to_string()))?;
        u64::try_from(value).map_err(|_| SequenceError::Exhausted(prefix.to_string()))
    }
}

impl SequenceAllocator for PostgresSequenceAllocator {
    fn next_value(&self, tenant_id: TenantId, prefix: &str) -> Result<u64, SequenceError> {
        self.ctx.block_on(self.next_value_async(tenant_id, prefix))
    }
}
