//! Requisition index: the latest state of every requisition in a tenant.
//!
//! Backs `list_actionable`. Each record carries the sequence number it
//! reflects, so redelivered envelopes are skipped and gaps are reported
//! instead of silently folded. A tenant whose index missed an event is marked
//! stale and replayed in full on its next catch-up.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value as JsonValue;
use thiserror::Error;

use reqflow_core::{Aggregate, TenantId, UserId};
use reqflow_events::{Delivery, EventEnvelope};
use reqflow_requisitions::{AGGREGATE_TYPE, Requisition, RequisitionEvent, RequisitionId};

use crate::command_dispatcher::InlineProjection;
use crate::event_store::StoredEvent;
use crate::read_model::TenantStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedRequisition {
    pub state: Requisition,
    pub last_sequence: u64,
}

#[derive(Debug, Error)]
pub enum RequisitionIndexError {
    #[error("failed to deserialize requisition event: {0}")]
    Deserialize(String),
    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),
    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
    #[error("failed to load requisition history: {0}")]
    History(String),
}

#[derive(Debug)]
pub struct RequisitionIndexProjection<S>
where
    S: TenantStore<RequisitionId, IndexedRequisition>,
{
    store: S,
    /// Tenants whose index missed an event. Held for every write to the index.
    stale: Mutex<HashSet<TenantId>>,
}

impl<S> RequisitionIndexProjection<S>
where
    S: TenantStore<RequisitionId, IndexedRequisition>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            stale: Mutex::new(HashSet::new()),
        }
    }

    pub fn get(&self, tenant_id: TenantId, id: &RequisitionId) -> Option<Requisition> {
        self.store.get(tenant_id, id).map(|r| r.state)
    }

    pub fn list(&self, tenant_id: TenantId) -> Vec<Requisition> {
        self.store.list(tenant_id).into_iter().map(|r| r.state).collect()
    }

    pub fn is_stale(&self, tenant_id: TenantId) -> bool {
        self.lock_stale().contains(&tenant_id)
    }

    /// Requisitions whose current actionable step belongs to `approver`, most
    /// recent submission first, ties broken by code descending.
    pub fn actionable_for(&self, tenant_id: TenantId, approver: UserId) -> Vec<Requisition> {
        let mut hits: Vec<Requisition> = self
            .list(tenant_id)
            .into_iter()
            .filter(|r| {
                r.current_actionable_step()
                    .is_some_and(|step| step.approver_id == approver)
            })
            .collect();
        hits.sort_by(|a, b| {
            b.submitted_at()
                .cmp(&a.submitted_at())
                .then_with(|| b.code().cmp(&a.code()))
        });
        hits
    }

    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), RequisitionIndexError> {
        let mut stale = self.lock_stale();
        let applied = self.apply_one(envelope);
        if applied.is_err() {
            stale.insert(envelope.tenant_id());
        }
        applied
    }

    /// Bring the tenant's index up to date with `history`, the tenant's full
    /// requisition history as loaded from the event store.
    ///
    /// Envelopes the index already reflects are skipped. A stale tenant is
    /// replayed from scratch instead. On failure the tenant stays stale.
    pub fn catch_up<F, E>(&self, tenant_id: TenantId, history: F) -> Result<(), RequisitionIndexError>
    where
        F: FnOnce() -> Result<Vec<EventEnvelope<JsonValue>>, E>,
        E: std::fmt::Display,
    {
        let mut stale = self.lock_stale();
        let envs = history().map_err(|e| RequisitionIndexError::History(e.to_string()))?;

        let caught_up = if stale.contains(&tenant_id) {
            tracing::info!(tenant_id = %tenant_id, "replaying stale requisition index");
            self.replay(tenant_id, envs).map(|_| ())
        } else {
            sorted_for_tenant(tenant_id, envs)
                .iter()
                .try_for_each(|env| self.apply_one(env))
        };

        match caught_up {
            Ok(()) => {
                stale.remove(&tenant_id);
                Ok(())
            }
            Err(err) => {
                stale.insert(tenant_id);
                Err(err)
            }
        }
    }

    /// Drop the tenant's index and replay `envelopes` into it.
    pub fn rebuild_from_scratch(
        &self,
        tenant_id: TenantId,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<usize, RequisitionIndexError> {
        let mut stale = self.lock_stale();
        match self.replay(tenant_id, envelopes.into_iter().collect()) {
            Ok(indexed) => {
                stale.remove(&tenant_id);
                Ok(indexed)
            }
            Err(err) => {
                stale.insert(tenant_id);
                Err(err)
            }
        }
    }

    fn lock_stale(&self) -> MutexGuard<'_, HashSet<TenantId>> {
        self.stale.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn replay(
        &self,
        tenant_id: TenantId,
        envelopes: Vec<EventEnvelope<JsonValue>>,
    ) -> Result<usize, RequisitionIndexError> {
        let envs = sorted_for_tenant(tenant_id, envelopes);
        self.store.clear_tenant(tenant_id);
        for env in &envs {
            self.apply_one(env)?;
        }
        Ok(self.store.list(tenant_id).len())
    }

    fn apply_one(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), RequisitionIndexError> {
        if envelope.aggregate_type() != AGGREGATE_TYPE {
            return Ok(());
        }

        let tenant_id = envelope.tenant_id();
        let id = RequisitionId::new(envelope.aggregate_id());
        let seq = envelope.sequence_number();

        let existing = self.store.get(tenant_id, &id);
        let last = existing.as_ref().map(|r| r.last_sequence).unwrap_or(0);
        match envelope.delivery_after(last) {
            Delivery::Next => {}
            Delivery::Redelivered => return Ok(()),
            Delivery::Gap { .. } => {
                return Err(RequisitionIndexError::NonMonotonicSequence { last, found: seq });
            }
        }

        let ev: RequisitionEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| RequisitionIndexError::Deserialize(e.to_string()))?;

        if ev.tenant_id() != tenant_id {
            return Err(RequisitionIndexError::TenantIsolation(
                "event tenant_id does not match envelope tenant_id".to_string(),
            ));
        }
        if ev.requisition_id() != id {
            return Err(RequisitionIndexError::TenantIsolation(
                "event requisition_id does not match envelope aggregate_id".to_string(),
            ));
        }

        let mut state = existing
            .map(|r| r.state)
            .unwrap_or_else(|| Requisition::empty(id));
        state.apply(&ev);
        self.store.upsert(
            tenant_id,
            id,
            IndexedRequisition {
                state,
                last_sequence: seq,
            },
        );
        Ok(())
    }
}

fn sorted_for_tenant(
    tenant_id: TenantId,
    envelopes: Vec<EventEnvelope<JsonValue>>,
) -> Vec<EventEnvelope<JsonValue>> {
    let mut envs: Vec<_> = envelopes
        .into_iter()
        .filter(|e| e.tenant_id() == tenant_id)
        .collect();
    envs.sort_by_key(|e| (*e.aggregate_id().as_uuid(), e.sequence_number()));
    envs
}

impl<S> InlineProjection for RequisitionIndexProjection<S>
where
    S: TenantStore<RequisitionId, IndexedRequisition>,
{
    fn project(&self, committed: &[StoredEvent]) {
        let mut stale = self.lock_stale();
        for stored in committed {
            if let Err(err) = self.apply_one(&stored.to_envelope()) {
                stale.insert(stored.tenant_id);
                tracing::warn!(
                    tenant_id = %stored.tenant_id,
                    aggregate_id = %stored.aggregate_id,
                    sequence_number = stored.sequence_number,
                    error = %err,
                    "requisition index marked stale"
                );
                break;
            }
        }
    }
}
