//! Command execution pipeline for event-sourced aggregates.
//!
//! ```text
//! Command
//!   ↓  take the (tenant, stream) writer lock
//! 1. Load events from store (tenant-scoped)
//!   ↓
//! 2. Rehydrate aggregate
//!   ↓
//! 3. Handle command (pure decision, produces events)
//!   ↓
//! 4. Append with ExpectedVersion::Exact(loaded revision)
//!   ↓
//! 5. Run inline projections, publish to the bus
//!   ↓  release the lock
//! ```
//!
//! The writer lock makes load → decide → append linearizable per stream inside
//! one process, so a second writer always decides against the first writer's
//! committed state. The conditional append backs this up when several
//! processes share one durable store; a stale revision there fails the command
//! with `DispatchError::Concurrency` and nothing is written. There is no retry
//! loop.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use reqflow_core::{Aggregate, AggregateId, DomainError, ExpectedVersion, TenantId};
use reqflow_events::{EventBus, EventEnvelope};

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Deterministic business rejection from the aggregate.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The stream moved between load and append (another process wrote).
    #[error("stream revision changed concurrently: {0}")]
    Concurrency(String),

    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    /// A stored payload no longer deserializes into the aggregate's event type.
    #[error("failed to deserialize stored event: {0}")]
    Deserialize(String),

    #[error(transparent)]
    Store(EventStoreError),

    #[error("stream lock table poisoned")]
    LockPoisoned,
}

impl From<EventStoreError> for DispatchError {
    fn from(value: EventStoreError) -> Self {
        match value {
            EventStoreError::Concurrency(msg) => DispatchError::Concurrency(msg),
            EventStoreError::TenantIsolation(msg) => DispatchError::TenantIsolation(msg),
            other => DispatchError::Store(other),
        }
    }
}

/// A read model fed synchronously with every commit, while the stream lock is
/// still held. Per-stream delivery order therefore matches commit order.
pub trait InlineProjection: Send + Sync {
    fn project(&self, committed: &[StoredEvent]);
}

/// Result of a successful dispatch: the committed events and the state they
/// produced. `committed` is empty when the command was a no-op.
#[derive(Debug)]
pub struct Dispatched<A> {
    pub state: A,
    pub committed: Vec<StoredEvent>,
}

type StreamKey = (TenantId, AggregateId);

/// One mutex per live stream.
///
/// Entries are removed again once no dispatch holds or waits on them.
#[derive(Debug, Default)]
pub struct StreamLocks {
    inner: Mutex<HashMap<StreamKey, Arc<Mutex<()>>>>,
}

impl StreamLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn acquire(&self, key: StreamKey) -> Result<Arc<Mutex<()>>, DispatchError> {
        let mut map = self.inner.lock().map_err(|_| DispatchError::LockPoisoned)?;
        Ok(map.entry(key).or_default().clone())
    }

    fn release(&self, key: StreamKey) {
        if let Ok(mut map) = self.inner.lock() {
            if map.get(&key).is_some_and(|m| Arc::strong_count(m) == 1) {
                map.remove(&key);
            }
        }
    }

    /// Number of streams currently tracked.
    pub fn tracked(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    fn with_stream<T>(
        &self,
        key: StreamKey,
        f: impl FnOnce() -> Result<T, DispatchError>,
    ) -> Result<T, DispatchError> {
        let lock = self.acquire(key)?;
        let result = {
            // The mutex guards no data, so a poisoned lock is still usable.
            let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f()
        };
        drop(lock);
        self.release(key);
        result
    }
}

pub struct CommandDispatcher<S, B> {
    store: S,
    bus: B,
    locks: StreamLocks,
    projections: Vec<Arc<dyn InlineProjection>>,
}

impl<S, B> CommandDispatcher<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self {
            store,
            bus,
            locks: StreamLocks::new(),
            projections: Vec::new(),
        }
    }

    pub fn with_projection(mut self, projection: Arc<dyn InlineProjection>) -> Self {
        self.projections.push(projection);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn locks(&self) -> &StreamLocks {
        &self.locks
    }
}

impl<S, B> CommandDispatcher<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Run one command against one stream. See the module docs for the steps.
    pub fn dispatch<A>(
        &self,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        command: A::Command,
        make_aggregate: impl FnOnce(TenantId, AggregateId) -> A,
    ) -> Result<Dispatched<A>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: reqflow_events::Event + Serialize + DeserializeOwned,
    {
        self.locks.with_stream((tenant_id, aggregate_id), || {
            let history = self.store.load_stream(tenant_id, aggregate_id)?;
            validate_loaded_stream(tenant_id, aggregate_id, &history)?;
            let expected = ExpectedVersion::Exact(stream_version(&history));

            let mut aggregate = make_aggregate(tenant_id, aggregate_id);
            apply_history(&mut aggregate, &history)?;

            let decided = aggregate.handle(&command)?;
            if decided.is_empty() {
                return Ok(Dispatched {
                    state: aggregate,
                    committed: vec![],
                });
            }

            let uncommitted = decided
                .iter()
                .map(|ev| {
                    UncommittedEvent::from_typed(
                        tenant_id,
                        aggregate_id,
                        aggregate_type,
                        Uuid::now_v7(),
                        ev,
                    )
                })
                .collect::<Result<Vec<_>, _>>()?;

            let committed = self.store.append(uncommitted, expected)?;
            for ev in &decided {
                aggregate.apply(ev);
            }

            for projection in &self.projections {
                projection.project(&committed);
            }
            // The store is the source of truth; a failed publish does not undo the commit.
            for stored in &committed {
                if let Err(err) = self.bus.publish(stored.to_envelope()) {
                    tracing::warn!(
                        event_id = %stored.event_id,
                        error = ?err,
                        "committed event could not be published"
                    );
                }
            }

            Ok(Dispatched {
                state: aggregate,
                committed,
            })
        })
    }

    /// Rehydrate an aggregate without taking the writer lock (read path).
    pub fn load<A>(
        &self,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        make_aggregate: impl FnOnce(TenantId, AggregateId) -> A,
    ) -> Result<A, DispatchError>
    where
        A: Aggregate,
        A::Event: DeserializeOwned,
    {
        let history = self.store.load_stream(tenant_id, aggregate_id)?;
        validate_loaded_stream(tenant_id, aggregate_id, &history)?;
        let mut aggregate = make_aggregate(tenant_id, aggregate_id);
        apply_history(&mut aggregate, &history)?;
        Ok(aggregate)
    }
}

fn stream_version(stream: &[StoredEvent]) -> u64 {
    stream.last().map(|e| e.sequence_number).unwrap_or(0)
}

fn validate_loaded_stream(
    tenant_id: TenantId,
    aggregate_id: AggregateId,
    stream: &[StoredEvent],
) -> Result<(), DispatchError> {
    for (expected, e) in (1u64..).zip(stream) {
        if e.tenant_id != tenant_id {
            return Err(DispatchError::TenantIsolation(format!(
                "loaded stream contains wrong tenant_id at sequence {}",
                e.sequence_number
            )));
        }
        if e.aggregate_id != aggregate_id {
            return Err(DispatchError::TenantIsolation(format!(
                "loaded stream contains wrong aggregate_id at sequence {}",
                e.sequence_number
            )));
        }
        if e.sequence_number != expected {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "loaded stream is not gapless (expected {expected}, found {})",
                e.sequence_number
            ))));
        }
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[StoredEvent]) -> Result<(), DispatchError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    for stored in history {
        let ev: A::Event = serde_json::from_value(stored.payload.clone())
            .map_err(|e| DispatchError::Deserialize(format!("{}: {e}", stored.event_type)))?;
        aggregate.apply(&ev);
    }
    Ok(())
}
