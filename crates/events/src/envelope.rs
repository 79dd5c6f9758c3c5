use serde::{Deserialize, Serialize};
use uuid::Uuid;

use reqflow_core::{AggregateId, TenantId};

/// How an envelope relates to the last sequence number a consumer has seen
/// for its stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Exactly the next event.
    Next,
    /// Already seen; safe to skip.
    Redelivered,
    /// One or more events are missing before this one (or the number is 0).
    Gap { expected: u64 },
}

/// A committed event plus its stream coordinates.
///
/// `sequence_number` is the event's position in its requisition stream; it is
/// gapless and starts at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    tenant_id: TenantId,
    aggregate_id: AggregateId,
    aggregate_type: String,
    sequence_number: u64,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        sequence_number: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            tenant_id,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Classify this envelope against the consumer's checkpoint for the stream
    /// (`0` when nothing has been seen yet).
    pub fn delivery_after(&self, last_seen: u64) -> Delivery {
        let seq = self.sequence_number;
        if seq == 0 {
            return Delivery::Gap {
                expected: last_seen + 1,
            };
        }
        if seq <= last_seen {
            Delivery::Redelivered
        } else if seq == last_seen + 1 {
            Delivery::Next
        } else {
            Delivery::Gap {
                expected: last_seen + 1,
            }
        }
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
