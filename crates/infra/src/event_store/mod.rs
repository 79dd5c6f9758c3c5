//! Append-only event store boundary.
//!
//! Requisition streams are tenant-scoped and appended with an expected
//! revision. `InMemoryEventStore` serves tests and dev wiring;
//! `PostgresEventStore` is the durable backend.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
