//! `reqflow-core`: domain foundation building blocks.
//!
//! Identifiers, the domain error model and the aggregate contract shared by the
//! requisition domain and the infrastructure that persists it. No IO lives here.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, OrgUnitId, TenantId, UserId};
pub use value_object::ValueObject;
