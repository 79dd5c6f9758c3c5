//! Public error taxonomy of the requisition engine.

use thiserror::Error;

use reqflow_auth::{AuthError, AuthzError};
use reqflow_core::DomainError;

use crate::command_dispatcher::DispatchError;
use crate::directory::DirectoryError;
use crate::event_store::EventStoreError;
use crate::sequence::SequenceError;

/// Every engine operation fails with one of these.
///
/// `Forbidden` ("not your turn") and `AlreadyDecided` ("someone already
/// decided this") are deliberately separate so clients can tell them apart;
/// [`EngineError::kind`] gives the stable machine-readable code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("approval step {order} was already decided")]
    AlreadyDecided { order: u32 },

    #[error("invalid quantity: {0} (must be greater than zero)")]
    InvalidQuantity(i64),

    #[error("invalid approval chain: {0}")]
    InvalidChain(String),

    #[error("requisition cannot receive goods: {0}")]
    NotReceivable(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Storage or directory failure. Nothing was written; the engine does not retry.
    #[error("store failure: {0}")]
    StoreFailure(String),
}

impl EngineError {
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::NotFound(_) => "not_found",
            EngineError::Forbidden(_) => "forbidden",
            EngineError::AlreadyDecided { .. } => "already_decided",
            EngineError::InvalidQuantity(_) => "invalid_quantity",
            EngineError::InvalidChain(_) => "invalid_chain",
            EngineError::NotReceivable(_) => "not_receivable",
            EngineError::Validation(_) => "validation",
            EngineError::Unauthenticated(_) => "unauthenticated",
            EngineError::StoreFailure(_) => "store_failure",
        }
    }
}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound(what) => EngineError::NotFound(what),
            DomainError::Forbidden(msg) => EngineError::Forbidden(msg),
            DomainError::AlreadyDecided { order } => EngineError::AlreadyDecided { order },
            DomainError::InvalidQuantity(q) => EngineError::InvalidQuantity(q),
            DomainError::InvalidChain(msg) => EngineError::InvalidChain(msg),
            DomainError::NotReceivable(msg) => EngineError::NotReceivable(msg),
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => EngineError::Validation(msg),
            // Only reachable through a corrupt or foreign stream.
            DomainError::InvariantViolation(msg) | DomainError::Conflict(msg) => {
                EngineError::StoreFailure(msg)
            }
        }
    }
}

impl From<DispatchError> for EngineError {
    fn from(value: DispatchError) -> Self {
        match value {
            DispatchError::Domain(err) => err.into(),
            other => EngineError::StoreFailure(other.to_string()),
        }
    }
}

impl From<EventStoreError> for EngineError {
    fn from(value: EventStoreError) -> Self {
        EngineError::StoreFailure(value.to_string())
    }
}

impl From<DirectoryError> for EngineError {
    fn from(value: DirectoryError) -> Self {
        EngineError::StoreFailure(value.to_string())
    }
}

impl From<SequenceError> for EngineError {
    fn from(value: SequenceError) -> Self {
        EngineError::StoreFailure(value.to_string())
    }
}

impl From<AuthError> for EngineError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::Unavailable(msg) => EngineError::StoreFailure(msg),
            other => EngineError::Unauthenticated(other.to_string()),
        }
    }
}

impl From<AuthzError> for EngineError {
    fn from(value: AuthzError) -> Self {
        EngineError::Forbidden(value.to_string())
    }
}
