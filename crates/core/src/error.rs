//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Deterministic business failures only. Storage and transport failures are
/// modelled in the infrastructure layer and never appear here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input (empty description, negative price, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The addressed requisition, step or line item does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller may not act on this step (not their turn, or terminal requisition).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The caller's step already carries a decision.
    #[error("approval step {order} was already decided")]
    AlreadyDecided { order: u32 },

    /// Receipt quantities must be strictly positive.
    #[error("invalid quantity: {0} (must be greater than zero)")]
    InvalidQuantity(i64),

    /// The approval chain would break its ordering invariants.
    #[error("invalid approval chain: {0}")]
    InvalidChain(String),

    /// Receipts are not accepted in the requisition's current state.
    #[error("requisition cannot receive goods: {0}")]
    NotReceivable(String),

    /// Stale stream revision.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn invalid_chain(msg: impl Into<String>) -> Self {
        Self::InvalidChain(msg.into())
    }

    pub fn not_receivable(msg: impl Into<String>) -> Self {
        Self::NotReceivable(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
