//! Process-wide tracing setup shared by every reqflow binary and bench.

/// Subscriber construction (filters, JSON formatting).
pub mod tracing;

pub use crate::tracing::{init, init_with_filter};
