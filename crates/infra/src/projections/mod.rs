//! Read-model projections fed inline by the command dispatcher.

pub mod requisition_index;

pub use requisition_index::{IndexedRequisition, RequisitionIndexError, RequisitionIndexProjection};
