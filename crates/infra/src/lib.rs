//! Infrastructure layer: event stores, approver directory, code sequences,
//! command dispatch, read models, and the requisition lifecycle coordinator.

pub mod chain_builder;
pub mod command_dispatcher;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod directory;
pub mod error;
pub mod event_store;
pub mod projections;
pub mod read_model;
pub mod sequence;
pub mod wiring;

#[cfg(test)]
mod integration_tests;

pub use config::{ConfigError, EngineConfig};
pub use coordinator::{ChainRepair, RequisitionDraft, RequisitionLifecycleCoordinator};
pub use error::EngineError;
