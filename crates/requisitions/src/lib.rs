//! Requisition domain module (purchase requisitions, event-sourced).
//!
//! Business rules for approval chains and receipt reconciliation, implemented
//! as deterministic domain logic (no IO, no storage, no clocks).

pub mod chain;
pub mod code;
pub mod directory;
pub mod reconciliation;
pub mod requisition;

pub use chain::{
    ApprovalStep, Decision, DecisionStatus, SELF_AUTHORIZATION_COMMENT, build_chain,
    chain_fully_approved, current_actionable, rebuild_chain, validate_chain,
};
pub use code::RequisitionCode;
pub use directory::{Approver, ApproverRole, approvers_for_unit, rank_approvers};
pub use reconciliation::{
    FulfillmentSummary, LineFulfillment, LineItem, LineItemDraft, Priority, Receipt,
    ReceptionStatus, all_lines_satisfied, summarize,
};
pub use requisition::{
    AGGREGATE_TYPE, ApprovalChainRebuilt, DecideStep, LineItemId, MarkInReview, RebuildChain,
    ReceiptRecorded, RecomputeFulfillment, RecordReceipt, Requisition, RequisitionClosed,
    RequisitionCommand, RequisitionEvent, RequisitionHeader, RequisitionId, RequisitionStatus,
    RequisitionSubmitted, StepDecided, StepMarkedInReview, SubmitRequisition,
};
