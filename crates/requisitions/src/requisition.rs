use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reqflow_core::{Aggregate, AggregateId, AggregateRoot, DomainError, OrgUnitId, TenantId, UserId};
use reqflow_events::Event;

use crate::chain::{
    ApprovalStep, Decision, chain_fully_approved, current_actionable, rebuild_chain, validate_chain,
};
use crate::code::RequisitionCode;
use crate::directory::Approver;
use crate::reconciliation::{
    FulfillmentSummary, LineItem, LineItemDraft, Receipt, all_lines_satisfied, summarize,
};

/// Stream type tag used by the event store.
pub const AGGREGATE_TYPE: &str = "requisitions.requisition";

/// Requisition identifier (event stream key; tenant-scoped via `tenant_id` fields).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequisitionId(pub AggregateId);

impl RequisitionId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for RequisitionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Address of one line item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItemId {
    pub requisition_id: RequisitionId,
    pub line_no: u32,
}

impl LineItemId {
    pub fn new(requisition_id: RequisitionId, line_no: u32) -> Self {
        Self {
            requisition_id,
            line_no,
        }
    }
}

/// Aggregate status. Never stored: derived from steps and reception facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequisitionStatus {
    PendingApproval,
    InReview,
    ApprovedAwaitingFulfillment,
    Rejected,
    Fulfilling,
    Closed,
}

impl RequisitionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RequisitionStatus::Rejected | RequisitionStatus::Closed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequisitionStatus::PendingApproval => "pending_approval",
            RequisitionStatus::InReview => "in_review",
            RequisitionStatus::ApprovedAwaitingFulfillment => "approved_awaiting_fulfillment",
            RequisitionStatus::Rejected => "rejected",
            RequisitionStatus::Fulfilling => "fulfilling",
            RequisitionStatus::Closed => "closed",
        }
    }
}

impl core::fmt::Display for RequisitionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facts fixed at submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequisitionHeader {
    pub tenant_id: TenantId,
    pub code: RequisitionCode,
    pub submitter: UserId,
    pub unit: OrgUnitId,
    pub submitted_at: DateTime<Utc>,
    pub justification: Option<String>,
}

/// Aggregate root: Requisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requisition {
    id: RequisitionId,
    header: Option<RequisitionHeader>,
    steps: Vec<ApprovalStep>,
    lines: Vec<LineItem>,
    in_review: Option<u32>,
    closed_at: Option<DateTime<Utc>>,
    version: u64,
}

impl Requisition {
    /// Create an empty, not-yet-submitted aggregate instance for rehydration.
    pub fn empty(id: RequisitionId) -> Self {
        Self {
            id,
            header: None,
            steps: Vec::new(),
            lines: Vec::new(),
            in_review: None,
            closed_at: None,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> RequisitionId {
        self.id
    }

    pub fn is_submitted(&self) -> bool {
        self.header.is_some()
    }

    pub fn header(&self) -> Option<&RequisitionHeader> {
        self.header.as_ref()
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.header.as_ref().map(|h| h.tenant_id)
    }

    pub fn code(&self) -> Option<&RequisitionCode> {
        self.header.as_ref().map(|h| &h.code)
    }

    pub fn submitter(&self) -> Option<UserId> {
        self.header.as_ref().map(|h| h.submitter)
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.header.as_ref().map(|h| h.submitted_at)
    }

    pub fn steps(&self) -> &[ApprovalStep] {
        &self.steps
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn line(&self, line_no: u32) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.line_no == line_no)
    }

    pub fn in_review(&self) -> Option<u32> {
        self.in_review
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    pub fn current_actionable_step(&self) -> Option<&ApprovalStep> {
        current_actionable(&self.steps)
    }

    pub fn step_of(&self, approver_id: UserId) -> Option<&ApprovalStep> {
        self.steps.iter().find(|s| s.approver_id == approver_id)
    }

    pub fn is_rejected(&self) -> bool {
        self.steps.iter().any(ApprovalStep::is_rejected)
    }

    pub fn status(&self) -> RequisitionStatus {
        if self.is_rejected() {
            return RequisitionStatus::Rejected;
        }
        if self.closed_at.is_some() {
            return RequisitionStatus::Closed;
        }
        if chain_fully_approved(&self.steps) {
            let any_receipt = self.lines.iter().any(|l| !l.receipts.is_empty());
            return if any_receipt {
                RequisitionStatus::Fulfilling
            } else {
                RequisitionStatus::ApprovedAwaitingFulfillment
            };
        }
        match (self.in_review, self.current_actionable_step()) {
            (Some(marked), Some(step)) if marked == step.order => RequisitionStatus::InReview,
            _ => RequisitionStatus::PendingApproval,
        }
    }

    /// Comment of the rejecting step, if any.
    pub fn rejection_reason(&self) -> Option<&str> {
        self.steps
            .iter()
            .find(|s| s.is_rejected())
            .and_then(|s| s.comment.as_deref())
    }

    pub fn fulfillment_summary(&self) -> FulfillmentSummary {
        summarize(&self.lines)
    }
}

impl AggregateRoot for Requisition {
    type Id = RequisitionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: SubmitRequisition.
///
/// `chain` is produced by the chain builder from the directory listing at
/// submission time; the aggregate only validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequisition {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub code: RequisitionCode,
    pub submitter: UserId,
    pub unit: OrgUnitId,
    pub justification: Option<String>,
    pub lines: Vec<LineItemDraft>,
    pub chain: Vec<ApprovalStep>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DecideStep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecideStep {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub approver_id: UserId,
    pub decision: Decision,
    pub comment: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkInReview (idempotent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkInReview {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub approver_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordReceipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordReceipt {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub line_no: u32,
    pub quantity: i64,
    pub recorded_by: UserId,
    pub source_document: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecomputeFulfillment (idempotent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecomputeFulfillment {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RebuildChain (administrative repair).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildChain {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub approvers: Vec<Approver>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequisitionCommand {
    SubmitRequisition(SubmitRequisition),
    DecideStep(DecideStep),
    MarkInReview(MarkInReview),
    RecordReceipt(RecordReceipt),
    RecomputeFulfillment(RecomputeFulfillment),
    RebuildChain(RebuildChain),
}

/// Event: RequisitionSubmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequisitionSubmitted {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub code: RequisitionCode,
    pub submitter: UserId,
    pub unit: OrgUnitId,
    pub justification: Option<String>,
    pub lines: Vec<LineItem>,
    pub chain: Vec<ApprovalStep>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StepDecided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDecided {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub order: u32,
    pub approver_id: UserId,
    pub decision: Decision,
    pub comment: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StepMarkedInReview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepMarkedInReview {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub order: u32,
    pub approver_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReceiptRecorded.
///
/// `cumulative_received` is the line's running total including this receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptRecorded {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub line_no: u32,
    pub quantity: i64,
    pub cumulative_received: i64,
    pub recorded_by: UserId,
    pub source_document: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequisitionClosed. Emitted at most once per requisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequisitionClosed {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ApprovalChainRebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalChainRebuilt {
    pub tenant_id: TenantId,
    pub requisition_id: RequisitionId,
    pub chain: Vec<ApprovalStep>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequisitionEvent {
    RequisitionSubmitted(RequisitionSubmitted),
    StepDecided(StepDecided),
    StepMarkedInReview(StepMarkedInReview),
    ReceiptRecorded(ReceiptRecorded),
    RequisitionClosed(RequisitionClosed),
    ApprovalChainRebuilt(ApprovalChainRebuilt),
}

impl RequisitionEvent {
    pub fn tenant_id(&self) -> TenantId {
        match self {
            RequisitionEvent::RequisitionSubmitted(e) => e.tenant_id,
            RequisitionEvent::StepDecided(e) => e.tenant_id,
            RequisitionEvent::StepMarkedInReview(e) => e.tenant_id,
            RequisitionEvent::ReceiptRecorded(e) => e.tenant_id,
            RequisitionEvent::RequisitionClosed(e) => e.tenant_id,
            RequisitionEvent::ApprovalChainRebuilt(e) => e.tenant_id,
        }
    }

    pub fn requisition_id(&self) -> RequisitionId {
        match self {
            RequisitionEvent::RequisitionSubmitted(e) => e.requisition_id,
            RequisitionEvent::StepDecided(e) => e.requisition_id,
            RequisitionEvent::StepMarkedInReview(e) => e.requisition_id,
            RequisitionEvent::ReceiptRecorded(e) => e.requisition_id,
            RequisitionEvent::RequisitionClosed(e) => e.requisition_id,
            RequisitionEvent::ApprovalChainRebuilt(e) => e.requisition_id,
        }
    }
}

impl Event for RequisitionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RequisitionEvent::RequisitionSubmitted(_) => "requisitions.requisition.submitted",
            RequisitionEvent::StepDecided(_) => "requisitions.requisition.step_decided",
            RequisitionEvent::StepMarkedInReview(_) => "requisitions.requisition.step_in_review",
            RequisitionEvent::ReceiptRecorded(_) => "requisitions.requisition.receipt_recorded",
            RequisitionEvent::RequisitionClosed(_) => "requisitions.requisition.closed",
            RequisitionEvent::ApprovalChainRebuilt(_) => "requisitions.requisition.chain_rebuilt",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            RequisitionEvent::RequisitionSubmitted(e) => e.occurred_at,
            RequisitionEvent::StepDecided(e) => e.occurred_at,
            RequisitionEvent::StepMarkedInReview(e) => e.occurred_at,
            RequisitionEvent::ReceiptRecorded(e) => e.occurred_at,
            RequisitionEvent::RequisitionClosed(e) => e.occurred_at,
            RequisitionEvent::ApprovalChainRebuilt(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Requisition {
    type Command = RequisitionCommand;
    type Event = RequisitionEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            RequisitionEvent::RequisitionSubmitted(e) => {
                self.id = e.requisition_id;
                self.header = Some(RequisitionHeader {
                    tenant_id: e.tenant_id,
                    code: e.code.clone(),
                    submitter: e.submitter,
                    unit: e.unit,
                    submitted_at: e.occurred_at,
                    justification: e.justification.clone(),
                });
                self.lines = e.lines.clone();
                self.steps = e.chain.clone();
                self.in_review = None;
                self.closed_at = None;
            }
            RequisitionEvent::StepDecided(e) => {
                if let Some(step) = self.steps.iter_mut().find(|s| s.order == e.order) {
                    step.record(
                        e.decision.outcome(),
                        e.approver_id,
                        e.occurred_at,
                        e.comment.clone(),
                    );
                }
                self.in_review = None;
            }
            RequisitionEvent::StepMarkedInReview(e) => {
                self.in_review = Some(e.order);
            }
            RequisitionEvent::ReceiptRecorded(e) => {
                if let Some(line) = self.lines.iter_mut().find(|l| l.line_no == e.line_no) {
                    line.receipts.push(Receipt {
                        quantity: e.quantity,
                        recorded_by: e.recorded_by,
                        recorded_at: e.occurred_at,
                        source_document: e.source_document.clone(),
                    });
                }
            }
            RequisitionEvent::RequisitionClosed(e) => {
                self.closed_at = Some(e.occurred_at);
            }
            RequisitionEvent::ApprovalChainRebuilt(e) => {
                self.steps = e.chain.clone();
                self.in_review = None;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            RequisitionCommand::SubmitRequisition(cmd) => self.handle_submit(cmd),
            RequisitionCommand::DecideStep(cmd) => self.handle_decide(cmd),
            RequisitionCommand::MarkInReview(cmd) => self.handle_mark_in_review(cmd),
            RequisitionCommand::RecordReceipt(cmd) => self.handle_record_receipt(cmd),
            RequisitionCommand::RecomputeFulfillment(cmd) => self.handle_recompute(cmd),
            RequisitionCommand::RebuildChain(cmd) => self.handle_rebuild_chain(cmd),
        }
    }
}

impl Requisition {
    fn ensure_submitted(
        &self,
        tenant_id: TenantId,
        requisition_id: RequisitionId,
    ) -> Result<&RequisitionHeader, DomainError> {
        let header = self
            .header
            .as_ref()
            .ok_or_else(|| DomainError::not_found(format!("requisition {requisition_id}")))?;
        if header.tenant_id != tenant_id {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != requisition_id {
            return Err(DomainError::invariant("requisition_id mismatch"));
        }
        Ok(header)
    }

    /// Resolve the caller's step and check it is their turn.
    ///
    /// Check order matters: `AlreadyDecided` comes before the turn check so the
    /// loser of a race on the same step always sees `AlreadyDecided`.
    fn actionable_step_of(&self, approver_id: UserId) -> Result<&ApprovalStep, DomainError> {
        let step = self.step_of(approver_id).ok_or_else(|| {
            DomainError::not_found(format!(
                "approval step for approver {approver_id} on requisition {}",
                self.id
            ))
        })?;

        if !step.is_pending() {
            return Err(DomainError::AlreadyDecided { order: step.order });
        }

        let status = self.status();
        if status.is_terminal() {
            return Err(DomainError::forbidden(format!("requisition is {status}")));
        }

        match self.current_actionable_step() {
            Some(current) if current.order == step.order => Ok(step),
            Some(current) => Err(DomainError::forbidden(format!(
                "step {} is not actionable yet; step {} is waiting",
                step.order, current.order
            ))),
            None => Err(DomainError::forbidden(format!(
                "step {} can no longer be acted on",
                step.order
            ))),
        }
    }

    fn handle_submit(
        &self,
        cmd: &SubmitRequisition,
    ) -> Result<Vec<RequisitionEvent>, DomainError> {
        if self.is_submitted() {
            return Err(DomainError::conflict("requisition already exists"));
        }
        if self.id != cmd.requisition_id {
            return Err(DomainError::invariant("requisition_id mismatch"));
        }

        for draft in &cmd.lines {
            draft.validate()?;
        }
        validate_chain(&cmd.chain)?;
        if cmd.chain.iter().any(ApprovalStep::is_rejected) {
            return Err(DomainError::invalid_chain(
                "a new chain cannot contain rejected steps",
            ));
        }

        let lines = cmd
            .lines
            .iter()
            .zip(1u32..)
            .map(|(draft, line_no)| LineItem::from_draft(line_no, draft))
            .collect();

        Ok(vec![RequisitionEvent::RequisitionSubmitted(
            RequisitionSubmitted {
                tenant_id: cmd.tenant_id,
                requisition_id: cmd.requisition_id,
                code: cmd.code.clone(),
                submitter: cmd.submitter,
                unit: cmd.unit,
                justification: cmd.justification.clone(),
                lines,
                chain: cmd.chain.clone(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_decide(&self, cmd: &DecideStep) -> Result<Vec<RequisitionEvent>, DomainError> {
        self.ensure_submitted(cmd.tenant_id, cmd.requisition_id)?;
        let step = self.actionable_step_of(cmd.approver_id)?;

        Ok(vec![RequisitionEvent::StepDecided(StepDecided {
            tenant_id: cmd.tenant_id,
            requisition_id: cmd.requisition_id,
            order: step.order,
            approver_id: cmd.approver_id,
            decision: cmd.decision,
            comment: cmd.comment.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_mark_in_review(
        &self,
        cmd: &MarkInReview,
    ) -> Result<Vec<RequisitionEvent>, DomainError> {
        self.ensure_submitted(cmd.tenant_id, cmd.requisition_id)?;
        let step = self.actionable_step_of(cmd.approver_id)?;

        if self.in_review == Some(step.order) {
            return Ok(vec![]);
        }

        Ok(vec![RequisitionEvent::StepMarkedInReview(
            StepMarkedInReview {
                tenant_id: cmd.tenant_id,
                requisition_id: cmd.requisition_id,
                order: step.order,
                approver_id: cmd.approver_id,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_record_receipt(
        &self,
        cmd: &RecordReceipt,
    ) -> Result<Vec<RequisitionEvent>, DomainError> {
        self.ensure_submitted(cmd.tenant_id, cmd.requisition_id)?;

        if cmd.quantity <= 0 {
            return Err(DomainError::InvalidQuantity(cmd.quantity));
        }

        let line = self.line(cmd.line_no).ok_or_else(|| {
            DomainError::not_found(format!(
                "line item {} on requisition {}",
                cmd.line_no, self.id
            ))
        })?;

        if self.is_rejected() {
            return Err(DomainError::not_receivable("requisition was rejected"));
        }
        if !chain_fully_approved(&self.steps) {
            return Err(DomainError::not_receivable(
                "approval chain is not complete",
            ));
        }

        let cumulative_received = line
            .received_quantity()
            .checked_add(cmd.quantity)
            .ok_or(DomainError::InvalidQuantity(cmd.quantity))?;

        let mut events = vec![RequisitionEvent::ReceiptRecorded(ReceiptRecorded {
            tenant_id: cmd.tenant_id,
            requisition_id: cmd.requisition_id,
            line_no: cmd.line_no,
            quantity: cmd.quantity,
            cumulative_received,
            recorded_by: cmd.recorded_by,
            source_document: cmd.source_document.clone(),
            occurred_at: cmd.occurred_at,
        })];

        // Closure rides in the same batch as the receipt that completes it.
        if self.closed_at.is_none() {
            let satisfied_after = self.lines.iter().all(|l| {
                if l.line_no == cmd.line_no {
                    cumulative_received >= l.requested_quantity
                } else {
                    l.is_satisfied()
                }
            });
            if satisfied_after {
                events.push(RequisitionEvent::RequisitionClosed(RequisitionClosed {
                    tenant_id: cmd.tenant_id,
                    requisition_id: cmd.requisition_id,
                    occurred_at: cmd.occurred_at,
                }));
            }
        }

        Ok(events)
    }

    fn handle_recompute(
        &self,
        cmd: &RecomputeFulfillment,
    ) -> Result<Vec<RequisitionEvent>, DomainError> {
        self.ensure_submitted(cmd.tenant_id, cmd.requisition_id)?;

        let closable = self.closed_at.is_none()
            && !self.is_rejected()
            && chain_fully_approved(&self.steps)
            && all_lines_satisfied(&self.lines);
        if !closable {
            return Ok(vec![]);
        }

        Ok(vec![RequisitionEvent::RequisitionClosed(RequisitionClosed {
            tenant_id: cmd.tenant_id,
            requisition_id: cmd.requisition_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_rebuild_chain(
        &self,
        cmd: &RebuildChain,
    ) -> Result<Vec<RequisitionEvent>, DomainError> {
        let header = self.ensure_submitted(cmd.tenant_id, cmd.requisition_id)?;

        let status = self.status();
        if status.is_terminal() {
            return Err(DomainError::invalid_chain(format!(
                "cannot rebuild the chain of a {status} requisition"
            )));
        }
        if chain_fully_approved(&self.steps) {
            return Err(DomainError::invalid_chain(
                "chain is already fully approved",
            ));
        }

        let rebuilt = rebuild_chain(&self.steps, &cmd.approvers, header.submitter, cmd.occurred_at)?;
        if rebuilt == self.steps {
            return Ok(vec![]);
        }

        Ok(vec![RequisitionEvent::ApprovalChainRebuilt(
            ApprovalChainRebuilt {
                tenant_id: cmd.tenant_id,
                requisition_id: cmd.requisition_id,
                chain: rebuilt,
                occurred_at: cmd.occurred_at,
            },
        )])
    }
}
