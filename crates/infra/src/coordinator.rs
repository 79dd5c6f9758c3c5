//! Requisition lifecycle coordinator: the engine's public surface.
//!
//! Every operation takes a resolved [`Principal`]; the principal's tenant scopes
//! all reads and writes. Mutations go through the [`CommandDispatcher`], so each
//! one is a single atomic append on the requisition's stream performed under
//! that stream's writer lock. Reads rehydrate from the event store, except
//! `list_actionable`, which is served by the inline requisition index after it
//! catches up with the store.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::instrument;

use reqflow_auth::{AuthProvider, Principal, Role, require_role};
use reqflow_core::{AggregateId, TenantId, UserId};
use reqflow_events::{EventBus, EventEnvelope};
use reqflow_requisitions::{
    AGGREGATE_TYPE, ApprovalStep, DecideStep, Decision, FulfillmentSummary, LineItemDraft,
    LineItemId, MarkInReview, RebuildChain, RecomputeFulfillment, RecordReceipt, Requisition,
    RequisitionCode, RequisitionCommand, RequisitionId, RequisitionStatus, SubmitRequisition,
};

use crate::chain_builder::ApprovalChainBuilder;
use crate::command_dispatcher::{CommandDispatcher, Dispatched};
use crate::config::EngineConfig;
use crate::directory::ApproverDirectory;
use crate::error::EngineError;
use crate::event_store::{EventStore, StoredEvent};
use crate::projections::requisition_index::{IndexedRequisition, RequisitionIndexProjection};
use crate::read_model::InMemoryTenantStore;
use crate::sequence::SequenceAllocator;

pub type RequisitionIndex =
    RequisitionIndexProjection<Arc<InMemoryTenantStore<RequisitionId, IndexedRequisition>>>;

/// What a requester submits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequisitionDraft {
    pub justification: Option<String>,
    pub lines: Vec<LineItemDraft>,
}

impl RequisitionDraft {
    pub fn new(lines: Vec<LineItemDraft>) -> Self {
        Self {
            justification: None,
            lines,
        }
    }

    pub fn with_justification(mut self, justification: impl Into<String>) -> Self {
        self.justification = Some(justification.into());
        self
    }
}

/// Outcome of `repair_chain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainRepair {
    /// The directory still yields the stored chain; nothing was written.
    Intact,
    Rebuilt { steps: usize },
}

pub struct RequisitionLifecycleCoordinator<S, B, D, Q> {
    dispatcher: CommandDispatcher<S, B>,
    chain_builder: ApprovalChainBuilder<D>,
    sequences: Q,
    auth: Arc<dyn AuthProvider>,
    index: Arc<RequisitionIndex>,
    code_prefix: String,
    code_width: usize,
}

impl<S, B, D, Q> RequisitionLifecycleCoordinator<S, B, D, Q>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
    D: ApproverDirectory,
    Q: SequenceAllocator,
{
    pub fn new(
        store: S,
        bus: B,
        directory: D,
        sequences: Q,
        auth: Arc<dyn AuthProvider>,
        config: &EngineConfig,
    ) -> Self {
        let index: Arc<RequisitionIndex> = Arc::new(RequisitionIndexProjection::new(Arc::new(
            InMemoryTenantStore::new(),
        )));
        let dispatcher = CommandDispatcher::new(store, bus).with_projection(index.clone());

        Self {
            dispatcher,
            chain_builder: ApprovalChainBuilder::new(directory),
            sequences,
            auth,
            index,
            code_prefix: config.code_prefix.clone(),
            code_width: config.code_width,
        }
    }

    /// Bus carrying every committed event, for downstream subscribers.
    pub fn bus(&self) -> &B {
        self.dispatcher.bus()
    }

    pub fn directory(&self) -> &D {
        self.chain_builder.directory()
    }

    pub fn authenticate(&self, token: &str) -> Result<Principal, EngineError> {
        Ok(self.auth.resolve(token)?)
    }

    // ---- mutations ----

    /// Submit a new requisition and return its identifier.
    ///
    /// The approval chain is built from the directory listing for the
    /// submitter's unit at this moment; later directory edits only reach the
    /// requisition through `repair_chain`.
    #[instrument(
        skip_all,
        fields(tenant_id = %principal.tenant_id, submitter = %principal.user_id, lines = draft.lines.len()),
        err
    )]
    pub fn submit(
        &self,
        principal: &Principal,
        draft: RequisitionDraft,
    ) -> Result<RequisitionId, EngineError> {
        for line in &draft.lines {
            line.validate()?;
        }

        let tenant_id = principal.tenant_id;
        let now = Utc::now();
        let chain = self
            .chain_builder
            .build(tenant_id, principal.unit, principal.user_id, now)?;

        let counter = self.sequences.next_value(tenant_id, &self.code_prefix)?;
        let code = RequisitionCode::new(self.code_prefix.clone(), counter, self.code_width)?;
        let requisition_id = RequisitionId::new(AggregateId::new());

        let dispatched = self.dispatch(
            tenant_id,
            requisition_id,
            RequisitionCommand::SubmitRequisition(SubmitRequisition {
                tenant_id,
                requisition_id,
                code: code.clone(),
                submitter: principal.user_id,
                unit: principal.unit,
                justification: draft.justification,
                lines: draft.lines,
                chain,
                occurred_at: now,
            }),
        )?;

        tracing::info!(
            requisition_id = %requisition_id,
            code = %code,
            steps = dispatched.state.steps().len(),
            status = %dispatched.state.status(),
            "requisition submitted"
        );
        Ok(requisition_id)
    }

    /// Approve or reject the caller's step. Returns the resulting status.
    #[instrument(
        skip_all,
        fields(tenant_id = %principal.tenant_id, requisition_id = %requisition_id, approver_id = %principal.user_id, decision = ?decision),
        err
    )]
    pub fn decide(
        &self,
        principal: &Principal,
        requisition_id: RequisitionId,
        decision: Decision,
        comment: Option<String>,
    ) -> Result<RequisitionStatus, EngineError> {
        let tenant_id = principal.tenant_id;
        let dispatched = self.dispatch(
            tenant_id,
            requisition_id,
            RequisitionCommand::DecideStep(DecideStep {
                tenant_id,
                requisition_id,
                approver_id: principal.user_id,
                decision,
                comment,
                occurred_at: Utc::now(),
            }),
        )?;

        let status = dispatched.state.status();
        tracing::info!(status = %status, "approval step decided");
        Ok(status)
    }

    /// Flag the caller's (actionable) step as under deliberation.
    #[instrument(
        skip_all,
        fields(tenant_id = %principal.tenant_id, requisition_id = %requisition_id, approver_id = %principal.user_id),
        err
    )]
    pub fn mark_in_review(
        &self,
        principal: &Principal,
        requisition_id: RequisitionId,
    ) -> Result<RequisitionStatus, EngineError> {
        let tenant_id = principal.tenant_id;
        let dispatched = self.dispatch(
            tenant_id,
            requisition_id,
            RequisitionCommand::MarkInReview(MarkInReview {
                tenant_id,
                requisition_id,
                approver_id: principal.user_id,
                occurred_at: Utc::now(),
            }),
        )?;
        if dispatched.committed.is_empty() {
            tracing::debug!("step already marked in review");
        }
        Ok(dispatched.state.status())
    }

    /// Record goods received against a line. Returns the line's cumulative
    /// received quantity; closes the requisition in the same append when every
    /// line is satisfied.
    ///
    /// The recorder must be the submitter or a principal authorized for the
    /// requisition's unit.
    #[instrument(
        skip_all,
        fields(tenant_id = %principal.tenant_id, requisition_id = %line.requisition_id, line_no = line.line_no, quantity = quantity),
        err
    )]
    pub fn record_receipt(
        &self,
        principal: &Principal,
        line: LineItemId,
        quantity: i64,
        source_document: Option<String>,
    ) -> Result<i64, EngineError> {
        let tenant_id = principal.tenant_id;
        let requisition_id = line.requisition_id;

        let current = self.load_submitted(tenant_id, requisition_id)?;
        let may_record = current.header().is_some_and(|h| {
            h.submitter == principal.user_id || principal.may_decide_for(h.unit)
        });
        if !may_record {
            return Err(EngineError::Forbidden(format!(
                "user {} may not record receipts for requisition {requisition_id}",
                principal.user_id
            )));
        }

        let dispatched = self.dispatch(
            tenant_id,
            requisition_id,
            RequisitionCommand::RecordReceipt(RecordReceipt {
                tenant_id,
                requisition_id,
                line_no: line.line_no,
                quantity,
                recorded_by: principal.user_id,
                source_document,
                occurred_at: Utc::now(),
            }),
        )?;

        let cumulative = dispatched
            .state
            .line(line.line_no)
            .map(|l| l.received_quantity())
            .ok_or_else(|| EngineError::NotFound(format!("line item {}", line.line_no)))?;

        let status = dispatched.state.status();
        tracing::info!(cumulative, status = %status, "receipt recorded");
        Ok(cumulative)
    }

    /// Re-evaluate closure. Idempotent; closes at most once.
    #[instrument(
        skip_all,
        fields(tenant_id = %principal.tenant_id, requisition_id = %requisition_id),
        err
    )]
    pub fn recompute_fulfillment(
        &self,
        principal: &Principal,
        requisition_id: RequisitionId,
    ) -> Result<RequisitionStatus, EngineError> {
        let tenant_id = principal.tenant_id;
        let dispatched = self.dispatch(
            tenant_id,
            requisition_id,
            RequisitionCommand::RecomputeFulfillment(RecomputeFulfillment {
                tenant_id,
                requisition_id,
                occurred_at: Utc::now(),
            }),
        )?;

        let status = dispatched.state.status();
        if !dispatched.committed.is_empty() {
            tracing::info!(status = %status, "requisition closed by recompute");
        }
        Ok(status)
    }

    /// Rebuild a non-terminal chain from the current directory (administrators only).
    #[instrument(
        skip_all,
        fields(tenant_id = %principal.tenant_id, requisition_id = %requisition_id, admin_id = %principal.user_id),
        err
    )]
    pub fn repair_chain(
        &self,
        principal: &Principal,
        requisition_id: RequisitionId,
    ) -> Result<ChainRepair, EngineError> {
        require_role(principal, Role::Administrator)?;
        let tenant_id = principal.tenant_id;

        // The unit is fixed at submission, so reading it outside the lock is safe.
        let current = self.load_submitted(tenant_id, requisition_id)?;
        let unit = current
            .header()
            .map(|h| h.unit)
            .ok_or_else(|| EngineError::NotFound(format!("requisition {requisition_id}")))?;
        let approvers = self.chain_builder.approvers(tenant_id, unit)?;

        let dispatched = self.dispatch(
            tenant_id,
            requisition_id,
            RequisitionCommand::RebuildChain(RebuildChain {
                tenant_id,
                requisition_id,
                approvers,
                occurred_at: Utc::now(),
            }),
        )?;

        if dispatched.committed.is_empty() {
            tracing::info!("approval chain intact");
            return Ok(ChainRepair::Intact);
        }
        let steps = dispatched.state.steps().len();
        tracing::info!(steps, "approval chain rebuilt");
        Ok(ChainRepair::Rebuilt { steps })
    }

    // ---- queries ----

    pub fn get_requisition(
        &self,
        principal: &Principal,
        requisition_id: RequisitionId,
    ) -> Result<Requisition, EngineError> {
        self.load_submitted(principal.tenant_id, requisition_id)
    }

    pub fn get_status(
        &self,
        principal: &Principal,
        requisition_id: RequisitionId,
    ) -> Result<RequisitionStatus, EngineError> {
        Ok(self.get_requisition(principal, requisition_id)?.status())
    }

    pub fn get_chain(
        &self,
        principal: &Principal,
        requisition_id: RequisitionId,
    ) -> Result<Vec<ApprovalStep>, EngineError> {
        Ok(self
            .get_requisition(principal, requisition_id)?
            .steps()
            .to_vec())
    }

    pub fn current_actionable_step(
        &self,
        principal: &Principal,
        requisition_id: RequisitionId,
    ) -> Result<Option<ApprovalStep>, EngineError> {
        Ok(self
            .get_requisition(principal, requisition_id)?
            .current_actionable_step()
            .cloned())
    }

    pub fn fulfillment_summary(
        &self,
        principal: &Principal,
        requisition_id: RequisitionId,
    ) -> Result<FulfillmentSummary, EngineError> {
        Ok(self
            .get_requisition(principal, requisition_id)?
            .fulfillment_summary())
    }

    /// Requisitions waiting on `approver_id`, most recent submission first.
    ///
    /// Callers may list their own queue; administrators may list anyone's.
    /// The index first catches up with the tenant's history in the event
    /// store, so commits from other processes or before a restart are listed.
    #[instrument(
        skip_all,
        fields(tenant_id = %principal.tenant_id, approver_id = %approver_id),
        err
    )]
    pub fn list_actionable(
        &self,
        principal: &Principal,
        approver_id: UserId,
    ) -> Result<Vec<Requisition>, EngineError> {
        if approver_id != principal.user_id {
            require_role(principal, Role::Administrator)?;
        }
        let tenant_id = principal.tenant_id;
        let store = self.dispatcher.store();
        self.index
            .catch_up(tenant_id, || {
                store
                    .load_tenant(tenant_id, AGGREGATE_TYPE)
                    .map(|history| history.iter().map(StoredEvent::to_envelope).collect())
            })
            .map_err(|e| EngineError::StoreFailure(format!("requisition index: {e}")))?;
        let hits = self.index.actionable_for(tenant_id, approver_id);
        tracing::debug!(count = hits.len(), "actionable requisitions listed");
        Ok(hits)
    }

    /// Replace the tenant's requisition index with a replay of its event
    /// streams (administrators only). Returns the number of requisitions
    /// indexed.
    #[instrument(skip_all, fields(tenant_id = %principal.tenant_id), err)]
    pub fn rebuild_index(&self, principal: &Principal) -> Result<usize, EngineError> {
        require_role(principal, Role::Administrator)?;
        let tenant_id = principal.tenant_id;
        let history = self
            .dispatcher
            .store()
            .load_tenant(tenant_id, AGGREGATE_TYPE)?;
        let indexed = self
            .index
            .rebuild_from_scratch(tenant_id, history.iter().map(|e| e.to_envelope()))
            .map_err(|e| EngineError::StoreFailure(e.to_string()))?;
        tracing::info!(indexed, "requisition index rebuilt");
        Ok(indexed)
    }

    fn dispatch(
        &self,
        tenant_id: TenantId,
        requisition_id: RequisitionId,
        command: RequisitionCommand,
    ) -> Result<Dispatched<Requisition>, EngineError> {
        Ok(self.dispatcher.dispatch(
            tenant_id,
            requisition_id.0,
            AGGREGATE_TYPE,
            command,
            |_, id| Requisition::empty(RequisitionId::new(id)),
        )?)
    }

    fn load_submitted(
        &self,
        tenant_id: TenantId,
        requisition_id: RequisitionId,
    ) -> Result<Requisition, EngineError> {
        let state = self
            .dispatcher
            .load(tenant_id, requisition_id.0, |_, id| {
                Requisition::empty(RequisitionId::new(id))
            })?;
        if !state.is_submitted() {
            return Err(EngineError::NotFound(format!(
                "requisition {requisition_id}"
            )));
        }
        Ok(state)
    }
}
