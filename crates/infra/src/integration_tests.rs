//! End-to-end tests of the requisition lifecycle over in-memory stores.
//!
//! Coordinator → dispatcher → event store → inline index → bus.

use std::sync::{Arc, Barrier};

use chrono::{Duration, Utc};
use proptest::prelude::*;
use serde_json::Value as JsonValue;

use reqflow_auth::{InMemoryAuthProvider, Principal, Role, TokenClaims};
use reqflow_core::{OrgUnitId, TenantId, UserId};
use reqflow_events::{EventBus, EventEnvelope, InMemoryEventBus, Subscription};
use reqflow_requisitions::{
    Approver, ApproverRole, Decision, DecisionStatus, LineItemDraft, LineItemId, ReceptionStatus,
    RequisitionId, RequisitionStatus, SELF_AUTHORIZATION_COMMENT,
};

use crate::config::EngineConfig;
use crate::coordinator::{ChainRepair, RequisitionDraft, RequisitionLifecycleCoordinator};
use crate::directory::InMemoryApproverDirectory;
use crate::error::EngineError;
use crate::event_store::InMemoryEventStore;
use crate::sequence::InMemorySequenceAllocator;
use crate::wiring::SharedBus;

type TestEngine = RequisitionLifecycleCoordinator<
    InMemoryEventStore,
    SharedBus,
    Arc<InMemoryApproverDirectory>,
    InMemorySequenceAllocator,
>;

struct World {
    engine: TestEngine,
    auth: Arc<InMemoryAuthProvider>,
    tenant_id: TenantId,
    unit: OrgUnitId,
}

impl World {
    fn new() -> Self {
        let auth = Arc::new(InMemoryAuthProvider::new());
        let engine = RequisitionLifecycleCoordinator::new(
            InMemoryEventStore::new(),
            Arc::new(InMemoryEventBus::new()),
            Arc::new(InMemoryApproverDirectory::new()),
            InMemorySequenceAllocator::new(),
            auth.clone(),
            &EngineConfig::default(),
        );
        Self {
            engine,
            auth,
            tenant_id: TenantId::new(),
            unit: OrgUnitId::new(),
        }
    }

    fn principal(&self, role: Role, authorized_units: Vec<OrgUnitId>) -> Principal {
        Principal {
            user_id: UserId::new(),
            tenant_id: self.tenant_id,
            role,
            unit: self.unit,
            authorized_units,
        }
    }

    fn requester(&self) -> Principal {
        self.principal(Role::Requester, vec![])
    }

    /// A principal who is also listed in the directory for the world's unit.
    fn approver(&self, role: ApproverRole) -> Principal {
        let principal_role = match role {
            ApproverRole::Standard => Role::Approver,
            ApproverRole::Administrator => Role::Administrator,
        };
        let principal = self.principal(principal_role, vec![self.unit]);
        self.list_in_directory(&principal, role);
        principal
    }

    fn list_in_directory(&self, principal: &Principal, role: ApproverRole) {
        self.engine
            .directory()
            .upsert(
                self.tenant_id,
                Approver::new(principal.user_id, role, [self.unit]),
            )
            .unwrap();
    }

    fn submit(&self, by: &Principal, lines: Vec<LineItemDraft>) -> RequisitionId {
        self.engine.submit(by, RequisitionDraft::new(lines)).unwrap()
    }

    fn status(&self, by: &Principal, id: RequisitionId) -> RequisitionStatus {
        self.engine.get_status(by, id).unwrap()
    }
}

fn toner(quantity: i64) -> Vec<LineItemDraft> {
    vec![LineItemDraft::new("Printer toner", quantity, 4_500)]
}

fn closed_events(sub: &Subscription<EventEnvelope<JsonValue>>) -> usize {
    sub.drain()
        .iter()
        .filter(|env| env.payload().get("RequisitionClosed").is_some())
        .count()
}

#[test]
fn submitter_at_first_level_is_pre_approved() {
    let world = World::new();
    let submitter = world.approver(ApproverRole::Standard);
    let admin = world.approver(ApproverRole::Administrator);

    let id = world.submit(&submitter, toner(10));

    let chain = world.engine.get_chain(&submitter, id).unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0].order, 1);
    assert_eq!(chain[0].approver_id, submitter.user_id);
    assert_eq!(chain[0].status, DecisionStatus::Approved);
    assert_eq!(chain[0].decided_by, Some(submitter.user_id));
    assert_eq!(chain[0].comment.as_deref(), Some(SELF_AUTHORIZATION_COMMENT));
    assert_eq!(chain[1].order, 2);
    assert_eq!(chain[1].approver_id, admin.user_id);
    assert!(chain[1].is_pending());

    assert_eq!(world.status(&submitter, id), RequisitionStatus::PendingApproval);
    let actionable = world.engine.current_actionable_step(&submitter, id).unwrap();
    assert_eq!(actionable.map(|s| s.order), Some(2));

    let queue = world.engine.list_actionable(&admin, admin.user_id).unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id_typed(), id);
    assert!(world
        .engine
        .list_actionable(&submitter, submitter.user_id)
        .unwrap()
        .is_empty());
}

#[test]
fn rejection_is_terminal_and_freezes_later_steps() {
    let world = World::new();
    let first = world.approver(ApproverRole::Standard);
    let admin = world.approver(ApproverRole::Administrator);
    let requester = world.requester();
    let id = world.submit(&requester, toner(3));

    let status = world
        .engine
        .decide(&first, id, Decision::Reject, Some("over budget".to_string()))
        .unwrap();
    assert_eq!(status, RequisitionStatus::Rejected);

    let requisition = world.engine.get_requisition(&requester, id).unwrap();
    assert_eq!(requisition.rejection_reason(), Some("over budget"));
    assert!(requisition.current_actionable_step().is_none());
    assert!(requisition.steps()[1].is_pending());

    let err = world
        .engine
        .decide(&admin, id, Decision::Approve, None)
        .unwrap_err();
    assert_eq!(err.kind(), "forbidden");

    let err = world
        .engine
        .decide(&first, id, Decision::Approve, None)
        .unwrap_err();
    assert_eq!(err, EngineError::AlreadyDecided { order: 1 });

    let err = world
        .engine
        .record_receipt(&requester, LineItemId::new(id, 1), 3, None)
        .unwrap_err();
    assert_eq!(err.kind(), "not_receivable");

    let err = world.engine.repair_chain(&admin, id).unwrap_err();
    assert_eq!(err.kind(), "invalid_chain");

    assert!(world
        .engine
        .list_actionable(&admin, admin.user_id)
        .unwrap()
        .is_empty());
    assert_eq!(world.status(&requester, id), RequisitionStatus::Rejected);
}

#[test]
fn cumulative_receipts_close_the_requisition() {
    let world = World::new();
    let requester = world.requester();
    let id = world.submit(&requester, toner(10));
    let line = LineItemId::new(id, 1);

    assert_eq!(
        world.engine.record_receipt(&requester, line, 4, None).unwrap(),
        4
    );
    assert_eq!(world.status(&requester, id), RequisitionStatus::Fulfilling);

    assert_eq!(
        world
            .engine
            .record_receipt(&requester, line, 6, Some("DN-7781".to_string()))
            .unwrap(),
        10
    );
    assert_eq!(world.status(&requester, id), RequisitionStatus::Closed);
}

#[test]
fn over_delivery_still_closes_once() {
    let world = World::new();
    let requester = world.requester();
    let id = world.submit(&requester, toner(10));
    let line = LineItemId::new(id, 1);
    let sub = world.engine.bus().subscribe();

    world.engine.record_receipt(&requester, line, 7, None).unwrap();
    assert_eq!(
        world.engine.record_receipt(&requester, line, 5, None).unwrap(),
        12
    );
    assert_eq!(world.status(&requester, id), RequisitionStatus::Closed);

    // Late deliveries are still recorded facts.
    assert_eq!(
        world.engine.record_receipt(&requester, line, 1, None).unwrap(),
        13
    );
    assert_eq!(world.status(&requester, id), RequisitionStatus::Closed);
    assert_eq!(closed_events(&sub), 1);

    let summary = world.engine.fulfillment_summary(&requester, id).unwrap();
    assert!(summary.fully_received);
    assert_eq!(summary.lines[0].received, 13);
    assert_eq!(summary.lines[0].status, ReceptionStatus::OverDelivered);
}

#[test]
fn empty_directory_means_no_approval_gate() {
    let world = World::new();
    let requester = world.requester();
    let id = world.submit(&requester, toner(1));

    assert!(world.engine.get_chain(&requester, id).unwrap().is_empty());
    assert_eq!(
        world.status(&requester, id),
        RequisitionStatus::ApprovedAwaitingFulfillment
    );
    assert!(world
        .engine
        .current_actionable_step(&requester, id)
        .unwrap()
        .is_none());
}

#[test]
fn steps_are_decided_strictly_in_order() {
    let world = World::new();
    let first = world.approver(ApproverRole::Standard);
    let admin = world.approver(ApproverRole::Administrator);
    let requester = world.requester();
    let id = world.submit(&requester, toner(2));

    let err = world
        .engine
        .decide(&admin, id, Decision::Approve, None)
        .unwrap_err();
    assert_eq!(err.kind(), "forbidden");
    let err = world.engine.mark_in_review(&admin, id).unwrap_err();
    assert_eq!(err.kind(), "forbidden");

    assert_eq!(
        world.engine.decide(&first, id, Decision::Approve, None).unwrap(),
        RequisitionStatus::PendingApproval
    );
    assert_eq!(
        world.engine.decide(&admin, id, Decision::Approve, None).unwrap(),
        RequisitionStatus::ApprovedAwaitingFulfillment
    );
}

#[test]
fn outsiders_and_unknown_requisitions_are_not_found() {
    let world = World::new();
    world.approver(ApproverRole::Standard);
    let requester = world.requester();
    let outsider = world.principal(Role::Approver, vec![world.unit]);
    let id = world.submit(&requester, toner(2));

    let err = world
        .engine
        .decide(&outsider, id, Decision::Approve, None)
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");

    let missing = RequisitionId::new(reqflow_core::AggregateId::new());
    assert_eq!(
        world.engine.get_status(&requester, missing).unwrap_err().kind(),
        "not_found"
    );
}

#[test]
fn in_review_marker_is_idempotent_and_cleared_by_decision() {
    let world = World::new();
    let first = world.approver(ApproverRole::Standard);
    world.approver(ApproverRole::Administrator);
    let requester = world.requester();
    let id = world.submit(&requester, toner(2));
    let sub = world.engine.bus().subscribe();

    assert_eq!(
        world.engine.mark_in_review(&first, id).unwrap(),
        RequisitionStatus::InReview
    );
    assert_eq!(
        world.engine.mark_in_review(&first, id).unwrap(),
        RequisitionStatus::InReview
    );
    assert_eq!(sub.drain().len(), 1);

    assert_eq!(
        world.engine.decide(&first, id, Decision::Approve, None).unwrap(),
        RequisitionStatus::PendingApproval
    );
}

#[test]
fn concurrent_decisions_on_one_step_have_a_single_winner() {
    for _ in 0..20 {
        let world = World::new();
        let approver = world.approver(ApproverRole::Standard);
        let requester = world.requester();
        let id = world.submit(&requester, toner(1));
        let barrier = Barrier::new(2);

        let (approve, reject) = std::thread::scope(|s| {
            let approve = s.spawn(|| {
                barrier.wait();
                world.engine.decide(&approver, id, Decision::Approve, None)
            });
            let reject = s.spawn(|| {
                barrier.wait();
                world
                    .engine
                    .decide(&approver, id, Decision::Reject, Some("duplicate".to_string()))
            });
            (approve.join().unwrap(), reject.join().unwrap())
        });

        let final_status = world.status(&requester, id);
        match (approve, reject) {
            (Ok(status), Err(loser)) => {
                assert_eq!(loser, EngineError::AlreadyDecided { order: 1 });
                assert_eq!(status, RequisitionStatus::ApprovedAwaitingFulfillment);
                assert_eq!(final_status, status);
            }
            (Err(loser), Ok(status)) => {
                assert_eq!(loser, EngineError::AlreadyDecided { order: 1 });
                assert_eq!(status, RequisitionStatus::Rejected);
                assert_eq!(final_status, status);
            }
            other => panic!("expected exactly one winner, got {other:?}"),
        }
        assert_eq!(world.engine.get_chain(&requester, id).unwrap().len(), 1);
    }
}

#[test]
fn receipt_guards() {
    let world = World::new();
    let approver = world.approver(ApproverRole::Standard);
    let requester = world.requester();
    let stranger = world.requester();
    let id = world.submit(&requester, toner(5));
    let line = LineItemId::new(id, 1);

    let err = world
        .engine
        .record_receipt(&requester, line, 2, None)
        .unwrap_err();
    assert_eq!(err.kind(), "not_receivable");

    world.engine.decide(&approver, id, Decision::Approve, None).unwrap();

    assert_eq!(
        world.engine.record_receipt(&requester, line, 0, None).unwrap_err(),
        EngineError::InvalidQuantity(0)
    );
    assert_eq!(
        world
            .engine
            .record_receipt(&requester, LineItemId::new(id, 9), 1, None)
            .unwrap_err()
            .kind(),
        "not_found"
    );
    assert_eq!(
        world
            .engine
            .record_receipt(&stranger, line, 1, None)
            .unwrap_err()
            .kind(),
        "forbidden"
    );

    // Approvers of the unit may receive on the requester's behalf.
    assert_eq!(
        world.engine.record_receipt(&approver, line, 2, None).unwrap(),
        2
    );
}

#[test]
fn recompute_closes_zero_line_requisition_once() {
    let world = World::new();
    let requester = world.requester();
    let id = world.submit(&requester, vec![]);
    let sub = world.engine.bus().subscribe();

    assert_eq!(
        world.status(&requester, id),
        RequisitionStatus::ApprovedAwaitingFulfillment
    );
    assert_eq!(
        world.engine.recompute_fulfillment(&requester, id).unwrap(),
        RequisitionStatus::Closed
    );
    assert_eq!(
        world.engine.recompute_fulfillment(&requester, id).unwrap(),
        RequisitionStatus::Closed
    );
    assert_eq!(closed_events(&sub), 1);
}

#[test]
fn actionable_queue_is_newest_first() {
    let world = World::new();
    let approver = world.approver(ApproverRole::Standard);
    let admin = world.approver(ApproverRole::Administrator);
    let requester = world.requester();

    let first = world.submit(&requester, toner(1));
    let second = world.submit(&requester, toner(2));
    let third = world.submit(&requester, toner(3));

    let ids = |list: Vec<reqflow_requisitions::Requisition>| {
        list.iter().map(|r| r.id_typed()).collect::<Vec<_>>()
    };

    assert_eq!(
        ids(world.engine.list_actionable(&approver, approver.user_id).unwrap()),
        vec![third, second, first]
    );

    world
        .engine
        .decide(&approver, second, Decision::Approve, None)
        .unwrap();
    assert_eq!(
        ids(world.engine.list_actionable(&approver, approver.user_id).unwrap()),
        vec![third, first]
    );
    assert_eq!(
        ids(world.engine.list_actionable(&admin, admin.user_id).unwrap()),
        vec![second]
    );

    // Administrators may inspect another approver's queue; others may not.
    assert_eq!(
        world
            .engine
            .list_actionable(&admin, approver.user_id)
            .unwrap()
            .len(),
        2
    );
    assert_eq!(
        world
            .engine
            .list_actionable(&requester, approver.user_id)
            .unwrap_err()
            .kind(),
        "forbidden"
    );
}

#[test]
fn codes_are_sequential_and_skip_nothing_on_invalid_drafts() {
    let world = World::new();
    let requester = world.requester();

    let err = world
        .engine
        .submit(
            &requester,
            RequisitionDraft::new(vec![LineItemDraft::new("   ", 1, 100)]),
        )
        .unwrap_err();
    assert_eq!(err.kind(), "validation");

    let a = world.submit(&requester, toner(1));
    let b = world.engine
        .submit(
            &requester,
            RequisitionDraft::new(toner(1)).with_justification("restock"),
        )
        .unwrap();

    let code = |id| {
        world
            .engine
            .get_requisition(&requester, id)
            .unwrap()
            .code()
            .map(|c| c.to_string())
    };
    assert_eq!(code(a).as_deref(), Some("REQ-000001"));
    assert_eq!(code(b).as_deref(), Some("REQ-000002"));
}

#[test]
fn repair_chain_picks_up_directory_changes() {
    let world = World::new();
    let first = world.approver(ApproverRole::Standard);
    let admin = world.approver(ApproverRole::Administrator);
    let requester = world.requester();
    let id = world.submit(&requester, toner(4));

    world.engine.decide(&first, id, Decision::Approve, None).unwrap();
    assert_eq!(
        world.engine.repair_chain(&admin, id).unwrap(),
        ChainRepair::Intact
    );

    let newcomer = world.approver(ApproverRole::Standard);
    assert_eq!(
        world.engine.repair_chain(&requester, id).unwrap_err().kind(),
        "forbidden"
    );
    assert_eq!(
        world.engine.repair_chain(&admin, id).unwrap(),
        ChainRepair::Rebuilt { steps: 3 }
    );

    let chain = world.engine.get_chain(&requester, id).unwrap();
    let carried = chain
        .iter()
        .find(|s| s.approver_id == first.user_id)
        .unwrap();
    assert!(carried.is_approved());
    assert_eq!(carried.decided_by, Some(first.user_id));
    assert_eq!(chain[2].approver_id, admin.user_id);

    let actionable = world
        .engine
        .current_actionable_step(&requester, id)
        .unwrap()
        .unwrap();
    assert_eq!(actionable.approver_id, newcomer.user_id);
    assert!(world
        .engine
        .list_actionable(&admin, admin.user_id)
        .unwrap()
        .is_empty());
    assert_eq!(
        world
            .engine
            .list_actionable(&newcomer, newcomer.user_id)
            .unwrap()
            .len(),
        1
    );

    assert_eq!(
        world.engine.repair_chain(&admin, id).unwrap(),
        ChainRepair::Intact
    );

    world.engine.decide(&newcomer, id, Decision::Approve, None).unwrap();
    world.engine.decide(&admin, id, Decision::Approve, None).unwrap();
    assert_eq!(
        world.engine.repair_chain(&admin, id).unwrap_err().kind(),
        "invalid_chain"
    );
}

#[test]
fn tenants_do_not_see_each_other() {
    let world = World::new();
    let approver = world.approver(ApproverRole::Standard);
    let requester = world.requester();
    let id = world.submit(&requester, toner(1));

    let foreign = Principal {
        tenant_id: TenantId::new(),
        ..approver.clone()
    };

    assert_eq!(
        world.engine.get_requisition(&foreign, id).unwrap_err().kind(),
        "not_found"
    );
    assert_eq!(
        world
            .engine
            .decide(&foreign, id, Decision::Approve, None)
            .unwrap_err()
            .kind(),
        "not_found"
    );
    assert!(world
        .engine
        .list_actionable(&foreign, foreign.user_id)
        .unwrap()
        .is_empty());
    assert_eq!(
        world.engine.list_actionable(&approver, approver.user_id).unwrap().len(),
        1
    );
}

#[test]
fn index_rebuild_matches_live_index() {
    let world = World::new();
    let approver = world.approver(ApproverRole::Standard);
    let admin = world.approver(ApproverRole::Administrator);
    let requester = world.requester();
    for quantity in 1..=3 {
        world.submit(&requester, toner(quantity));
    }
    let before = world.engine.list_actionable(&approver, approver.user_id).unwrap();

    assert_eq!(
        world.engine.rebuild_index(&requester).unwrap_err().kind(),
        "forbidden"
    );
    assert_eq!(world.engine.rebuild_index(&admin).unwrap(), 3);
    assert_eq!(
        world.engine.list_actionable(&approver, approver.user_id).unwrap(),
        before
    );
}

type SharedStoreEngine = RequisitionLifecycleCoordinator<
    Arc<InMemoryEventStore>,
    SharedBus,
    Arc<InMemoryApproverDirectory>,
    Arc<InMemorySequenceAllocator>,
>;

/// Two engines over one store, like two processes or one engine before and
/// after a restart.
fn engine_pair(world: &World) -> (SharedStoreEngine, SharedStoreEngine) {
    let store = Arc::new(InMemoryEventStore::new());
    let directory = Arc::new(InMemoryApproverDirectory::new());
    let sequences = Arc::new(InMemorySequenceAllocator::new());
    let engine = || {
        RequisitionLifecycleCoordinator::new(
            store.clone(),
            Arc::new(InMemoryEventBus::new()),
            directory.clone(),
            sequences.clone(),
            world.auth.clone(),
            &EngineConfig::default(),
        )
    };
    (engine(), engine())
}

#[test]
fn queue_includes_requisitions_submitted_through_another_engine() {
    let world = World::new();
    let (first, second) = engine_pair(&world);
    let approver = world.principal(Role::Approver, vec![world.unit]);
    first
        .directory()
        .upsert(
            world.tenant_id,
            Approver::new(approver.user_id, ApproverRole::Standard, [world.unit]),
        )
        .unwrap();

    let id = first
        .submit(&world.requester(), RequisitionDraft::new(toner(2)))
        .unwrap();
    assert_eq!(first.list_actionable(&approver, approver.user_id).unwrap().len(), 1);

    let step = second.current_actionable_step(&approver, id).unwrap();
    assert_eq!(step.map(|s| s.approver_id), Some(approver.user_id));
    let queue = second.list_actionable(&approver, approver.user_id).unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id_typed(), id);
}

#[test]
fn engine_that_missed_earlier_events_serves_a_correct_queue() {
    let world = World::new();
    let (first, second) = engine_pair(&world);
    let approver = world.principal(Role::Approver, vec![world.unit]);
    let admin = world.principal(Role::Administrator, vec![world.unit]);
    for (who, role) in [
        (&approver, ApproverRole::Standard),
        (&admin, ApproverRole::Administrator),
    ] {
        first
            .directory()
            .upsert(world.tenant_id, Approver::new(who.user_id, role, [world.unit]))
            .unwrap();
    }

    let id = first
        .submit(&world.requester(), RequisitionDraft::new(toner(2)))
        .unwrap();
    // The second engine's index only sees the decision, out of sequence.
    second
        .decide(&approver, id, Decision::Approve, None)
        .unwrap();

    let admin_queue = second.list_actionable(&admin, admin.user_id).unwrap();
    assert_eq!(admin_queue.len(), 1);
    assert_eq!(admin_queue[0].id_typed(), id);
    assert!(second.list_actionable(&approver, approver.user_id).unwrap().is_empty());

    assert!(first.list_actionable(&approver, approver.user_id).unwrap().is_empty());
    assert_eq!(first.list_actionable(&admin, admin.user_id).unwrap().len(), 1);
}

#[test]
fn tokens_resolve_to_principals() {
    let world = World::new();
    let user = UserId::new();
    let now = Utc::now();
    world.auth.issue(
        "tok-requester",
        TokenClaims {
            sub: user,
            tenant_id: world.tenant_id,
            role: Role::Requester,
            unit: world.unit,
            authorized_units: vec![],
            issued_at: now - Duration::minutes(1),
            expires_at: now + Duration::minutes(10),
        },
    );

    let principal = world.engine.authenticate("tok-requester").unwrap();
    assert_eq!(principal.user_id, user);
    assert_eq!(principal.tenant_id, world.tenant_id);

    assert_eq!(
        world.engine.authenticate("tok-unknown").unwrap_err().kind(),
        "unauthenticated"
    );
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]

    #[test]
    fn recompute_is_idempotent(
        requested in proptest::collection::vec(1i64..20, 0..4),
        receipts in proptest::collection::vec((0usize..4, 1i64..15), 0..10),
    ) {
        let world = World::new();
        let requester = world.requester();
        let lines: Vec<LineItemDraft> = requested
            .iter()
            .map(|q| LineItemDraft::new("Cable", *q, 250))
            .collect();
        let id = world.submit(&requester, lines);
        let sub = world.engine.bus().subscribe();

        let mut received = vec![0i64; requested.len()];
        for (idx, quantity) in receipts {
            if idx >= requested.len() {
                continue;
            }
            let line_no = u32::try_from(idx + 1).unwrap();
            let cumulative = world
                .engine
                .record_receipt(&requester, LineItemId::new(id, line_no), quantity, None)
                .unwrap();
            received[idx] += quantity;
            prop_assert_eq!(cumulative, received[idx]);
        }

        let once = world.engine.recompute_fulfillment(&requester, id).unwrap();
        let twice = world.engine.recompute_fulfillment(&requester, id).unwrap();
        prop_assert_eq!(once, twice);

        let satisfied = requested.iter().zip(&received).all(|(r, got)| got >= r);
        prop_assert_eq!(once == RequisitionStatus::Closed, satisfied);
        prop_assert!(closed_events(&sub) <= 1);
    }
}
