//! Approval chains: construction, validation and the "whose turn" rule.
//!
//! Everything here is a pure function over a slice of steps. The actionable
//! step is never stored; callers recompute it from the committed steps on
//! every read.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reqflow_core::{DomainError, DomainResult, Entity, UserId};

use crate::directory::{Approver, ApproverRole, rank_approvers};

/// Comment recorded on a step approved through self-authorization.
pub const SELF_AUTHORIZATION_COMMENT: &str = "auto-approved: submitter holds this approval level";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Pending,
    Approved,
    Rejected,
}

/// An approver's verdict on their step.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn outcome(self) -> DecisionStatus {
        match self {
            Decision::Approve => DecisionStatus::Approved,
            Decision::Reject => DecisionStatus::Rejected,
        }
    }
}

/// One position in a requisition's approval chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    /// 1-based position; unique within the requisition.
    pub order: u32,
    pub approver_id: UserId,
    pub approver_role: ApproverRole,
    pub status: DecisionStatus,
    pub decided_by: Option<UserId>,
    pub decided_at: Option<DateTime<Utc>>,
    pub comment: Option<String>,
}

impl ApprovalStep {
    pub fn pending(order: u32, approver: &Approver) -> Self {
        Self {
            order,
            approver_id: approver.user_id,
            approver_role: approver.role,
            status: DecisionStatus::Pending,
            decided_by: None,
            decided_at: None,
            comment: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == DecisionStatus::Pending
    }

    pub fn is_approved(&self) -> bool {
        self.status == DecisionStatus::Approved
    }

    pub fn is_rejected(&self) -> bool {
        self.status == DecisionStatus::Rejected
    }

    /// Record a decision on this step.
    pub fn record(
        &mut self,
        status: DecisionStatus,
        decided_by: UserId,
        decided_at: DateTime<Utc>,
        comment: Option<String>,
    ) {
        self.status = status;
        self.decided_by = Some(decided_by);
        self.decided_at = Some(decided_at);
        self.comment = comment;
    }
}

impl Entity for ApprovalStep {
    type Id = u32;

    fn id(&self) -> u32 {
        self.order
    }
}

/// Build the approval chain for a submission.
///
/// `approvers` is the directory listing for the submitter's unit; it is ranked
/// again here so the result never depends on the caller's ordering. If the
/// submitter is one of the approvers, exactly that step is pre-approved and
/// attributed to the submitter; every other step starts pending.
///
/// An empty listing yields an empty chain (no approval gate).
pub fn build_chain(
    approvers: &[Approver],
    submitter: UserId,
    now: DateTime<Utc>,
) -> DomainResult<Vec<ApprovalStep>> {
    let ranked = rank_approvers(approvers.to_vec());

    let steps: Vec<ApprovalStep> = ranked
        .iter()
        .zip(1u32..)
        .map(|(approver, order)| {
            let mut step = ApprovalStep::pending(order, approver);
            if approver.user_id == submitter {
                step.record(
                    DecisionStatus::Approved,
                    submitter,
                    now,
                    Some(SELF_AUTHORIZATION_COMMENT.to_string()),
                );
            }
            step
        })
        .collect();

    validate_chain(&steps)?;
    Ok(steps)
}

/// Rebuild a chain from a fresh directory listing.
///
/// Applies the same self-authorization rule as [`build_chain`] and carries over
/// `approved` decisions of approvers who are still listed. Pending steps of
/// approvers who left the directory disappear; new approvers start pending.
pub fn rebuild_chain(
    existing: &[ApprovalStep],
    approvers: &[Approver],
    submitter: UserId,
    now: DateTime<Utc>,
) -> DomainResult<Vec<ApprovalStep>> {
    if existing.iter().any(ApprovalStep::is_rejected) {
        return Err(DomainError::invalid_chain(
            "a rejected chain cannot be rebuilt",
        ));
    }

    let mut steps = build_chain(approvers, submitter, now)?;
    for step in &mut steps {
        let carried = existing
            .iter()
            .find(|prev| prev.approver_id == step.approver_id && prev.is_approved());
        if let Some(prev) = carried {
            step.status = prev.status;
            step.decided_by = prev.decided_by;
            step.decided_at = prev.decided_at;
            step.comment = prev.comment.clone();
        }
    }

    validate_chain(&steps)?;
    Ok(steps)
}

/// The step whose holder may act now.
///
/// Walks the chain in order: approved steps are skipped, the first pending step
/// is returned, and a rejected step ends the walk (nothing after it can ever
/// become actionable). Returns `None` for a fully approved or empty chain.
pub fn current_actionable(steps: &[ApprovalStep]) -> Option<&ApprovalStep> {
    for step in steps {
        match step.status {
            DecisionStatus::Approved => continue,
            DecisionStatus::Pending => return Some(step),
            DecisionStatus::Rejected => return None,
        }
    }
    None
}

/// True when every step is approved. Vacuously true for an empty chain.
pub fn chain_fully_approved(steps: &[ApprovalStep]) -> bool {
    steps.iter().all(ApprovalStep::is_approved)
}

/// Check the structural invariants of a chain.
///
/// - orders are exactly `1..=N`, in slice order
/// - an approver appears at most once
/// - no standard approver follows an administrator
pub fn validate_chain(steps: &[ApprovalStep]) -> DomainResult<()> {
    let mut seen = HashSet::with_capacity(steps.len());
    let mut admin_seen = false;

    for (expected, step) in (1u32..).zip(steps) {
        if step.order != expected {
            return Err(DomainError::invalid_chain(format!(
                "step orders must be gapless from 1 (expected {expected}, found {})",
                step.order
            )));
        }
        if !seen.insert(step.approver_id) {
            return Err(DomainError::invalid_chain(format!(
                "approver {} holds more than one step",
                step.approver_id
            )));
        }
        match step.approver_role {
            ApproverRole::Administrator => admin_seen = true,
            ApproverRole::Standard if admin_seen => {
                return Err(DomainError::invalid_chain(format!(
                    "standard approver at step {} follows an administrator",
                    step.order
                )));
            }
            ApproverRole::Standard => {}
        }
        if step.is_pending() && step.decided_at.is_some() {
            return Err(DomainError::invalid_chain(format!(
                "pending step {} carries a decision timestamp",
                step.order
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use reqflow_core::OrgUnitId;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-02T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn approvers(unit: OrgUnitId, standard: usize, admins: usize) -> Vec<Approver> {
        let mut out = Vec::new();
        for _ in 0..standard {
            out.push(Approver::new(UserId::new(), ApproverRole::Standard, [unit]));
        }
        for _ in 0..admins {
            out.push(Approver::new(UserId::new(), ApproverRole::Administrator, [unit]));
        }
        rank_approvers(out)
    }

    fn approve(steps: &mut [ApprovalStep], order: u32) {
        let step = &mut steps[(order - 1) as usize];
        let who = step.approver_id;
        step.record(DecisionStatus::Approved, who, now(), None);
    }

    #[test]
    fn submitter_step_is_pre_approved() {
        let list = approvers(OrgUnitId::new(), 2, 0);
        let submitter = list[0].user_id;

        let steps = build_chain(&list, submitter, now()).unwrap();

        assert_eq!(steps.len(), 2);
        assert!(steps[0].is_approved());
        assert_eq!(steps[0].decided_by, Some(submitter));
        assert_eq!(steps[0].comment.as_deref(), Some(SELF_AUTHORIZATION_COMMENT));
        assert!(steps[1].is_pending());
        assert_eq!(current_actionable(&steps).map(|s| s.order), Some(2));
    }

    #[test]
    fn self_authorization_in_the_middle_keeps_earlier_steps_pending() {
        let list = approvers(OrgUnitId::new(), 3, 0);
        let submitter = list[1].user_id;

        let mut steps = build_chain(&list, submitter, now()).unwrap();
        assert_eq!(current_actionable(&steps).map(|s| s.order), Some(1));

        approve(&mut steps, 1);
        assert_eq!(current_actionable(&steps).map(|s| s.order), Some(3));
    }

    #[test]
    fn empty_directory_yields_fully_approved_empty_chain() {
        let steps = build_chain(&[], UserId::new(), now()).unwrap();
        assert!(steps.is_empty());
        assert!(chain_fully_approved(&steps));
        assert!(current_actionable(&steps).is_none());
    }

    #[test]
    fn administrators_occupy_final_positions() {
        let unit = OrgUnitId::new();
        let mut list = approvers(unit, 2, 2);
        list.reverse();

        let steps = build_chain(&list, UserId::new(), now()).unwrap();
        let roles: Vec<_> = steps.iter().map(|s| s.approver_role).collect();
        assert_eq!(
            roles,
            vec![
                ApproverRole::Standard,
                ApproverRole::Standard,
                ApproverRole::Administrator,
                ApproverRole::Administrator,
            ]
        );
    }

    #[test]
    fn rejection_stops_the_walk() {
        let list = approvers(OrgUnitId::new(), 3, 0);
        let mut steps = build_chain(&list, UserId::new(), now()).unwrap();
        let who = steps[0].approver_id;
        steps[0].record(DecisionStatus::Rejected, who, now(), Some("no budget".into()));

        assert!(current_actionable(&steps).is_none());
        assert!(!chain_fully_approved(&steps));
    }

    #[test]
    fn validate_rejects_gaps_and_duplicates() {
        let list = approvers(OrgUnitId::new(), 2, 0);
        let mut steps = build_chain(&list, UserId::new(), now()).unwrap();

        let mut gapped = steps.clone();
        gapped[1].order = 3;
        assert!(matches!(
            validate_chain(&gapped),
            Err(DomainError::InvalidChain(_))
        ));

        steps[1].approver_id = steps[0].approver_id;
        assert!(matches!(
            validate_chain(&steps),
            Err(DomainError::InvalidChain(_))
        ));
    }

    #[test]
    fn validate_rejects_standard_after_administrator() {
        let unit = OrgUnitId::new();
        let admin = Approver::new(UserId::new(), ApproverRole::Administrator, [unit]);
        let standard = Approver::new(UserId::new(), ApproverRole::Standard, [unit]);
        let steps = vec![ApprovalStep::pending(1, &admin), ApprovalStep::pending(2, &standard)];

        assert!(matches!(
            validate_chain(&steps),
            Err(DomainError::InvalidChain(_))
        ));
    }

    #[test]
    fn rebuild_with_same_directory_is_identical() {
        let list = approvers(OrgUnitId::new(), 3, 1);
        let submitter = list[1].user_id;
        let mut steps = build_chain(&list, submitter, now()).unwrap();
        approve(&mut steps, 1);

        let later = now() + chrono::Duration::hours(2);
        let rebuilt = rebuild_chain(&steps, &list, submitter, later).unwrap();
        assert_eq!(rebuilt, steps);
    }

    #[test]
    fn rebuild_carries_approvals_and_drops_departed_approvers() {
        let unit = OrgUnitId::new();
        let list = approvers(unit, 3, 0);
        let mut steps = build_chain(&list, UserId::new(), now()).unwrap();
        approve(&mut steps, 1);

        let newcomer = Approver::new(UserId::new(), ApproverRole::Administrator, [unit]);
        let updated = vec![list[0].clone(), list[2].clone(), newcomer.clone()];

        let rebuilt = rebuild_chain(&steps, &updated, UserId::new(), now()).unwrap();

        assert_eq!(rebuilt.len(), 3);
        assert!(rebuilt.iter().all(|s| s.approver_id != list[1].user_id));
        let first = rebuilt.iter().find(|s| s.approver_id == list[0].user_id).unwrap();
        assert!(first.is_approved());
        assert_eq!(rebuilt[2].approver_id, newcomer.user_id);
        assert!(rebuilt[2].is_pending());
    }

    #[test]
    fn rebuild_refuses_rejected_chain() {
        let list = approvers(OrgUnitId::new(), 2, 0);
        let mut steps = build_chain(&list, UserId::new(), now()).unwrap();
        let who = steps[0].approver_id;
        steps[0].record(DecisionStatus::Rejected, who, now(), None);

        assert!(matches!(
            rebuild_chain(&steps, &list, UserId::new(), now()),
            Err(DomainError::InvalidChain(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn orders_are_exactly_one_to_n(
            standard in 0usize..6,
            admins in 0usize..4,
            self_index in proptest::option::of(0usize..10),
        ) {
            let list = approvers(OrgUnitId::new(), standard, admins);
            let submitter = self_index
                .and_then(|i| list.get(i))
                .map(|a| a.user_id)
                .unwrap_or_else(UserId::new);

            let steps = build_chain(&list, submitter, now()).unwrap();

            let orders: Vec<u32> = steps.iter().map(|s| s.order).collect();
            let expected: Vec<u32> = (1..=list.len() as u32).collect();
            prop_assert_eq!(orders, expected);
            prop_assert!(steps.iter().filter(|s| s.is_approved()).count() <= 1);
        }

        #[test]
        fn nothing_after_a_rejection_is_ever_actionable(
            len in 1usize..7,
            reject_at in 0usize..7,
            approve_after in proptest::collection::vec(any::<bool>(), 7),
        ) {
            let reject_at = reject_at % len;
            let list = approvers(OrgUnitId::new(), len, 0);
            let mut steps = build_chain(&list, UserId::new(), now()).unwrap();
            for order in 1..=reject_at as u32 {
                approve(&mut steps, order);
            }
            let who = steps[reject_at].approver_id;
            steps[reject_at].record(DecisionStatus::Rejected, who, now(), None);

            // Later steps flipping to approved must not revive the chain.
            for (i, flip) in approve_after.iter().enumerate().take(len).skip(reject_at + 1) {
                if *flip {
                    approve(&mut steps, i as u32 + 1);
                }
            }

            prop_assert!(current_actionable(&steps).is_none());
        }
    }
}
