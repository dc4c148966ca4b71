//! Pending → {Approved, Rejected} state machine shared by match review and entity onboarding.
//!
//! The workflow owns transition legality only. Callers hand it a mutable status handle while
//! holding whatever per-item serialization their store provides, and enforce authorization
//! before invoking it. Every accepted transition is appended to the ledger before returning;
//! a ledger failure leaves the transition in place and is reported as [`AuditStatus::Degraded`].

mod ledger;

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use ledger::{LedgerError, LedgerEvent, LedgerItemKind, LedgerSink};

use super::error::WorkflowError;

/// Coarse position of a reviewable item in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStage {
    Pending,
    Approved,
    Rejected,
}

/// Status enums that the workflow may drive. `from_stage(s).stage() == s` must hold.
pub trait ReviewState: Copy + Eq + fmt::Debug {
    fn stage(self) -> ReviewStage;
    fn from_stage(stage: ReviewStage) -> Self;
    fn label(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Admin,
    Hospital,
    Coordinator,
    Viewer,
}

/// Principal issuing a review decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: ActorRole) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    pub fn can_review(&self) -> bool {
        matches!(self.role, ActorRole::Admin | ActorRole::Hospital)
    }
}

/// Request body shared by approve/reject endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
    pub actor_id: String,
    pub role: ActorRole,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ReviewRequest {
    pub fn actor(&self) -> Actor {
        Actor::new(self.actor_id.clone(), self.role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject { reason: Option<String> },
}

impl ReviewDecision {
    fn target(&self) -> ReviewStage {
        match self {
            ReviewDecision::Approve => ReviewStage::Approved,
            ReviewDecision::Reject { .. } => ReviewStage::Rejected,
        }
    }

    fn reason(&self) -> Option<String> {
        match self {
            ReviewDecision::Approve => None,
            ReviewDecision::Reject { reason } => reason.clone(),
        }
    }
}

/// Identity of the item being transitioned, as written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSubject {
    pub item_id: String,
    pub kind: LedgerItemKind,
    pub score: Option<u8>,
}

/// Whether the audit trail caught up with a local decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditStatus {
    Recorded,
    /// Local state changed but the ledger write failed; `event` can be resent as-is.
    Degraded { reason: String, event: LedgerEvent },
}

impl AuditStatus {
    pub const fn label(&self) -> &'static str {
        match self {
            AuditStatus::Recorded => "recorded",
            AuditStatus::Degraded { .. } => "degraded",
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, AuditStatus::Degraded { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionReceipt {
    pub from: &'static str,
    pub to: &'static str,
    pub audit: AuditStatus,
}

impl TransitionReceipt {
    pub fn view(&self, item_id: impl Into<String>) -> ReviewView {
        ReviewView {
            item_id: item_id.into(),
            previous_status: self.from,
            status: self.to,
            audit: self.audit.label(),
            audit_error: match &self.audit {
                AuditStatus::Recorded => None,
                AuditStatus::Degraded { reason, .. } => Some(reason.clone()),
            },
        }
    }
}

/// Sanitized representation of a review decision for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    pub item_id: String,
    pub previous_status: &'static str,
    pub status: &'static str,
    pub audit: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_error: Option<String>,
}

pub struct VerificationWorkflow {
    ledger: Arc<dyn LedgerSink>,
}

impl VerificationWorkflow {
    pub fn new(ledger: Arc<dyn LedgerSink>) -> Self {
        Self { ledger }
    }

    /// Apply `decision` to `status`, which must currently be pending.
    pub fn transition<S: ReviewState>(
        &self,
        subject: &ReviewSubject,
        status: &mut S,
        decision: &ReviewDecision,
        actor: &Actor,
    ) -> Result<TransitionReceipt, WorkflowError> {
        let from = *status;
        if from.stage() != ReviewStage::Pending {
            return Err(WorkflowError::AlreadyFinalized {
                item_id: subject.item_id.clone(),
                status: from.label(),
            });
        }

        let to = S::from_stage(decision.target());
        *status = to;

        info!(
            item_id = %subject.item_id,
            from = from.label(),
            to = to.label(),
            actor = %actor.id,
            "review transition accepted"
        );

        let event = LedgerEvent {
            item_id: subject.item_id.clone(),
            kind: subject.kind,
            from_state: from.label().to_string(),
            to_state: to.label().to_string(),
            score: subject.score,
            actor: actor.id.clone(),
            reason: decision.reason(),
            timestamp: Utc::now(),
        };

        Ok(TransitionReceipt {
            from: from.label(),
            to: to.label(),
            audit: self.append(event),
        })
    }

    /// Append an event outside of a transition (fraud reports, audit retries).
    pub fn append(&self, event: LedgerEvent) -> AuditStatus {
        match self.ledger.record(&event) {
            Ok(()) => AuditStatus::Recorded,
            Err(err) => {
                warn!(item_id = %event.item_id, error = %err, "ledger write failed; decision kept");
                AuditStatus::Degraded {
                    reason: err.to_string(),
                    event,
                }
            }
        }
    }
}
