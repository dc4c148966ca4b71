use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{VerificationId, VerificationRequest, VerificationStatus};
use super::repository::VerificationRepository;
use crate::workflows::directory::{Directory, EntityId};
use crate::workflows::error::{RepositoryError, WorkflowError};
use crate::workflows::notify::{publish_quietly, Notice, Notifier};
use crate::workflows::review::{
    Actor, AuditStatus, LedgerEvent, LedgerItemKind, ReviewDecision, ReviewSubject,
    TransitionReceipt, VerificationWorkflow,
};

/// Service driving hospital/entity onboarding through the shared review workflow.
pub struct OnboardingService<V> {
    directory: Arc<dyn Directory>,
    repository: Arc<V>,
    workflow: Arc<VerificationWorkflow>,
    notifier: Arc<dyn Notifier>,
}

static VERIFICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_verification_id() -> VerificationId {
    let id = VERIFICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    VerificationId(format!("ver-{id:06}"))
}

impl<V> OnboardingService<V>
where
    V: VerificationRepository + 'static,
{
    pub fn new(
        directory: Arc<dyn Directory>,
        repository: Arc<V>,
        workflow: Arc<VerificationWorkflow>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            directory,
            repository,
            workflow,
            notifier,
        }
    }

    /// Open a pending request for `subject`. An existing pending request is returned as-is.
    pub fn apply(&self, subject: &EntityId) -> Result<VerificationRequest, WorkflowError> {
        let entity = self
            .directory
            .entity(subject)?
            .ok_or_else(|| WorkflowError::not_found("entity", subject.0.clone()))?;

        let request = VerificationRequest {
            id: next_verification_id(),
            subject_id: entity.id,
            subject_name: entity.name,
            subject_kind: entity.kind,
            status: VerificationStatus::Pending,
            applied_at: Utc::now(),
            rejection_reason: None,
        };
        let requested = request.id.clone();
        let stored = self.repository.insert_unless_pending(request)?;
        if stored.id == requested {
            info!(request_id = %stored.id, subject = %stored.subject_id, "verification requested");
        }
        Ok(stored)
    }

    pub fn approve(
        &self,
        id: &VerificationId,
        actor: &Actor,
    ) -> Result<(VerificationRequest, TransitionReceipt), WorkflowError> {
        if !actor.can_review() {
            return Err(WorkflowError::Unauthorized {
                actor: actor.id.clone(),
            });
        }

        let outcome = decide(
            self.repository.as_ref(),
            &self.workflow,
            id,
            &ReviewDecision::Approve,
            actor,
        )?;
        self.announce("verification_approved", &outcome.0, &outcome.1);
        Ok(outcome)
    }

    pub fn reject(
        &self,
        id: &VerificationId,
        actor: &Actor,
        reason: Option<String>,
    ) -> Result<(VerificationRequest, TransitionReceipt), WorkflowError> {
        let reason = reason.filter(|text| !text.trim().is_empty());
        let outcome = decide(
            self.repository.as_ref(),
            &self.workflow,
            id,
            &ReviewDecision::Reject { reason },
            actor,
        )?;
        self.announce("verification_rejected", &outcome.0, &outcome.1);
        Ok(outcome)
    }

    pub fn get(&self, id: &VerificationId) -> Result<VerificationRequest, WorkflowError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| WorkflowError::not_found("verification request", id.0.clone()))
    }

    pub fn pending(&self, limit: usize) -> Result<Vec<VerificationRequest>, WorkflowError> {
        Ok(self.repository.pending(limit)?)
    }

    /// Resend a ledger entry that previously came back degraded.
    pub fn retry_audit(&self, event: LedgerEvent) -> AuditStatus {
        self.workflow.append(event)
    }

    fn announce(
        &self,
        template: &str,
        request: &VerificationRequest,
        receipt: &TransitionReceipt,
    ) {
        let notice = Notice::new(template, request.subject_id.0.clone())
            .with("request", &request.id)
            .with("subject", &request.subject_name)
            .with("audit", receipt.audit.label());
        publish_quietly(self.notifier.as_ref(), notice);
    }
}

/// Transition a verification request under its store lock, recording any rejection reason
/// on the request itself.
pub(crate) fn decide<V>(
    repository: &V,
    workflow: &VerificationWorkflow,
    id: &VerificationId,
    decision: &ReviewDecision,
    actor: &Actor,
) -> Result<(VerificationRequest, TransitionReceipt), WorkflowError>
where
    V: VerificationRepository,
{
    repository
        .review(id, |request| -> Result<_, WorkflowError> {
            let subject = ReviewSubject {
                item_id: request.id.0.clone(),
                kind: LedgerItemKind::Verification,
                score: None,
            };
            let receipt = workflow.transition(&subject, &mut request.status, decision, actor)?;
            if let ReviewDecision::Reject { reason } = decision {
                request.rejection_reason = reason.clone();
            }
            Ok((request.clone(), receipt))
        })
        .map_err(|err| match err {
            RepositoryError::NotFound(_) => {
                WorkflowError::not_found("verification request", id.0.clone())
            }
            other => other.into(),
        })?
}
