use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{MatchFilter, MatchId, MatchRecord};
use super::repository::MatchRepository;
use super::scoring;
use crate::workflows::directory::{Directory, Donor, DonorId, DonorStatus, Recipient, RecipientId};
use crate::workflows::error::{RepositoryError, WorkflowError};
use crate::workflows::notify::{publish_quietly, Notice, Notifier};
use crate::workflows::review::{
    Actor, AuditStatus, LedgerEvent, LedgerItemKind, ReviewDecision, ReviewStage, ReviewState,
    ReviewSubject, TransitionReceipt, VerificationWorkflow,
};

/// Service composing the directory, compatibility scorer, match store, and review workflow.
pub struct MatchingService<R> {
    directory: Arc<dyn Directory>,
    repository: Arc<R>,
    workflow: Arc<VerificationWorkflow>,
    notifier: Arc<dyn Notifier>,
}

static MATCH_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_match_id() -> MatchId {
    let id = MATCH_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    MatchId(format!("match-{id:06}"))
}

/// Result of an accepted approve/reject call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReview {
    pub record: MatchRecord,
    pub receipt: TransitionReceipt,
    /// `true` only for the approval that moved the donor from available to matched.
    pub donor_newly_matched: bool,
}

impl<R> MatchingService<R>
where
    R: MatchRepository + 'static,
{
    pub fn new(
        directory: Arc<dyn Directory>,
        repository: Arc<R>,
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

    /// Pair donors and recipients by input position, score each pair, and persist pending
    /// matches. Surplus candidates on the longer side stay unpaired.
    pub fn generate_matches(
        &self,
        donor_ids: &[DonorId],
        recipient_ids: &[RecipientId],
    ) -> Result<Vec<MatchRecord>, WorkflowError> {
        if donor_ids.is_empty() || recipient_ids.is_empty() {
            return Err(WorkflowError::InsufficientCandidates);
        }

        let donors = donor_ids
            .iter()
            .map(|id| self.resolve_donor(id))
            .collect::<Result<Vec<_>, _>>()?;
        let recipients = recipient_ids
            .iter()
            .map(|id| self.resolve_recipient(id))
            .collect::<Result<Vec<_>, _>>()?;

        let created_at = Utc::now();
        let records = donors
            .iter()
            .zip(recipients.iter())
            .map(|(donor, recipient)| {
                let outcome = scoring::score(donor, recipient);
                MatchRecord::pending(next_match_id(), donor, recipient, outcome, created_at)
            })
            .collect();
        let created = self.repository.insert_all(records)?;

        info!(count = created.len(), "pending matches generated");
        Ok(created)
    }

    pub fn approve(&self, id: &MatchId, actor: &Actor) -> Result<MatchReview, WorkflowError> {
        if !actor.can_review() {
            return Err(WorkflowError::Unauthorized {
                actor: actor.id.clone(),
            });
        }

        let current = self.get(id)?;
        // the donor must still resolve before anything changes locally
        self.resolve_donor(&current.donor_id)?;

        let (record, receipt, donor_newly_matched) = self.review(id, |record| {
            // flip the donor first: a store failure must leave the match pending
            let donor_newly_matched = if record.status.stage() == ReviewStage::Pending {
                self.repository.mark_donor_matched(&record.donor_id)?
            } else {
                false
            };
            let receipt = self.workflow.transition(
                &Self::subject(record),
                &mut record.status,
                &ReviewDecision::Approve,
                actor,
            )?;
            Ok((record.clone(), receipt, donor_newly_matched))
        })?;

        self.announce("match_approved", &record, &receipt);
        Ok(MatchReview {
            record,
            receipt,
            donor_newly_matched,
        })
    }

    pub fn reject(
        &self,
        id: &MatchId,
        actor: &Actor,
        reason: Option<String>,
    ) -> Result<MatchReview, WorkflowError> {
        let reason = reason.filter(|text| !text.trim().is_empty());
        let decision = ReviewDecision::Reject { reason };
        let (record, receipt) = self.review(id, |record| {
            self.workflow
                .transition(&Self::subject(record), &mut record.status, &decision, actor)
                .map(|receipt| (record.clone(), receipt))
        })?;

        self.announce("match_rejected", &record, &receipt);
        Ok(MatchReview {
            record,
            receipt,
            donor_newly_matched: false,
        })
    }

    /// Case-insensitive text search over id and names plus an optional organ filter,
    /// preserving generation order.
    pub fn list_matches(&self, filter: &MatchFilter) -> Result<Vec<MatchRecord>, WorkflowError> {
        let records = self.repository.list()?;
        Ok(records
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect())
    }

    pub fn get(&self, id: &MatchId) -> Result<MatchRecord, WorkflowError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| WorkflowError::not_found("match", id.0.clone()))
    }

    /// Effective donor status: local matching state first, directory record otherwise.
    pub fn donor_status(&self, id: &DonorId) -> Result<DonorStatus, WorkflowError> {
        if let Some(status) = self.repository.donor_status(id)? {
            return Ok(status);
        }
        Ok(self.resolve_donor(id)?.status)
    }

    /// Resend a ledger entry that previously came back degraded.
    pub fn retry_audit(&self, event: LedgerEvent) -> AuditStatus {
        self.workflow.append(event)
    }

    /// Run `apply` under the match's row lock.
    fn review<T, F>(&self, id: &MatchId, apply: F) -> Result<T, WorkflowError>
    where
        F: FnOnce(&mut MatchRecord) -> Result<T, WorkflowError>,
    {
        self.repository
            .review(id, apply)
            .map_err(|err| match err {
                RepositoryError::NotFound(_) => WorkflowError::not_found("match", id.0.clone()),
                other => other.into(),
            })?
    }

    fn subject(record: &MatchRecord) -> ReviewSubject {
        ReviewSubject {
            item_id: record.id.0.clone(),
            kind: LedgerItemKind::Match,
            score: Some(record.compatibility_score),
        }
    }

    fn announce(&self, template: &str, record: &MatchRecord, receipt: &TransitionReceipt) {
        let notice = Notice::new(template, record.id.0.clone())
            .with("donor", &record.donor_name)
            .with("recipient", &record.recipient_name)
            .with("score", record.compatibility_score)
            .with("audit", receipt.audit.label());
        publish_quietly(self.notifier.as_ref(), notice);
    }

    fn resolve_donor(&self, id: &DonorId) -> Result<Donor, WorkflowError> {
        self.directory
            .donor(id)?
            .ok_or_else(|| WorkflowError::not_found("donor", id.0.clone()))
    }

    fn resolve_recipient(&self, id: &RecipientId) -> Result<Recipient, WorkflowError> {
        self.directory
            .recipient(id)?
            .ok_or_else(|| WorkflowError::not_found("recipient", id.0.clone()))
    }
}
