use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::domain::{FraudReport, RiskAssessment};
use super::repository::{RiskRepository, RiskSignalSource};
use super::scoring;
use crate::workflows::directory::{Directory, EntityId};
use crate::workflows::error::WorkflowError;
use crate::workflows::notify::{publish_quietly, Notice, Notifier};
use crate::workflows::onboarding::service::decide;
use crate::workflows::onboarding::{VerificationId, VerificationRepository};
use crate::workflows::review::{
    Actor, AuditStatus, LedgerEvent, LedgerItemKind, ReviewDecision, VerificationWorkflow,
};

/// Service classifying entity risk and accepting human fraud reports.
pub struct RiskService<R, V> {
    directory: Arc<dyn Directory>,
    signals: Arc<dyn RiskSignalSource>,
    repository: Arc<R>,
    verifications: Arc<V>,
    workflow: Arc<VerificationWorkflow>,
    notifier: Arc<dyn Notifier>,
}

/// Result of an accepted fraud report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FraudReceipt {
    pub report: FraudReport,
    pub audit: AuditStatus,
    /// Pending onboarding request closed by this report, if there was one.
    pub rejected_verification: Option<VerificationId>,
    /// Pending request the report could not close; it stays open for a reviewer.
    pub unresolved_verification: Option<VerificationId>,
}

impl<R, V> RiskService<R, V>
where
    R: RiskRepository + 'static,
    V: VerificationRepository + 'static,
{
    pub fn new(
        directory: Arc<dyn Directory>,
        signals: Arc<dyn RiskSignalSource>,
        repository: Arc<R>,
        verifications: Arc<V>,
        workflow: Arc<VerificationWorkflow>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            directory,
            signals,
            repository,
            verifications,
            workflow,
            notifier,
        }
    }

    /// Fresh assessment for `entity`; stored as its latest. A zero score is a valid result.
    pub fn check_risk(&self, entity: &EntityId) -> Result<RiskAssessment, WorkflowError> {
        let record = self
            .directory
            .entity(entity)?
            .ok_or_else(|| WorkflowError::not_found("entity", entity.0.clone()))?;
        let signal = self.signals.score_for(entity)?;

        let assessment = scoring::assess(&record, signal, Utc::now());
        debug!(
            entity = %assessment.id,
            score = assessment.score,
            tier = assessment.tier.label(),
            "risk assessed"
        );
        self.repository.record_assessment(assessment.clone())?;

        if let Some(alert) = assessment.fraud_alert() {
            warn!(entity = %alert.entity_id, score = alert.score, "fraud detected");
            let notice = Notice::new("fraud_detected", alert.entity_id.0.clone())
                .with("name", &assessment.entity_name)
                .with("score", alert.score);
            publish_quietly(self.notifier.as_ref(), notice);
        }

        Ok(assessment)
    }

    /// File a fraud report. The reason is validated before anything else, then eligibility
    /// is judged on a freshly computed assessment.
    pub fn report_fraud(
        &self,
        entity: &EntityId,
        reason: &str,
        actor: &Actor,
    ) -> Result<FraudReceipt, WorkflowError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(WorkflowError::ReasonRequired);
        }

        let assessment = self.check_risk(entity)?;
        if !assessment.permits_fraud_report() {
            return Err(WorkflowError::NotEligible {
                tier: assessment.tier,
            });
        }

        // resolve the open request before the report is stored
        let pending = self.verifications.pending_for_subject(&assessment.id)?;

        let report = self.repository.record_report(FraudReport {
            entity_id: assessment.id.clone(),
            reason: reason.to_string(),
            reported_by: actor.id.clone(),
            score: assessment.score,
            tier: assessment.tier,
            reported_at: Utc::now(),
        })?;
        info!(
            entity = %report.entity_id,
            tier = report.tier.label(),
            actor = %actor.id,
            "fraud report filed"
        );

        let audit = self.workflow.append(LedgerEvent {
            item_id: report.entity_id.0.clone(),
            kind: LedgerItemKind::FraudReport,
            from_state: report.tier.label().to_string(),
            to_state: "reported".to_string(),
            score: Some(report.score),
            actor: actor.id.clone(),
            reason: Some(report.reason.clone()),
            timestamp: report.reported_at,
        });

        let (rejected_verification, unresolved_verification) = match pending {
            Some(pending) => match self.close_verification(&pending.id, &report, actor) {
                Ok(rejected) => (rejected, None),
                Err(error) => {
                    warn!(
                        request_id = %pending.id,
                        %error,
                        "pending verification left open after fraud report"
                    );
                    (None, Some(pending.id))
                }
            },
            None => (None, None),
        };

        let notice = Notice::new("fraud_reported", report.entity_id.0.clone())
            .with("tier", report.tier.label())
            .with("reason", &report.reason);
        publish_quietly(self.notifier.as_ref(), notice);

        Ok(FraudReceipt {
            report,
            audit,
            rejected_verification,
            unresolved_verification,
        })
    }

    pub fn reports_for(&self, entity: &EntityId) -> Result<Vec<FraudReport>, WorkflowError> {
        Ok(self.repository.reports_for(entity)?)
    }

    pub fn latest_assessment(
        &self,
        entity: &EntityId,
    ) -> Result<Option<RiskAssessment>, WorkflowError> {
        Ok(self.repository.latest_assessment(entity)?)
    }

    fn close_verification(
        &self,
        id: &VerificationId,
        report: &FraudReport,
        actor: &Actor,
    ) -> Result<Option<VerificationId>, WorkflowError> {
        let decision = ReviewDecision::Reject {
            reason: Some(report.reason.clone()),
        };
        match decide(
            self.verifications.as_ref(),
            &self.workflow,
            id,
            &decision,
            actor,
        ) {
            Ok((request, _)) => Ok(Some(request.id)),
            // a concurrent reviewer got there first
            Err(WorkflowError::AlreadyFinalized { item_id, status }) => {
                info!(%item_id, status, "verification already finalized; fraud report kept");
                Ok(None)
            }
            Err(other) => Err(other),
        }
    }
}
