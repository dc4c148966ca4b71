use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::workflows::directory::{EntityId, EntityKind};
use crate::workflows::error::WorkflowError;
use crate::workflows::memory::{
    InMemoryDirectory, InMemoryStore, RecordingLedger, RecordingNotifier, StaticRiskSignals,
};
use crate::workflows::onboarding::VerificationStatus;
use crate::workflows::review::{AuditStatus, LedgerItemKind, VerificationWorkflow};
use crate::workflows::risk::{RiskService, RiskTier};
use crate::workflows::test_support::*;

fn entity(id: &str) -> EntityId {
    EntityId(id.to_string())
}

#[test]
fn low_signal_classifies_as_none_and_blocks_reports() {
    let harness = Harness::new();

    let assessment = harness.risk.check_risk(&entity("H-001")).expect("assessed");
    assert_eq!(assessment.score, 10);
    assert_eq!(assessment.tier, RiskTier::None);
    assert_eq!(assessment.entity_type, EntityKind::Hospital);

    let error = harness
        .risk
        .report_fraud(&entity("H-001"), "suspected forgery", &admin())
        .expect_err("not eligible");
    assert_eq!(
        error,
        WorkflowError::NotEligible {
            tier: RiskTier::None
        }
    );
    assert!(harness.risk.reports_for(&entity("H-001")).expect("reports").is_empty());
}

#[test]
fn unknown_entity_is_not_found() {
    let harness = Harness::new();
    let error = harness
        .risk
        .check_risk(&entity("X-999"))
        .expect_err("unknown");
    assert_eq!(
        error,
        WorkflowError::NotFound {
            kind: "entity",
            id: "X-999".to_string(),
        }
    );
}

#[test]
fn unscored_entities_assess_at_zero() {
    let harness = Harness::new();
    let assessment = harness.risk.check_risk(&entity("D-002")).expect("assessed");
    assert_eq!(assessment.score, 0);
    assert_eq!(assessment.tier, RiskTier::None);
    assert_eq!(assessment.entity_type, EntityKind::Donor);
}

#[test]
fn empty_reason_is_rejected_at_every_tier() {
    let harness = Harness::new();
    for id in ["H-001", "H-002", "H-003", "X-999"] {
        for reason in ["", "   "] {
            let error = harness
                .risk
                .report_fraud(&entity(id), reason, &admin())
                .expect_err("reason required");
            assert_eq!(error, WorkflowError::ReasonRequired, "entity {id}");
        }
    }
    assert!(harness.ledger.events().is_empty());
}

#[test]
fn report_floor_boundary_sits_between_24_and_25() {
    let harness = Harness::new();

    let below = harness
        .risk
        .report_fraud(&entity("H-004"), "mismatched licence numbers", &admin())
        .expect_err("24 is below the floor");
    assert_eq!(
        below,
        WorkflowError::NotEligible {
            tier: RiskTier::None
        }
    );

    let receipt = harness
        .risk
        .report_fraud(&entity("H-005"), "mismatched licence numbers", &admin())
        .expect("25 is at the floor");
    assert_eq!(receipt.report.tier, RiskTier::Low);
    assert_eq!(receipt.report.score, 25);
}

#[test]
fn accepted_report_is_stored_audited_and_announced() {
    let harness = Harness::new();

    let receipt = harness
        .risk
        .report_fraud(&entity("H-002"), "  duplicate donor registrations ", &admin())
        .expect("medium tier accepts reports");

    assert_eq!(receipt.report.reason, "duplicate donor registrations");
    assert_eq!(receipt.report.tier, RiskTier::Medium);
    assert_eq!(receipt.audit, AuditStatus::Recorded);
    assert_eq!(receipt.rejected_verification, None);

    let reports = harness.risk.reports_for(&entity("H-002")).expect("reports");
    assert_eq!(reports, vec![receipt.report.clone()]);

    let events = harness.ledger.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, LedgerItemKind::FraudReport);
    assert_eq!(events[0].from_state, "medium");
    assert_eq!(events[0].to_state, "reported");
    assert_eq!(events[0].score, Some(62));

    let templates: Vec<_> = harness
        .notifier
        .notices()
        .into_iter()
        .map(|notice| notice.template)
        .collect();
    assert_eq!(templates, vec!["fraud_reported".to_string()]);
}

#[test]
fn high_risk_assessment_publishes_fraud_detected_notice() {
    let harness = Harness::new();

    let assessment = harness.risk.check_risk(&entity("H-003")).expect("assessed");

    assert_eq!(assessment.tier, RiskTier::High);
    let notices = harness.notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].template, "fraud_detected");
    assert_eq!(notices[0].subject_id, "H-003");
    assert_eq!(notices[0].details.get("score").map(String::as_str), Some("85"));

    harness.risk.check_risk(&entity("H-002")).expect("assessed");
    assert_eq!(harness.notifier.notices().len(), 1, "medium tier stays quiet");
}

#[test]
fn assessments_are_recomputed_and_stored_as_latest() {
    let harness = Harness::new();
    assert!(harness
        .risk
        .latest_assessment(&entity("H-002"))
        .expect("lookup")
        .is_none());

    let first = harness.risk.check_risk(&entity("H-002")).expect("assessed");
    let second = harness.risk.check_risk(&entity("H-002")).expect("assessed");
    assert!(second.computed_at >= first.computed_at);

    let latest = harness
        .risk
        .latest_assessment(&entity("H-002"))
        .expect("lookup")
        .expect("stored");
    assert_eq!(latest, second);
}

#[test]
fn fraud_report_rejects_pending_onboarding_request() {
    let harness = Harness::new();
    let request = harness.onboarding.apply(&entity("H-003")).expect("applied");

    let receipt = harness
        .risk
        .report_fraud(&entity("H-003"), "forged accreditation", &admin())
        .expect("reported");

    assert_eq!(receipt.rejected_verification, Some(request.id.clone()));
    let stored = harness.onboarding.get(&request.id).expect("stored");
    assert_eq!(stored.status, VerificationStatus::Rejected);
    assert_eq!(stored.rejection_reason.as_deref(), Some("forged accreditation"));

    let kinds: Vec<_> = harness.ledger.events().iter().map(|event| event.kind).collect();
    assert_eq!(
        kinds,
        vec![LedgerItemKind::FraudReport, LedgerItemKind::Verification]
    );
}

#[test]
fn fraud_report_leaves_finalized_onboarding_untouched() {
    let harness = Harness::new();
    let request = harness.onboarding.apply(&entity("H-002")).expect("applied");
    harness
        .onboarding
        .approve(&request.id, &admin())
        .expect("approved");

    let receipt = harness
        .risk
        .report_fraud(&entity("H-002"), "billing anomalies", &admin())
        .expect("reported");

    assert_eq!(receipt.rejected_verification, None);
    assert_eq!(
        harness.onboarding.get(&request.id).expect("stored").status,
        VerificationStatus::Approved
    );
}

#[test]
fn verification_store_outage_rejects_report_before_anything_is_written() {
    let verifications = Arc::new(FlakyStore::default());
    let ledger = Arc::new(RecordingLedger::default());
    let service = RiskService::new(
        Arc::new(InMemoryDirectory::from_seed(&seed())),
        Arc::new(StaticRiskSignals::from_seed(&seed())),
        Arc::new(InMemoryStore::new()),
        verifications.clone(),
        Arc::new(VerificationWorkflow::new(ledger.clone())),
        Arc::new(RecordingNotifier::default()),
    );

    verifications.fail_pending_lookup.store(true, Ordering::SeqCst);
    let error = service
        .report_fraud(&entity("H-002"), "forged licence", &admin())
        .expect_err("verification store offline");

    assert!(matches!(error, WorkflowError::CollaboratorUnavailable(_)));
    assert!(service.reports_for(&entity("H-002")).expect("reports").is_empty());
    assert!(ledger.events().is_empty());

    verifications.fail_pending_lookup.store(false, Ordering::SeqCst);
    let receipt = service
        .report_fraud(&entity("H-002"), "forged licence", &admin())
        .expect("retry succeeds");

    assert_eq!(receipt.unresolved_verification, None);
    assert_eq!(service.reports_for(&entity("H-002")).expect("reports").len(), 1);
    assert_eq!(ledger.events().len(), 1);
}

#[test]
fn signal_outage_surfaces_as_collaborator_unavailable() {
    let store = Arc::new(InMemoryStore::new());
    let service = RiskService::new(
        Arc::new(InMemoryDirectory::from_seed(&seed())),
        Arc::new(UnavailableSignals),
        store.clone(),
        store.clone(),
        Arc::new(VerificationWorkflow::new(Arc::new(FailingLedger))),
        Arc::new(RecordingNotifier::default()),
    );

    let error = service
        .report_fraud(&entity("H-003"), "forged accreditation", &admin())
        .expect_err("signals offline");

    assert!(matches!(error, WorkflowError::CollaboratorUnavailable(_)));
    assert!(service.reports_for(&entity("H-003")).expect("reports").is_empty());
}

#[test]
fn ledger_outage_keeps_report_with_degraded_audit() {
    let harness = Harness::with_ledger(Arc::new(FailingLedger));

    let receipt = harness
        .risk
        .report_fraud(&entity("H-003"), "forged accreditation", &admin())
        .expect("report kept");

    assert!(receipt.audit.is_degraded());
    assert_eq!(
        harness.risk.reports_for(&entity("H-003")).expect("reports").len(),
        1
    );
}
