use std::sync::{Arc, Barrier};
use std::thread;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::{onboarding_router, VerificationId, VerificationStatus};
use crate::workflows::directory::EntityId;
use crate::workflows::error::WorkflowError;
use crate::workflows::review::{AuditStatus, LedgerItemKind};
use crate::workflows::test_support::*;

fn entity(id: &str) -> EntityId {
    EntityId(id.to_string())
}

#[test]
fn apply_opens_pending_request_for_known_entity() {
    let harness = Harness::new();

    let request = harness.onboarding.apply(&entity("H-001")).expect("applied");

    assert_eq!(request.status, VerificationStatus::Pending);
    assert_eq!(request.subject_name, "St. Mary Transplant Center");
    assert!(request.id.0.starts_with("ver-"));
    assert_eq!(harness.onboarding.get(&request.id).expect("stored"), request);
}

#[test]
fn repeated_apply_returns_existing_pending_request() {
    let harness = Harness::new();

    let first = harness.onboarding.apply(&entity("H-002")).expect("first");
    let second = harness.onboarding.apply(&entity("H-002")).expect("second");

    assert_eq!(first.id, second.id);
    assert_eq!(harness.onboarding.pending(10).expect("pending").len(), 1);
}

#[test]
fn concurrent_applications_share_one_pending_request() {
    let harness = Harness::new();
    let contenders = 8;
    let barrier = Barrier::new(contenders);

    let requests: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..contenders)
            .map(|_| {
                let service = harness.onboarding.clone();
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    service.apply(&entity("H-003"))
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread completes"))
            .collect()
    });

    let first = requests[0].as_ref().expect("applied").id.clone();
    assert!(requests
        .iter()
        .all(|request| request.as_ref().map(|r| &r.id) == Ok(&first)));
    assert_eq!(harness.onboarding.pending(10).expect("pending").len(), 1);
}

#[test]
fn apply_for_unknown_entity_is_not_found() {
    let harness = Harness::new();
    let error = harness
        .onboarding
        .apply(&entity("X-999"))
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
fn approval_is_final_and_audited() {
    let harness = Harness::new();
    let request = harness.onboarding.apply(&entity("H-001")).expect("applied");

    let (approved, receipt) = harness
        .onboarding
        .approve(&request.id, &admin())
        .expect("approved");
    assert_eq!(approved.status, VerificationStatus::Approved);
    assert_eq!(receipt.audit, AuditStatus::Recorded);

    let error = harness
        .onboarding
        .reject(&request.id, &admin(), Some("duplicate".to_string()))
        .expect_err("already final");
    assert!(matches!(error, WorkflowError::AlreadyFinalized { .. }));

    let events = harness.ledger.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, LedgerItemKind::Verification);
    assert_eq!(events[0].to_state, "approved");
    assert!(harness.onboarding.pending(10).expect("pending").is_empty());
}

#[test]
fn approval_requires_reviewer_role() {
    let harness = Harness::new();
    let request = harness.onboarding.apply(&entity("H-001")).expect("applied");

    let error = harness
        .onboarding
        .approve(&request.id, &coordinator())
        .expect_err("coordinator cannot approve");

    assert_eq!(error.code(), "unauthorized");
    assert!(harness.onboarding.get(&request.id).expect("stored").is_pending());
}

#[test]
fn rejection_keeps_reason_on_request() {
    let harness = Harness::new();
    let request = harness.onboarding.apply(&entity("H-004")).expect("applied");

    let (rejected, _) = harness
        .onboarding
        .reject(&request.id, &coordinator(), Some("licence expired".to_string()))
        .expect("rejected");

    assert_eq!(rejected.status, VerificationStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("licence expired"));
    let notices = harness.notifier.notices();
    assert_eq!(notices.last().expect("notice").template, "verification_rejected");
}

#[test]
fn unknown_request_is_not_found() {
    let harness = Harness::new();
    let error = harness
        .onboarding
        .approve(&VerificationId("ver-missing".to_string()), &admin())
        .expect_err("missing");
    assert_eq!(error.code(), "not_found");
}

#[test]
fn directory_outage_blocks_apply() {
    let harness = Harness::with_directory(Arc::new(UnavailableDirectory));
    let error = harness
        .onboarding
        .apply(&entity("H-001"))
        .expect_err("offline");
    assert!(matches!(error, WorkflowError::CollaboratorUnavailable(_)));
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn verification_routes_drive_full_lifecycle() {
    let harness = Harness::new();
    let router = onboarding_router(harness.onboarding.clone());

    let created = router
        .clone()
        .oneshot(post("/api/v1/verifications", json!({ "subject_id": "H-002" })))
        .await
        .expect("route executes");
    assert_eq!(created.status(), StatusCode::CREATED);
    let payload = read_json(created).await;
    let id = payload["id"].as_str().expect("id").to_string();
    assert_eq!(payload["status"], "pending");
    assert_eq!(payload["subject_kind"], "hospital");

    let approved = router
        .clone()
        .oneshot(post(
            &format!("/api/v1/verifications/{id}/approve"),
            json!({ "actor_id": "admin-1", "role": "admin" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(approved.status(), StatusCode::OK);
    let payload = read_json(approved).await;
    assert_eq!(payload["status"], "approved");
    assert_eq!(payload["subject_id"], "H-002");

    let fetched = router
        .oneshot(
            Request::get(format!("/api/v1/verifications/{id}"))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(read_json(fetched).await["status"], "approved");
}

#[tokio::test]
async fn apply_route_reports_unknown_subjects() {
    let harness = Harness::new();
    let response = onboarding_router(harness.onboarding.clone())
        .oneshot(post("/api/v1/verifications", json!({ "subject_id": "X-999" })))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
