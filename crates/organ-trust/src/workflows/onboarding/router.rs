use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use super::domain::{VerificationId, VerificationRequest};
use super::repository::VerificationRepository;
use super::service::OnboardingService;
use crate::workflows::directory::EntityId;
use crate::workflows::error::WorkflowError;
use crate::workflows::review::{ReviewRequest, ReviewView, TransitionReceipt};

/// Router builder exposing entity onboarding endpoints.
pub fn onboarding_router<V>(service: Arc<OnboardingService<V>>) -> Router
where
    V: VerificationRepository + 'static,
{
    Router::new()
        .route("/api/v1/verifications", post(apply_handler::<V>))
        .route("/api/v1/verifications/:request_id", get(get_handler::<V>))
        .route(
            "/api/v1/verifications/:request_id/approve",
            post(approve_handler::<V>),
        )
        .route(
            "/api/v1/verifications/:request_id/reject",
            post(reject_handler::<V>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplyRequest {
    pub(crate) subject_id: String,
}

#[derive(Debug, Serialize)]
struct VerificationReviewView {
    #[serde(flatten)]
    review: ReviewView,
    subject_id: EntityId,
}

pub(crate) async fn apply_handler<V>(
    State(service): State<Arc<OnboardingService<V>>>,
    axum::Json(request): axum::Json<ApplyRequest>,
) -> Response
where
    V: VerificationRepository + 'static,
{
    match service.apply(&EntityId(request.subject_id)) {
        Ok(stored) => (StatusCode::CREATED, axum::Json(stored)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn get_handler<V>(
    State(service): State<Arc<OnboardingService<V>>>,
    Path(request_id): Path<String>,
) -> Response
where
    V: VerificationRepository + 'static,
{
    match service.get(&VerificationId(request_id)) {
        Ok(stored) => (StatusCode::OK, axum::Json(stored)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn approve_handler<V>(
    State(service): State<Arc<OnboardingService<V>>>,
    Path(request_id): Path<String>,
    axum::Json(request): axum::Json<ReviewRequest>,
) -> Response
where
    V: VerificationRepository + 'static,
{
    review_response(service.approve(&VerificationId(request_id), &request.actor()))
}

pub(crate) async fn reject_handler<V>(
    State(service): State<Arc<OnboardingService<V>>>,
    Path(request_id): Path<String>,
    axum::Json(request): axum::Json<ReviewRequest>,
) -> Response
where
    V: VerificationRepository + 'static,
{
    let actor = request.actor();
    review_response(service.reject(&VerificationId(request_id), &actor, request.reason))
}

fn review_response(
    result: Result<(VerificationRequest, TransitionReceipt), WorkflowError>,
) -> Response {
    match result {
        Ok((stored, receipt)) => {
            let view = VerificationReviewView {
                review: receipt.view(stored.id.0.clone()),
                subject_id: stored.subject_id,
            };
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error.into_response(),
    }
}
