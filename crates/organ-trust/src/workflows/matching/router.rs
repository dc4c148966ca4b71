use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use super::domain::{MatchFilter, MatchId, MatchRecord};
use super::repository::MatchRepository;
use super::service::{MatchReview, MatchingService};
use crate::workflows::directory::{DonorId, Organ, RecipientId};
use crate::workflows::error::WorkflowError;
use crate::workflows::review::{ReviewRequest, ReviewView};

/// Router builder exposing match generation, listing, and review endpoints.
pub fn matching_router<R>(service: Arc<MatchingService<R>>) -> Router
where
    R: MatchRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/matches",
            post(generate_handler::<R>).get(list_handler::<R>),
        )
        .route("/api/v1/matches/:match_id", get(get_handler::<R>))
        .route(
            "/api/v1/matches/:match_id/approve",
            post(approve_handler::<R>),
        )
        .route("/api/v1/matches/:match_id/reject", post(reject_handler::<R>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateMatchesRequest {
    pub(crate) donor_ids: Vec<String>,
    pub(crate) recipient_ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MatchQuery {
    #[serde(default)]
    pub(crate) text: Option<String>,
    #[serde(default)]
    pub(crate) organ: Option<String>,
}

#[derive(Debug, Serialize)]
struct MatchReviewView {
    #[serde(flatten)]
    review: ReviewView,
    donor_newly_matched: bool,
    compatibility_score: u8,
}

impl From<MatchReview> for MatchReviewView {
    fn from(value: MatchReview) -> Self {
        Self {
            review: value.receipt.view(value.record.id.0.clone()),
            donor_newly_matched: value.donor_newly_matched,
            compatibility_score: value.record.compatibility_score,
        }
    }
}

pub(crate) async fn generate_handler<R>(
    State(service): State<Arc<MatchingService<R>>>,
    axum::Json(request): axum::Json<GenerateMatchesRequest>,
) -> Response
where
    R: MatchRepository + 'static,
{
    let donors: Vec<DonorId> = request.donor_ids.into_iter().map(DonorId).collect();
    let recipients: Vec<RecipientId> = request
        .recipient_ids
        .into_iter()
        .map(RecipientId)
        .collect();

    match service.generate_matches(&donors, &recipients) {
        Ok(records) => (StatusCode::CREATED, axum::Json(records)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<MatchingService<R>>>,
    Query(query): Query<MatchQuery>,
) -> Response
where
    R: MatchRepository + 'static,
{
    let organ = match query.organ.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match raw.parse::<Organ>() {
            Ok(organ) => Some(organ),
            Err(error) => {
                let payload = serde_json::json!({ "error": error.to_string() });
                return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
            }
        },
        _ => None,
    };
    let filter = MatchFilter {
        text: query.text,
        organ,
    };

    match service.list_matches(&filter) {
        Ok(records) => (StatusCode::OK, axum::Json::<Vec<MatchRecord>>(records)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn get_handler<R>(
    State(service): State<Arc<MatchingService<R>>>,
    Path(match_id): Path<String>,
) -> Response
where
    R: MatchRepository + 'static,
{
    match service.get(&MatchId(match_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn approve_handler<R>(
    State(service): State<Arc<MatchingService<R>>>,
    Path(match_id): Path<String>,
    axum::Json(request): axum::Json<ReviewRequest>,
) -> Response
where
    R: MatchRepository + 'static,
{
    review_response(service.approve(&MatchId(match_id), &request.actor()))
}

pub(crate) async fn reject_handler<R>(
    State(service): State<Arc<MatchingService<R>>>,
    Path(match_id): Path<String>,
    axum::Json(request): axum::Json<ReviewRequest>,
) -> Response
where
    R: MatchRepository + 'static,
{
    let actor = request.actor();
    review_response(service.reject(&MatchId(match_id), &actor, request.reason))
}

fn review_response(result: Result<MatchReview, WorkflowError>) -> Response {
    match result {
        Ok(review) => (StatusCode::OK, axum::Json(MatchReviewView::from(review))).into_response(),
        Err(error) => error.into_response(),
    }
}
