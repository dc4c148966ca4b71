use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::Value;

use crate::workflows::directory::{DonorId, RecipientId};
use crate::workflows::matching::MatchRecord;
pub(super) use crate::workflows::test_support::*;

pub(super) fn donor_ids(ids: &[&str]) -> Vec<DonorId> {
    ids.iter().map(|id| DonorId(id.to_string())).collect()
}

pub(super) fn recipient_ids(ids: &[&str]) -> Vec<RecipientId> {
    ids.iter().map(|id| RecipientId(id.to_string())).collect()
}

/// Generate a single pending match between one donor and one recipient.
pub(super) fn pending_match(harness: &Harness, donor: &str, recipient: &str) -> MatchRecord {
    harness
        .matching
        .generate_matches(&donor_ids(&[donor]), &recipient_ids(&[recipient]))
        .expect("match generated")
        .remove(0)
}

pub(super) fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
