use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use super::domain::FraudReport;
use super::repository::RiskRepository;
use super::service::RiskService;
use crate::workflows::directory::EntityId;
use crate::workflows::onboarding::VerificationRepository;
use crate::workflows::review::{Actor, ActorRole, AuditStatus};

/// Router builder exposing risk checks and fraud reporting.
pub fn risk_router<R, V>(service: Arc<RiskService<R, V>>) -> Router
where
    R: RiskRepository + 'static,
    V: VerificationRepository + 'static,
{
    Router::new()
        .route("/api/v1/risk/:entity_id", get(check_handler::<R, V>))
        .route(
            "/api/v1/risk/:entity_id/reports",
            post(report_handler::<R, V>).get(list_reports_handler::<R, V>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct FraudReportRequest {
    pub(crate) actor_id: String,
    pub(crate) role: ActorRole,
    #[serde(default)]
    pub(crate) reason: String,
}

#[derive(Debug, Serialize)]
struct FraudReportView {
    report: FraudReport,
    audit: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    audit_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejected_verification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unresolved_verification: Option<String>,
}

pub(crate) async fn check_handler<R, V>(
    State(service): State<Arc<RiskService<R, V>>>,
    Path(entity_id): Path<String>,
) -> Response
where
    R: RiskRepository + 'static,
    V: VerificationRepository + 'static,
{
    match service.check_risk(&EntityId(entity_id)) {
        Ok(assessment) => (StatusCode::OK, axum::Json(assessment)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn report_handler<R, V>(
    State(service): State<Arc<RiskService<R, V>>>,
    Path(entity_id): Path<String>,
    axum::Json(request): axum::Json<FraudReportRequest>,
) -> Response
where
    R: RiskRepository + 'static,
    V: VerificationRepository + 'static,
{
    let actor = Actor::new(request.actor_id, request.role);
    match service.report_fraud(&EntityId(entity_id), &request.reason, &actor) {
        Ok(receipt) => {
            let view = FraudReportView {
                audit: receipt.audit.label(),
                audit_error: match &receipt.audit {
                    AuditStatus::Recorded => None,
                    AuditStatus::Degraded { reason, .. } => {
                        Some(reason.clone())
                    }
                },
                rejected_verification: receipt.rejected_verification.map(|id| id.0),
                unresolved_verification: receipt.unresolved_verification.map(|id| id.0),
                report: receipt.report,
            };
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn list_reports_handler<R, V>(
    State(service): State<Arc<RiskService<R, V>>>,
    Path(entity_id): Path<String>,
) -> Response
where
    R: RiskRepository + 'static,
    V: VerificationRepository + 'static,
{
    match service.reports_for(&EntityId(entity_id)) {
        Ok(reports) => (StatusCode::OK, axum::Json(reports)).into_response(),
        Err(error) => error.into_response(),
    }
}
