use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::directory::DirectoryError;
use super::risk::RiskTier;

/// Outcome taxonomy shared by the matching, risk, and onboarding services.
///
/// Every variant is recoverable and reported to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
    #[error("at least one donor and one recipient are required to generate matches")]
    InsufficientCandidates,
    #[error("a non-empty reason is required")]
    ReasonRequired,
    #[error("risk tier {} is below the fraud reporting floor", .tier.label())]
    NotEligible { tier: RiskTier },
    #[error("'{item_id}' is already finalized as {status}")]
    AlreadyFinalized {
        item_id: String,
        status: &'static str,
    },
    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),
    #[error("actor '{actor}' is not authorized to review")]
    Unauthorized { actor: String },
}

impl WorkflowError {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            WorkflowError::NotFound { .. } => "not_found",
            WorkflowError::InsufficientCandidates => "insufficient_candidates",
            WorkflowError::ReasonRequired => "reason_required",
            WorkflowError::NotEligible { .. } => "not_eligible",
            WorkflowError::AlreadyFinalized { .. } => "already_finalized",
            WorkflowError::CollaboratorUnavailable(_) => "collaborator_unavailable",
            WorkflowError::Unauthorized { .. } => "unauthorized",
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            WorkflowError::NotFound { .. } => StatusCode::NOT_FOUND,
            WorkflowError::InsufficientCandidates | WorkflowError::ReasonRequired => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            WorkflowError::NotEligible { .. } | WorkflowError::AlreadyFinalized { .. } => {
                StatusCode::CONFLICT
            }
            WorkflowError::CollaboratorUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            WorkflowError::Unauthorized { .. } => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));
        (self.status_code(), body).into_response()
    }
}

impl From<DirectoryError> for WorkflowError {
    fn from(value: DirectoryError) -> Self {
        match value {
            DirectoryError::Unavailable(detail) => {
                Self::CollaboratorUnavailable(format!("directory: {detail}"))
            }
        }
    }
}

/// Failure of a backing store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("duplicate key '{0}'")]
    Conflict(String),
    #[error("no record for key '{0}'")]
    NotFound(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl From<RepositoryError> for WorkflowError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound(key) => Self::not_found("record", key),
            // ids are minted by the services, so a duplicate is a store fault
            RepositoryError::Conflict(key) => {
                Self::CollaboratorUnavailable(format!("store rejected duplicate key '{key}'"))
            }
            RepositoryError::Unavailable(detail) => {
                Self::CollaboratorUnavailable(format!("store: {detail}"))
            }
        }
    }
}
