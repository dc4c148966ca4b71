use super::domain::{FraudReport, RiskAssessment};
use crate::workflows::directory::EntityId;
use crate::workflows::error::{RepositoryError, WorkflowError};

/// Storage abstraction for assessments and fraud reports.
pub trait RiskRepository: Send + Sync {
    /// Replace the latest assessment for the entity.
    fn record_assessment(&self, assessment: RiskAssessment) -> Result<(), RepositoryError>;
    fn latest_assessment(
        &self,
        entity: &EntityId,
    ) -> Result<Option<RiskAssessment>, RepositoryError>;
    fn record_report(&self, report: FraudReport) -> Result<FraudReport, RepositoryError>;
    /// Reports for one entity, oldest first.
    fn reports_for(&self, entity: &EntityId) -> Result<Vec<FraudReport>, RepositoryError>;
}

/// Anomaly-detection collaborator supplying opaque 0-100 scores.
///
/// Implementations bound their own latency and report expiry as [`SignalError::Unavailable`].
pub trait RiskSignalSource: Send + Sync {
    fn score_for(&self, entity: &EntityId) -> Result<u8, SignalError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignalError {
    #[error("risk signal unavailable: {0}")]
    Unavailable(String),
}

impl From<SignalError> for WorkflowError {
    fn from(value: SignalError) -> Self {
        match value {
            SignalError::Unavailable(detail) => {
                Self::CollaboratorUnavailable(format!("risk signals: {detail}"))
            }
        }
    }
}
