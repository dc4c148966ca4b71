use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::directory::{EntityId, EntityKind};
use crate::workflows::review::{ReviewStage, ReviewState};

/// Identifier wrapper for onboarding requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerificationId(pub String);

impl fmt::Display for VerificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewState for VerificationStatus {
    fn stage(self) -> ReviewStage {
        match self {
            VerificationStatus::Pending => ReviewStage::Pending,
            VerificationStatus::Approved => ReviewStage::Approved,
            VerificationStatus::Rejected => ReviewStage::Rejected,
        }
    }

    fn from_stage(stage: ReviewStage) -> Self {
        match stage {
            ReviewStage::Pending => VerificationStatus::Pending,
            ReviewStage::Approved => VerificationStatus::Approved,
            ReviewStage::Rejected => VerificationStatus::Rejected,
        }
    }

    fn label(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

/// Onboarding request for a hospital or other registered entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub id: VerificationId,
    pub subject_id: EntityId,
    pub subject_name: String,
    pub subject_kind: EntityKind,
    pub status: VerificationStatus,
    pub applied_at: DateTime<Utc>,
    /// Reason supplied when the request was rejected, e.g. by a fraud report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl VerificationRequest {
    pub fn is_pending(&self) -> bool {
        self.status == VerificationStatus::Pending
    }
}
