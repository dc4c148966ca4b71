use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::directory::{EntityId, EntityKind};

/// Risk bucket derived from a 0-100 anomaly score. Ordered from least to most risky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    None,
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// ≥75 high, 50–74 medium, 25–49 low, below 25 none.
    pub const fn from_score(score: u8) -> Self {
        match score {
            75..=u8::MAX => RiskTier::High,
            50..=74 => RiskTier::Medium,
            25..=49 => RiskTier::Low,
            _ => RiskTier::None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RiskTier::None => "none",
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }
}

/// Snapshot of an entity's risk, recomputed on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub id: EntityId,
    pub entity_type: EntityKind,
    pub entity_name: String,
    pub score: u8,
    pub tier: RiskTier,
    pub computed_at: DateTime<Utc>,
}

/// Human-filed fraud report. Never generated automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudReport {
    pub entity_id: EntityId,
    pub reason: String,
    pub reported_by: String,
    pub score: u8,
    pub tier: RiskTier,
    pub reported_at: DateTime<Utc>,
}

/// Outward event raised for high-risk assessments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FraudDetected {
    pub entity_id: EntityId,
    pub score: u8,
}
