//! Classification of externally supplied anomaly scores. No randomness, no I/O.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::domain::{FraudDetected, RiskAssessment, RiskTier};
use crate::workflows::directory::EntityRecord;

/// Lowest tier at which a fraud report is accepted.
pub const FRAUD_REPORT_FLOOR: RiskTier = RiskTier::Low;

const MAX_SCORE: u8 = 100;

pub fn assess(entity: &EntityRecord, signal: u8, computed_at: DateTime<Utc>) -> RiskAssessment {
    let score = if signal > MAX_SCORE {
        warn!(entity = %entity.id, signal, "risk signal out of range; clamped");
        MAX_SCORE
    } else {
        signal
    };

    RiskAssessment {
        id: entity.id.clone(),
        entity_type: entity.kind,
        entity_name: entity.name.clone(),
        score,
        tier: RiskTier::from_score(score),
        computed_at,
    }
}

impl RiskAssessment {
    /// Fraud-detected event, raised only for high-tier assessments.
    pub fn fraud_alert(&self) -> Option<FraudDetected> {
        (self.tier == RiskTier::High).then(|| FraudDetected {
            entity_id: self.id.clone(),
            score: self.score,
        })
    }

    pub fn permits_fraud_report(&self) -> bool {
        self.tier >= FRAUD_REPORT_FLOOR
    }
}
