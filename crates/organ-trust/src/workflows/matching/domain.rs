use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scoring::CompatibilityOutcome;
use crate::workflows::directory::{Donor, DonorId, Organ, Recipient, RecipientId};
use crate::workflows::review::{ReviewStage, ReviewState};

/// Identifier wrapper for generated matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchId(pub String);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Review status of a match. `Matched` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Matched,
    Rejected,
}

impl ReviewState for MatchStatus {
    fn stage(self) -> ReviewStage {
        match self {
            MatchStatus::Pending => ReviewStage::Pending,
            MatchStatus::Matched => ReviewStage::Approved,
            MatchStatus::Rejected => ReviewStage::Rejected,
        }
    }

    fn from_stage(stage: ReviewStage) -> Self {
        match stage {
            ReviewStage::Pending => MatchStatus::Pending,
            ReviewStage::Approved => MatchStatus::Matched,
            ReviewStage::Rejected => MatchStatus::Rejected,
        }
    }

    fn label(self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Matched => "matched",
            MatchStatus::Rejected => "rejected",
        }
    }
}

/// Display badge bucket: ≥90 high, 80–89 medium, otherwise low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityTier {
    High,
    Medium,
    Low,
}

impl CompatibilityTier {
    pub const fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => CompatibilityTier::High,
            80..=89 => CompatibilityTier::Medium,
            _ => CompatibilityTier::Low,
        }
    }
}

/// Predicted transplant success bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessTier {
    High,
    Medium,
    Low,
}

impl SuccessTier {
    pub const fn from_score(score: u8) -> Self {
        if score > 80 {
            SuccessTier::High
        } else if score > 60 {
            SuccessTier::Medium
        } else {
            SuccessTier::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SuccessTier::High => "High (>90%)",
            SuccessTier::Medium => "Medium (70-80%)",
            SuccessTier::Low => "Low (<60%)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Proceed,
    ConsiderAlternatives,
}

impl Recommendation {
    pub const fn from_score(score: u8) -> Self {
        if score > 75 {
            Recommendation::Proceed
        } else {
            Recommendation::ConsiderAlternatives
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Recommendation::Proceed => "proceed",
            Recommendation::ConsiderAlternatives => "consider alternatives",
        }
    }
}

/// Persisted donor/recipient pairing and its review status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub donor_id: DonorId,
    pub donor_name: String,
    pub recipient_id: RecipientId,
    pub recipient_name: String,
    /// Organ offered by the donor; the organ filter applies to this field.
    pub organ: Organ,
    pub compatibility_score: u8,
    pub blood_component: u8,
    pub organ_component: u8,
    pub tier: CompatibilityTier,
    pub predicted_success: SuccessTier,
    pub recommendation: Recommendation,
    pub reasons: Vec<String>,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn pending(
        id: MatchId,
        donor: &Donor,
        recipient: &Recipient,
        outcome: CompatibilityOutcome,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            donor_id: donor.id.clone(),
            donor_name: donor.name.clone(),
            recipient_id: recipient.id.clone(),
            recipient_name: recipient.name.clone(),
            organ: donor.organ,
            compatibility_score: outcome.score,
            blood_component: outcome.blood_component,
            organ_component: outcome.organ_component,
            tier: outcome.tier,
            predicted_success: outcome.predicted_success,
            recommendation: outcome.recommendation,
            reasons: outcome.reasons,
            status: MatchStatus::Pending,
            created_at,
        }
    }
}

/// Read-side filter for match listings. An empty filter selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MatchFilter {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub organ: Option<Organ>,
}

impl MatchFilter {
    pub fn matches(&self, record: &MatchRecord) -> bool {
        if let Some(organ) = self.organ {
            if record.organ != organ {
                return false;
            }
        }

        let needle = match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_lowercase(),
            _ => return true,
        };

        [
            record.id.0.as_str(),
            record.donor_name.as_str(),
            record.recipient_name.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}
