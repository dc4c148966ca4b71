//! Deterministic donor/recipient compatibility scoring.
//!
//! The score averages a blood component and an organ component. Age difference is reported
//! in the reasons but deliberately carries no weight in the number.

use serde::{Deserialize, Serialize};

use super::domain::{CompatibilityTier, Recommendation, SuccessTier};
use crate::workflows::directory::{BloodGroup, Donor, Recipient};

const FULL_COMPONENT: u8 = 100;
const PARTIAL_BLOOD_COMPONENT: u8 = 60;
const FAVORABLE_AGE_GAP_YEARS: u8 = 10;

/// Explainable result of scoring a single donor/recipient pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityOutcome {
    pub score: u8,
    pub blood_component: u8,
    pub organ_component: u8,
    pub tier: CompatibilityTier,
    pub predicted_success: SuccessTier,
    pub recommendation: Recommendation,
    /// Blood finding, organ finding, age-gap finding, in that order.
    pub reasons: Vec<String>,
}

pub fn score(donor: &Donor, recipient: &Recipient) -> CompatibilityOutcome {
    let mut reasons = Vec::with_capacity(3);

    let donor_group = donor.blood_type.group;
    let recipient_group = recipient.blood_type.group;
    let blood_component = if donor_group == recipient_group {
        reasons.push(format!(
            "blood type compatible: donor {} and recipient {} share group {}",
            donor.blood_type,
            recipient.blood_type,
            donor_group.label()
        ));
        FULL_COMPONENT
    } else if donor_group == BloodGroup::O {
        reasons.push(format!(
            "blood type compatible: donor {} is a universal donor for recipient {}",
            donor.blood_type, recipient.blood_type
        ));
        FULL_COMPONENT
    } else {
        reasons.push(format!(
            "blood type partially compatible: donor {} differs from recipient {}",
            donor.blood_type, recipient.blood_type
        ));
        PARTIAL_BLOOD_COMPONENT
    };

    let organ_component = if donor.organ == recipient.organ {
        reasons.push(format!("organ type matches: {}", donor.organ));
        FULL_COMPONENT
    } else {
        reasons.push(format!(
            "organ type mismatch: donor offers {}, recipient needs {}",
            donor.organ, recipient.organ
        ));
        0
    };

    let age_gap = donor.age.abs_diff(recipient.age);
    if age_gap < FAVORABLE_AGE_GAP_YEARS {
        reasons.push(format!("age difference of {age_gap} years is favorable"));
    } else {
        reasons.push(format!("age difference of {age_gap} years is unfavorable"));
    }

    // mean of the two components, rounded half up
    let score = ((u16::from(blood_component) + u16::from(organ_component) + 1) / 2) as u8;

    CompatibilityOutcome {
        score,
        blood_component,
        organ_component,
        tier: CompatibilityTier::from_score(score),
        predicted_success: SuccessTier::from_score(score),
        recommendation: Recommendation::from_score(score),
        reasons,
    }
}
