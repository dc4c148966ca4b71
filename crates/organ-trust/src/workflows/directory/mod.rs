//! Read-only registry of donors, recipients, and hospitals.
//!
//! Records are owned by an external identity provider; this module only describes the shapes
//! the matching and risk workflows consume and the lookup contract they rely on.

mod import;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use import::{DirectoryImportError, DirectoryImporter, DirectorySeed};

/// Identifier wrapper for registered donors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DonorId(pub String);

/// Identifier wrapper for registered recipients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecipientId(pub String);

/// Identifier for any entity subject to trust scoring (donor, hospital, or recipient).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl fmt::Display for DonorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ABO blood group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
    A,
    B,
    AB,
    O,
}

impl BloodGroup {
    pub const fn label(self) -> &'static str {
        match self {
            BloodGroup::A => "A",
            BloodGroup::B => "B",
            BloodGroup::AB => "AB",
            BloodGroup::O => "O",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhFactor {
    Positive,
    Negative,
}

/// Blood type rendered and parsed as `"O+"`, `"AB-"`, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BloodType {
    pub group: BloodGroup,
    pub rh: RhFactor,
}

impl BloodType {
    pub const fn new(group: BloodGroup, rh: RhFactor) -> Self {
        Self { group, rh }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.rh {
            RhFactor::Positive => '+',
            RhFactor::Negative => '-',
        };
        write!(f, "{}{}", self.group.label(), sign)
    }
}

impl FromStr for BloodType {
    type Err = RecordParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim().to_ascii_uppercase();
        let invalid = || RecordParseError::BloodType(raw.to_string());

        let (group, rh) = if let Some(group) = trimmed.strip_suffix('+') {
            (group, RhFactor::Positive)
        } else if let Some(group) = trimmed.strip_suffix('-') {
            (group, RhFactor::Negative)
        } else {
            return Err(invalid());
        };
        let group = match group {
            "A" => BloodGroup::A,
            "B" => BloodGroup::B,
            "AB" => BloodGroup::AB,
            "O" => BloodGroup::O,
            _ => return Err(invalid()),
        };

        Ok(Self { group, rh })
    }
}

impl TryFrom<String> for BloodType {
    type Error = RecordParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BloodType> for String {
    fn from(value: BloodType) -> Self {
        value.to_string()
    }
}

/// Organs supported by the matching workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Organ {
    Kidney,
    Liver,
    Heart,
    Lung,
    Pancreas,
    Cornea,
}

impl Organ {
    pub const fn label(self) -> &'static str {
        match self {
            Organ::Kidney => "Kidney",
            Organ::Liver => "Liver",
            Organ::Heart => "Heart",
            Organ::Lung => "Lung",
            Organ::Pancreas => "Pancreas",
            Organ::Cornea => "Cornea",
        }
    }
}

impl fmt::Display for Organ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Organ {
    type Err = RecordParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "kidney" => Ok(Organ::Kidney),
            "liver" => Ok(Organ::Liver),
            "heart" => Ok(Organ::Heart),
            "lung" => Ok(Organ::Lung),
            "pancreas" => Ok(Organ::Pancreas),
            "cornea" => Ok(Organ::Cornea),
            _ => Err(RecordParseError::Organ(raw.to_string())),
        }
    }
}

/// Clinical urgency of a waiting recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl FromStr for Urgency {
    type Err = RecordParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            "critical" => Ok(Urgency::Critical),
            _ => Err(RecordParseError::Urgency(raw.to_string())),
        }
    }
}

/// Donor availability. Only the matching workflow moves a donor to `Matched`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DonorStatus {
    Available,
    Matched,
}

impl DonorStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DonorStatus::Available => "available",
            DonorStatus::Matched => "matched",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donor {
    pub id: DonorId,
    pub name: String,
    pub age: u8,
    pub blood_type: BloodType,
    pub organ: Organ,
    pub status: DonorStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: RecipientId,
    pub name: String,
    pub age: u8,
    pub blood_type: BloodType,
    pub organ: Organ,
    pub urgency: Urgency,
    pub waiting_since: NaiveDate,
}

/// Category of a trust-scored entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Donor,
    Hospital,
    Recipient,
}

impl EntityKind {
    pub const fn label(self) -> &'static str {
        match self {
            EntityKind::Donor => "donor",
            EntityKind::Hospital => "hospital",
            EntityKind::Recipient => "recipient",
        }
    }
}

/// Kind-agnostic view of a registered entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
}

impl From<&Donor> for EntityRecord {
    fn from(donor: &Donor) -> Self {
        Self {
            id: EntityId(donor.id.0.clone()),
            name: donor.name.clone(),
            kind: EntityKind::Donor,
        }
    }
}

impl From<&Recipient> for EntityRecord {
    fn from(recipient: &Recipient) -> Self {
        Self {
            id: EntityId(recipient.id.0.clone()),
            name: recipient.name.clone(),
            kind: EntityKind::Recipient,
        }
    }
}

/// Lookup contract for the external identity provider. Unknown ids yield `Ok(None)`.
pub trait Directory: Send + Sync {
    fn donor(&self, id: &DonorId) -> Result<Option<Donor>, DirectoryError>;
    fn recipient(&self, id: &RecipientId) -> Result<Option<Recipient>, DirectoryError>;
    fn entity(&self, id: &EntityId) -> Result<Option<EntityRecord>, DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Validation failures for textual record fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordParseError {
    #[error("unrecognised blood type '{0}'")]
    BloodType(String),
    #[error("unrecognised organ '{0}'")]
    Organ(String),
    #[error("unrecognised urgency '{0}'")]
    Urgency(String),
}
