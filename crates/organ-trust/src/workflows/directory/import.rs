use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use super::{
    BloodType, Donor, DonorId, DonorStatus, EntityId, EntityKind, EntityRecord, Organ, Recipient,
    RecipientId, RecordParseError, Urgency,
};

#[derive(Debug)]
pub enum DirectoryImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Record { line: usize, reason: String },
}

impl std::fmt::Display for DirectoryImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectoryImportError::Io(err) => write!(f, "failed to read directory seed: {}", err),
            DirectoryImportError::Csv(err) => write!(f, "invalid directory CSV data: {}", err),
            DirectoryImportError::Record { line, reason } => {
                write!(f, "directory row {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for DirectoryImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DirectoryImportError::Io(err) => Some(err),
            DirectoryImportError::Csv(err) => Some(err),
            DirectoryImportError::Record { .. } => None,
        }
    }
}

impl From<std::io::Error> for DirectoryImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for DirectoryImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Records loaded from a seed file, ready to hydrate an in-memory directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectorySeed {
    pub donors: Vec<Donor>,
    pub recipients: Vec<Recipient>,
    pub hospitals: Vec<EntityRecord>,
    pub risk_scores: Vec<(EntityId, u8)>,
}

/// Loads directory seeds from CSV with the header
/// `kind,id,name,age,blood_type,organ,urgency,waiting_since,risk_score`.
pub struct DirectoryImporter;

impl DirectoryImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<DirectorySeed, DirectoryImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<DirectorySeed, DirectoryImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut seed = DirectorySeed::default();

        for (index, row) in csv_reader.deserialize::<DirectoryRow>().enumerate() {
            // header occupies line 1
            let line = index + 2;
            let row = row?;
            row.apply(&mut seed)
                .map_err(|reason| DirectoryImportError::Record { line, reason })?;
        }

        Ok(seed)
    }
}

#[derive(Debug, Deserialize)]
struct DirectoryRow {
    kind: String,
    id: String,
    name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    age: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    blood_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    organ: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    urgency: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    waiting_since: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    risk_score: Option<String>,
}

impl DirectoryRow {
    fn apply(self, seed: &mut DirectorySeed) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id must not be empty".to_string());
        }

        if let Some(raw) = self.risk_score.as_deref() {
            let score = raw
                .parse::<u8>()
                .ok()
                .filter(|score| *score <= 100)
                .ok_or_else(|| format!("risk_score '{raw}' must be an integer 0-100"))?;
            seed.risk_scores.push((EntityId(self.id.clone()), score));
        }

        match self.kind.trim().to_ascii_lowercase().as_str() {
            "donor" => {
                let donor = Donor {
                    id: DonorId(self.id.clone()),
                    name: self.name.clone(),
                    age: self.age()?,
                    blood_type: self.blood_type()?,
                    organ: self.organ()?,
                    status: DonorStatus::Available,
                };
                seed.donors.push(donor);
            }
            "recipient" => {
                let urgency = self
                    .urgency
                    .as_deref()
                    .unwrap_or("medium")
                    .parse::<Urgency>()
                    .map_err(|err: RecordParseError| err.to_string())?;
                let waiting_since = self
                    .waiting_since
                    .as_deref()
                    .ok_or_else(|| "waiting_since is required for recipients".to_string())
                    .and_then(|raw| {
                        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                            .map_err(|err| format!("waiting_since '{raw}': {err}"))
                    })?;
                let recipient = Recipient {
                    id: RecipientId(self.id.clone()),
                    name: self.name.clone(),
                    age: self.age()?,
                    blood_type: self.blood_type()?,
                    organ: self.organ()?,
                    urgency,
                    waiting_since,
                };
                seed.recipients.push(recipient);
            }
            "hospital" => seed.hospitals.push(EntityRecord {
                id: EntityId(self.id),
                name: self.name,
                kind: EntityKind::Hospital,
            }),
            other => return Err(format!("unknown kind '{other}'")),
        }

        Ok(())
    }

    fn age(&self) -> Result<u8, String> {
        let raw = self.age.as_deref().ok_or("age is required")?;
        raw.parse::<u8>()
            .ok()
            .filter(|age| *age > 0)
            .ok_or_else(|| format!("age '{raw}' must be a positive integer"))
    }

    fn blood_type(&self) -> Result<BloodType, String> {
        self.blood_type
            .as_deref()
            .ok_or("blood_type is required")?
            .parse()
            .map_err(|err: RecordParseError| err.to_string())
    }

    fn organ(&self) -> Result<Organ, String> {
        self.organ
            .as_deref()
            .ok_or("organ is required")?
            .parse()
            .map_err(|err: RecordParseError| err.to_string())
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
