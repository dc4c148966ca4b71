use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of reviewable item a ledger entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerItemKind {
    Match,
    Verification,
    FraudReport,
}

/// Immutable audit entry appended after every accepted decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub item_id: String,
    pub kind: LedgerItemKind,
    pub from_state: String,
    pub to_state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    pub actor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Append-only audit sink. Implementations enforce their own timeouts and report expiry as
/// [`LedgerError::Unavailable`].
pub trait LedgerSink: Send + Sync {
    fn record(&self, event: &LedgerEvent) -> Result<(), LedgerError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
    #[error("ledger rejected entry: {0}")]
    Rejected(String),
}
