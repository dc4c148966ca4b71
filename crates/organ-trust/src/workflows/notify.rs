use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Human-readable status message handed to the notification layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub template: String,
    pub subject_id: String,
    pub details: BTreeMap<String, String>,
}

impl Notice {
    pub fn new(template: &str, subject_id: impl Into<String>) -> Self {
        Self {
            template: template.to_string(),
            subject_id: subject_id.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }
}

/// Outbound notification hook (e-mail, dashboard toasts, chat relays).
pub trait Notifier: Send + Sync {
    fn publish(&self, notice: Notice) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Fire-and-forget publish; failures are logged and never reach the caller.
pub(crate) fn publish_quietly(notifier: &dyn Notifier, notice: Notice) {
    let template = notice.template.clone();
    if let Err(err) = notifier.publish(notice) {
        warn!(%template, error = %err, "notification dropped");
    }
}
