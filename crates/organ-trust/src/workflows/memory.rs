//! In-memory adapters for every collaborator trait. Used by the API service, the demo, and
//! the test suites; swap for real stores without touching the services.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::directory::{
    Directory, DirectoryError, DirectorySeed, Donor, DonorId, DonorStatus, EntityId,
    EntityRecord, Recipient, RecipientId,
};
use super::error::RepositoryError;
use super::matching::{MatchId, MatchRecord, MatchRepository};
use super::notify::{Notice, Notifier, NotifyError};
use super::onboarding::{VerificationId, VerificationRepository, VerificationRequest};
use super::review::{LedgerError, LedgerEvent, LedgerSink};
use super::risk::{FraudReport, RiskAssessment, RiskRepository, RiskSignalSource, SignalError};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store lock poisoned".to_string()))
}

/// Insertion-ordered table whose rows carry their own lock.
struct Table<K, T> {
    rows: HashMap<K, Arc<Mutex<T>>>,
    order: Vec<K>,
}

impl<K, T> Default for Table<K, T> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<K, T> Table<K, T>
where
    K: Clone + Eq + Hash + fmt::Display,
    T: Clone,
{
    fn insert(&mut self, key: K, value: T) -> Result<(), RepositoryError> {
        if self.rows.contains_key(&key) {
            return Err(RepositoryError::Conflict(key.to_string()));
        }
        self.rows.insert(key.clone(), Arc::new(Mutex::new(value)));
        self.order.push(key);
        Ok(())
    }

    /// Insert every entry or none of them.
    fn insert_all(&mut self, entries: Vec<(K, T)>) -> Result<(), RepositoryError> {
        let mut seen = Vec::with_capacity(entries.len());
        for (key, _) in &entries {
            if self.rows.contains_key(key) || seen.contains(&key) {
                return Err(RepositoryError::Conflict(key.to_string()));
            }
            seen.push(key);
        }
        for (key, value) in entries {
            self.rows.insert(key.clone(), Arc::new(Mutex::new(value)));
            self.order.push(key);
        }
        Ok(())
    }

    fn row(&self, key: &K) -> Option<Arc<Mutex<T>>> {
        self.rows.get(key).cloned()
    }

    fn snapshot(&self) -> Result<Vec<T>, RepositoryError> {
        self.order
            .iter()
            .filter_map(|key| self.rows.get(key))
            .map(|row| lock(row).map(|value| value.clone()))
            .collect()
    }
}

/// Store backing matches, donor availability, verification requests, and risk data.
#[derive(Default)]
pub struct InMemoryStore {
    matches: Mutex<Table<MatchId, MatchRecord>>,
    donors: Mutex<HashMap<DonorId, DonorStatus>>,
    verifications: Mutex<Table<VerificationId, VerificationRequest>>,
    assessments: Mutex<HashMap<EntityId, RiskAssessment>>,
    reports: Mutex<Vec<FraudReport>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // The table lock is released before the row lock is taken, so reviews of different
    // items never wait on each other.
    fn review_row<K, T, R, F>(
        table: &Mutex<Table<K, T>>,
        key: &K,
        apply: F,
    ) -> Result<R, RepositoryError>
    where
        K: Clone + Eq + Hash + fmt::Display,
        T: Clone,
        F: FnOnce(&mut T) -> R,
    {
        let row = lock(table)?
            .row(key)
            .ok_or_else(|| RepositoryError::NotFound(key.to_string()))?;
        let mut guard = lock(&row)?;
        Ok(apply(&mut guard))
    }
}

impl MatchRepository for InMemoryStore {
    fn insert_all(&self, records: Vec<MatchRecord>) -> Result<Vec<MatchRecord>, RepositoryError> {
        let entries = records
            .iter()
            .map(|record| (record.id.clone(), record.clone()))
            .collect();
        lock(&self.matches)?.insert_all(entries)?;
        Ok(records)
    }

    fn fetch(&self, id: &MatchId) -> Result<Option<MatchRecord>, RepositoryError> {
        let Some(row) = lock(&self.matches)?.row(id) else {
            return Ok(None);
        };
        let record = lock(&row)?.clone();
        Ok(Some(record))
    }

    fn list(&self) -> Result<Vec<MatchRecord>, RepositoryError> {
        lock(&self.matches)?.snapshot()
    }

    fn review<T, F>(&self, id: &MatchId, apply: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut MatchRecord) -> T,
    {
        Self::review_row(&self.matches, id, apply)
    }

    fn mark_donor_matched(&self, donor: &DonorId) -> Result<bool, RepositoryError> {
        let mut donors = lock(&self.donors)?;
        let previous = donors.insert(donor.clone(), DonorStatus::Matched);
        Ok(previous != Some(DonorStatus::Matched))
    }

    fn donor_status(&self, donor: &DonorId) -> Result<Option<DonorStatus>, RepositoryError> {
        Ok(lock(&self.donors)?.get(donor).copied())
    }
}

impl VerificationRepository for InMemoryStore {
    fn insert_unless_pending(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationRequest, RepositoryError> {
        let mut table = lock(&self.verifications)?;
        let existing = table.snapshot()?.into_iter().find(|stored| {
            stored.is_pending() && stored.subject_id == request.subject_id
        });
        if let Some(existing) = existing {
            return Ok(existing);
        }
        table.insert(request.id.clone(), request.clone())?;
        Ok(request)
    }

    fn fetch(&self, id: &VerificationId) -> Result<Option<VerificationRequest>, RepositoryError> {
        let Some(row) = lock(&self.verifications)?.row(id) else {
            return Ok(None);
        };
        let request = lock(&row)?.clone();
        Ok(Some(request))
    }

    fn review<T, F>(&self, id: &VerificationId, apply: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut VerificationRequest) -> T,
    {
        Self::review_row(&self.verifications, id, apply)
    }

    fn pending_for_subject(
        &self,
        subject: &EntityId,
    ) -> Result<Option<VerificationRequest>, RepositoryError> {
        let requests = lock(&self.verifications)?.snapshot()?;
        Ok(requests
            .into_iter()
            .find(|request| request.is_pending() && &request.subject_id == subject))
    }

    fn pending(&self, limit: usize) -> Result<Vec<VerificationRequest>, RepositoryError> {
        let requests = lock(&self.verifications)?.snapshot()?;
        Ok(requests
            .into_iter()
            .filter(VerificationRequest::is_pending)
            .take(limit)
            .collect())
    }
}

impl RiskRepository for InMemoryStore {
    fn record_assessment(&self, assessment: RiskAssessment) -> Result<(), RepositoryError> {
        lock(&self.assessments)?.insert(assessment.id.clone(), assessment);
        Ok(())
    }

    fn latest_assessment(
        &self,
        entity: &EntityId,
    ) -> Result<Option<RiskAssessment>, RepositoryError> {
        Ok(lock(&self.assessments)?.get(entity).cloned())
    }

    fn record_report(&self, report: FraudReport) -> Result<FraudReport, RepositoryError> {
        lock(&self.reports)?.push(report.clone());
        Ok(report)
    }

    fn reports_for(&self, entity: &EntityId) -> Result<Vec<FraudReport>, RepositoryError> {
        Ok(lock(&self.reports)?
            .iter()
            .filter(|report| &report.entity_id == entity)
            .cloned()
            .collect())
    }
}

/// Read-only directory hydrated from a [`DirectorySeed`].
#[derive(Debug, Default, Clone)]
pub struct InMemoryDirectory {
    donors: HashMap<DonorId, Donor>,
    recipients: HashMap<RecipientId, Recipient>,
    hospitals: HashMap<EntityId, EntityRecord>,
}

impl InMemoryDirectory {
    pub fn from_seed(seed: &DirectorySeed) -> Self {
        Self {
            donors: seed
                .donors
                .iter()
                .map(|donor| (donor.id.clone(), donor.clone()))
                .collect(),
            recipients: seed
                .recipients
                .iter()
                .map(|recipient| (recipient.id.clone(), recipient.clone()))
                .collect(),
            hospitals: seed
                .hospitals
                .iter()
                .map(|hospital| (hospital.id.clone(), hospital.clone()))
                .collect(),
        }
    }
}

impl Directory for InMemoryDirectory {
    fn donor(&self, id: &DonorId) -> Result<Option<Donor>, DirectoryError> {
        Ok(self.donors.get(id).cloned())
    }

    fn recipient(&self, id: &RecipientId) -> Result<Option<Recipient>, DirectoryError> {
        Ok(self.recipients.get(id).cloned())
    }

    fn entity(&self, id: &EntityId) -> Result<Option<EntityRecord>, DirectoryError> {
        if let Some(donor) = self.donors.get(&DonorId(id.0.clone())) {
            return Ok(Some(EntityRecord::from(donor)));
        }
        if let Some(recipient) = self.recipients.get(&RecipientId(id.0.clone())) {
            return Ok(Some(EntityRecord::from(recipient)));
        }
        Ok(self.hospitals.get(id).cloned())
    }
}

/// Fixed anomaly scores keyed by entity; unknown entities score zero.
#[derive(Debug, Default, Clone)]
pub struct StaticRiskSignals {
    scores: HashMap<EntityId, u8>,
}

impl StaticRiskSignals {
    pub fn from_seed(seed: &DirectorySeed) -> Self {
        Self {
            scores: seed.risk_scores.iter().cloned().collect(),
        }
    }

    pub fn with_score(mut self, entity: &str, score: u8) -> Self {
        self.scores.insert(EntityId(entity.to_string()), score);
        self
    }
}

impl RiskSignalSource for StaticRiskSignals {
    fn score_for(&self, entity: &EntityId) -> Result<u8, SignalError> {
        Ok(self.scores.get(entity).copied().unwrap_or(0))
    }
}

/// Ledger sink that keeps every event in append order.
#[derive(Debug, Default)]
pub struct RecordingLedger {
    events: Mutex<Vec<LedgerEvent>>,
}

impl RecordingLedger {
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LedgerSink for RecordingLedger {
    fn record(&self, event: &LedgerEvent) -> Result<(), LedgerError> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| LedgerError::Unavailable("ledger lock poisoned".to_string()))?;
        debug!(item_id = %event.item_id, to = %event.to_state, "ledger entry appended");
        events.push(event.clone());
        Ok(())
    }
}

/// Notifier that keeps published notices for inspection.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn publish(&self, notice: Notice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .map_err(|_| NotifyError::Transport("notifier lock poisoned".to_string()))?
            .push(notice);
        Ok(())
    }
}
