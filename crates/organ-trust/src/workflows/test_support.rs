use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use super::directory::{
    Directory, DirectoryError, DirectorySeed, Donor, DonorId, DonorStatus, EntityId, EntityKind,
    EntityRecord, Organ, Recipient, RecipientId, Urgency,
};
use super::error::RepositoryError;
use super::matching::{MatchId, MatchRecord, MatchRepository, MatchingService};
use super::memory::{
    InMemoryDirectory, InMemoryStore, RecordingLedger, RecordingNotifier, StaticRiskSignals,
};
use super::notify::{Notice, Notifier, NotifyError};
use super::onboarding::{
    OnboardingService, VerificationId, VerificationRepository, VerificationRequest,
    VerificationStatus,
};
use super::review::{
    Actor, ActorRole, LedgerError, LedgerEvent, LedgerSink, VerificationWorkflow,
};
use super::risk::{RiskService, RiskSignalSource, SignalError};

pub(crate) fn donor(id: &str, name: &str, age: u8, blood: &str, organ: Organ) -> Donor {
    Donor {
        id: DonorId(id.to_string()),
        name: name.to_string(),
        age,
        blood_type: blood.parse().expect("valid blood type"),
        organ,
        status: DonorStatus::Available,
    }
}

pub(crate) fn recipient(id: &str, name: &str, age: u8, blood: &str, organ: Organ) -> Recipient {
    Recipient {
        id: RecipientId(id.to_string()),
        name: name.to_string(),
        age,
        blood_type: blood.parse().expect("valid blood type"),
        organ,
        urgency: Urgency::High,
        waiting_since: NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date"),
    }
}

fn hospital(id: &str, name: &str) -> EntityRecord {
    EntityRecord {
        id: EntityId(id.to_string()),
        name: name.to_string(),
        kind: EntityKind::Hospital,
    }
}

/// Three donor/recipient pairs plus hospitals spread across every risk tier.
pub(crate) fn seed() -> DirectorySeed {
    DirectorySeed {
        donors: vec![
            donor("D-001", "Maria Lopez", 34, "O+", Organ::Kidney),
            donor("D-002", "James Carter", 51, "A+", Organ::Liver),
            donor("D-003", "Aiko Tanaka", 28, "B-", Organ::Heart),
        ],
        recipients: vec![
            recipient("R-001", "Samuel Reed", 40, "A-", Organ::Kidney),
            recipient("R-002", "Priya Nair", 45, "B+", Organ::Liver),
            recipient("R-003", "Lukas Meyer", 62, "AB+", Organ::Lung),
        ],
        hospitals: vec![
            hospital("H-001", "St. Mary Transplant Center"),
            hospital("H-002", "Northside General"),
            hospital("H-003", "Harbor Clinic"),
            hospital("H-004", "Lakeview Medical"),
            hospital("H-005", "Summit Regional"),
        ],
        risk_scores: vec![
            (EntityId("H-001".to_string()), 10),
            (EntityId("H-002".to_string()), 62),
            (EntityId("H-003".to_string()), 85),
            (EntityId("H-004".to_string()), 24),
            (EntityId("H-005".to_string()), 25),
        ],
    }
}

pub(crate) fn pending_verification(id: &str, subject: &str) -> VerificationRequest {
    VerificationRequest {
        id: VerificationId(id.to_string()),
        subject_id: EntityId(subject.to_string()),
        subject_name: format!("{subject} name"),
        subject_kind: EntityKind::Hospital,
        status: VerificationStatus::Pending,
        applied_at: Utc::now(),
        rejection_reason: None,
    }
}

pub(crate) fn admin() -> Actor {
    Actor::new("admin-1", ActorRole::Admin)
}

pub(crate) fn coordinator() -> Actor {
    Actor::new("coord-7", ActorRole::Coordinator)
}

pub(crate) struct FailingLedger;

impl LedgerSink for FailingLedger {
    fn record(&self, _event: &LedgerEvent) -> Result<(), LedgerError> {
        Err(LedgerError::Unavailable("write timed out".to_string()))
    }
}

pub(crate) struct UnavailableDirectory;

impl Directory for UnavailableDirectory {
    fn donor(&self, _id: &DonorId) -> Result<Option<Donor>, DirectoryError> {
        Err(DirectoryError::Unavailable("identity provider timed out".to_string()))
    }

    fn recipient(&self, _id: &RecipientId) -> Result<Option<Recipient>, DirectoryError> {
        Err(DirectoryError::Unavailable("identity provider timed out".to_string()))
    }

    fn entity(&self, _id: &EntityId) -> Result<Option<EntityRecord>, DirectoryError> {
        Err(DirectoryError::Unavailable("identity provider timed out".to_string()))
    }
}

pub(crate) struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn publish(&self, _notice: Notice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay down".to_string()))
    }
}

/// In-memory store whose secondary calls can be switched into an outage.
#[derive(Default)]
pub(crate) struct FlakyStore {
    pub(crate) inner: InMemoryStore,
    pub(crate) fail_donor_flip: AtomicBool,
    pub(crate) fail_pending_lookup: AtomicBool,
}

impl FlakyStore {
    fn outage(flag: &AtomicBool) -> Result<(), RepositoryError> {
        if flag.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("timeout".to_string()));
        }
        Ok(())
    }
}

impl MatchRepository for FlakyStore {
    fn insert_all(&self, records: Vec<MatchRecord>) -> Result<Vec<MatchRecord>, RepositoryError> {
        self.inner.insert_all(records)
    }

    fn fetch(&self, id: &MatchId) -> Result<Option<MatchRecord>, RepositoryError> {
        MatchRepository::fetch(&self.inner, id)
    }

    fn list(&self) -> Result<Vec<MatchRecord>, RepositoryError> {
        self.inner.list()
    }

    fn review<T, F>(&self, id: &MatchId, apply: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut MatchRecord) -> T,
    {
        MatchRepository::review(&self.inner, id, apply)
    }

    fn mark_donor_matched(&self, donor: &DonorId) -> Result<bool, RepositoryError> {
        Self::outage(&self.fail_donor_flip)?;
        self.inner.mark_donor_matched(donor)
    }

    fn donor_status(&self, donor: &DonorId) -> Result<Option<DonorStatus>, RepositoryError> {
        self.inner.donor_status(donor)
    }
}

impl VerificationRepository for FlakyStore {
    fn insert_unless_pending(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationRequest, RepositoryError> {
        self.inner.insert_unless_pending(request)
    }

    fn fetch(&self, id: &VerificationId) -> Result<Option<VerificationRequest>, RepositoryError> {
        VerificationRepository::fetch(&self.inner, id)
    }

    fn review<T, F>(&self, id: &VerificationId, apply: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut VerificationRequest) -> T,
    {
        VerificationRepository::review(&self.inner, id, apply)
    }

    fn pending_for_subject(
        &self,
        subject: &EntityId,
    ) -> Result<Option<VerificationRequest>, RepositoryError> {
        Self::outage(&self.fail_pending_lookup)?;
        self.inner.pending_for_subject(subject)
    }

    fn pending(&self, limit: usize) -> Result<Vec<VerificationRequest>, RepositoryError> {
        self.inner.pending(limit)
    }
}

pub(crate) struct UnavailableSignals;

impl RiskSignalSource for UnavailableSignals {
    fn score_for(&self, _entity: &EntityId) -> Result<u8, SignalError> {
        Err(SignalError::Unavailable("anomaly model offline".to_string()))
    }
}

/// Fully wired services over one shared in-memory store.
pub(crate) struct Harness {
    pub(crate) store: Arc<InMemoryStore>,
    pub(crate) ledger: Arc<RecordingLedger>,
    pub(crate) notifier: Arc<RecordingNotifier>,
    pub(crate) matching: Arc<MatchingService<InMemoryStore>>,
    pub(crate) onboarding: Arc<OnboardingService<InMemoryStore>>,
    pub(crate) risk: Arc<RiskService<InMemoryStore, InMemoryStore>>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        let ledger = Arc::new(RecordingLedger::default());
        let directory = Arc::new(InMemoryDirectory::from_seed(&seed()));
        Self::assemble(directory, ledger.clone(), ledger)
    }

    pub(crate) fn with_ledger(sink: Arc<dyn LedgerSink>) -> Self {
        let directory = Arc::new(InMemoryDirectory::from_seed(&seed()));
        Self::assemble(directory, sink, Arc::new(RecordingLedger::default()))
    }

    pub(crate) fn with_directory(directory: Arc<dyn Directory>) -> Self {
        let ledger = Arc::new(RecordingLedger::default());
        Self::assemble(directory, ledger.clone(), ledger)
    }

    fn assemble(
        directory: Arc<dyn Directory>,
        sink: Arc<dyn LedgerSink>,
        ledger: Arc<RecordingLedger>,
    ) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let workflow = Arc::new(VerificationWorkflow::new(sink));
        let signals = Arc::new(StaticRiskSignals::from_seed(&seed()));

        let matching = Arc::new(MatchingService::new(
            directory.clone(),
            store.clone(),
            workflow.clone(),
            notifier.clone(),
        ));
        let onboarding = Arc::new(OnboardingService::new(
            directory.clone(),
            store.clone(),
            workflow.clone(),
            notifier.clone(),
        ));
        let risk = Arc::new(RiskService::new(
            directory,
            signals,
            store.clone(),
            store.clone(),
            workflow,
            notifier.clone(),
        ));

        Self {
            store,
            ledger,
            notifier,
            matching,
            onboarding,
            risk,
        }
    }
}
