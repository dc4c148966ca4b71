use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use organ_trust::error::AppError;
use organ_trust::workflows::directory::{DirectoryImporter, DirectorySeed};
use organ_trust::workflows::matching::MatchingService;
use organ_trust::workflows::memory::{
    InMemoryDirectory, InMemoryStore, RecordingLedger, RecordingNotifier, StaticRiskSignals,
};
use organ_trust::workflows::onboarding::OnboardingService;
use organ_trust::workflows::review::VerificationWorkflow;
use organ_trust::workflows::risk::RiskService;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Built-in directory used when no seed CSV is configured.
const DEFAULT_DIRECTORY_CSV: &str = "\
kind,id,name,age,blood_type,organ,urgency,waiting_since,risk_score
donor,D-001,Maria Lopez,34,O+,kidney,,,12
donor,D-002,James Carter,51,A+,liver,,,
donor,D-003,Aiko Tanaka,28,B-,heart,,,
donor,D-004,Omar Haddad,45,AB+,lung,,,
recipient,R-001,Samuel Reed,40,A-,kidney,critical,2023-11-02,
recipient,R-002,Priya Nair,45,B+,liver,high,2024-01-15,
recipient,R-003,Lukas Meyer,62,AB+,heart,medium,2024-06-30,
recipient,R-004,Grace Okafor,39,O-,lung,high,2024-02-11,
hospital,H-001,St. Mary Transplant Center,,,,,,10
hospital,H-002,Northside General,,,,,,62
hospital,H-003,Harbor Clinic,,,,,,85
hospital,H-004,Lakeview Medical,,,,,,24
";

pub(crate) fn load_seed(path: Option<&Path>) -> Result<DirectorySeed, AppError> {
    let seed = match path {
        Some(path) => {
            info!(path = %path.display(), "loading directory seed");
            DirectoryImporter::from_path(path)?
        }
        None => DirectoryImporter::from_reader(Cursor::new(DEFAULT_DIRECTORY_CSV))?,
    };
    info!(
        donors = seed.donors.len(),
        recipients = seed.recipients.len(),
        hospitals = seed.hospitals.len(),
        "directory seeded"
    );
    Ok(seed)
}

/// Workflow services sharing one store, one ledger, and one notifier.
pub(crate) struct Services {
    pub(crate) matching: Arc<MatchingService<InMemoryStore>>,
    pub(crate) onboarding: Arc<OnboardingService<InMemoryStore>>,
    pub(crate) risk: Arc<RiskService<InMemoryStore, InMemoryStore>>,
    pub(crate) ledger: Arc<RecordingLedger>,
    pub(crate) notifier: Arc<RecordingNotifier>,
}

impl Services {
    pub(crate) fn from_seed(seed: &DirectorySeed) -> Self {
        let directory = Arc::new(InMemoryDirectory::from_seed(seed));
        let signals = Arc::new(StaticRiskSignals::from_seed(seed));
        let store = Arc::new(InMemoryStore::new());
        let ledger = Arc::new(RecordingLedger::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let workflow = Arc::new(VerificationWorkflow::new(ledger.clone()));

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
            store,
            workflow,
            notifier.clone(),
        ));

        Self {
            matching,
            onboarding,
            risk,
            ledger,
            notifier,
        }
    }
}
