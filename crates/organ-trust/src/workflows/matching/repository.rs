use super::domain::{MatchId, MatchRecord};
use crate::workflows::directory::{DonorId, DonorStatus};
use crate::workflows::error::RepositoryError;

/// Storage abstraction for match lifecycle and donor availability.
pub trait MatchRepository: Send + Sync {
    /// Store a generated batch atomically: on error nothing from the batch is visible.
    fn insert_all(&self, records: Vec<MatchRecord>) -> Result<Vec<MatchRecord>, RepositoryError>;
    fn fetch(&self, id: &MatchId) -> Result<Option<MatchRecord>, RepositoryError>;
    /// All matches in insertion order.
    fn list(&self) -> Result<Vec<MatchRecord>, RepositoryError>;
    /// Run `apply` against the stored record while holding that record's exclusive lock.
    /// Concurrent calls on the same id are serialized; different ids may proceed in parallel.
    fn review<T, F>(&self, id: &MatchId, apply: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut MatchRecord) -> T;
    /// Flip a donor to `Matched`. Returns `false` when the donor was already matched.
    fn mark_donor_matched(&self, donor: &DonorId) -> Result<bool, RepositoryError>;
    /// Locally tracked donor status, if the matching workflow has touched the donor.
    fn donor_status(&self, donor: &DonorId) -> Result<Option<DonorStatus>, RepositoryError>;
}
