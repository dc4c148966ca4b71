use super::domain::{VerificationId, VerificationRequest};
use crate::workflows::directory::EntityId;
use crate::workflows::error::RepositoryError;

/// Storage abstraction for onboarding requests.
pub trait VerificationRepository: Send + Sync {
    /// Insert `request` unless its subject already has a pending request, which is returned
    /// instead. The check and the insert happen atomically.
    fn insert_unless_pending(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationRequest, RepositoryError>;
    fn fetch(&self, id: &VerificationId) -> Result<Option<VerificationRequest>, RepositoryError>;
    /// Run `apply` against the stored request under that request's exclusive lock.
    fn review<T, F>(&self, id: &VerificationId, apply: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut VerificationRequest) -> T;
    fn pending_for_subject(
        &self,
        subject: &EntityId,
    ) -> Result<Option<VerificationRequest>, RepositoryError>;
    /// Pending requests in application order, at most `limit`.
    fn pending(&self, limit: usize) -> Result<Vec<VerificationRequest>, RepositoryError>;
}
