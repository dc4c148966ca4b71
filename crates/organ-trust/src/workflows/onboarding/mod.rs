//! Hospital and entity onboarding through the shared review workflow.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{VerificationId, VerificationRequest, VerificationStatus};
pub use repository::VerificationRepository;
pub use router::onboarding_router;
pub use service::OnboardingService;
