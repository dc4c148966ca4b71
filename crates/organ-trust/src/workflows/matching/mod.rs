//! Donor/recipient pairing, compatibility scoring, and match review.

pub mod domain;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    CompatibilityTier, MatchFilter, MatchId, MatchRecord, MatchStatus, Recommendation,
    SuccessTier,
};
pub use repository::MatchRepository;
pub use router::matching_router;
pub use scoring::{score, CompatibilityOutcome};
pub use service::{MatchReview, MatchingService};
