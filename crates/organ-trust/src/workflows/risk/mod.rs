//! Entity risk classification and the fraud-report workflow.

pub mod domain;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{FraudDetected, FraudReport, RiskAssessment, RiskTier};
pub use repository::{RiskRepository, RiskSignalSource, SignalError};
pub use router::risk_router;
pub use scoring::{assess, FRAUD_REPORT_FLOOR};
pub use service::{FraudReceipt, RiskService};
