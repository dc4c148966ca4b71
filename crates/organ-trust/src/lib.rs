//! Donor/recipient compatibility matching and entity trust scoring, with every decision
//! passing through one auditable review workflow.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
