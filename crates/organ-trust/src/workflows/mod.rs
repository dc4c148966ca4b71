pub mod directory;
pub mod error;
pub mod matching;
pub mod memory;
pub mod notify;
pub mod onboarding;
pub mod review;
pub mod risk;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{RepositoryError, WorkflowError};
