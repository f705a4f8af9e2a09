pub mod key_assigner;
pub mod pipeline;
pub mod validator;

pub use key_assigner::KeyAssigner;
pub use validator::{validate, ValidationResult, Violation};

use crate::db::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("malformed signal payload: {0}")]
    MalformedPayload(String),

    #[error("invalid signal: {}", describe(.violations))]
    InvalidSignal { violations: Vec<Violation> },

    #[error("failed to store signal: {0}")]
    StorageFailure(#[from] StoreError),
}

fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
