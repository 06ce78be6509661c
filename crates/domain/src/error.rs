use thiserror::Error;

/// Errors raised by domain-level validation.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Input failed validation before any state was touched.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
