//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// These cover process-level failures while wiring the service together.
/// Per-operation ledger failures have their own closed taxonomy in the core crate.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration is missing or violates a restriction.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
