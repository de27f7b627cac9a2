//! Error types for the HAL crate.

use thiserror::Error;

/// Errors that can occur in backend adapter operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Backend is not available.
    #[error("Backend not available: {0}")]
    BackendUnavailable(String),

    /// Job submission failed.
    #[error("Job submission failed: {0}")]
    SubmissionFailed(String),

    /// Job execution failed on the backend.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// Job handle unknown to the backend.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Basis label could not be parsed into a measurement configuration.
    #[error("Invalid basis: {0}")]
    InvalidBasis(String),

    /// Invalid number of shots.
    #[error("Invalid shots: {0}")]
    InvalidShots(String),

    /// The result never became ready within the polling budget.
    #[error("Timeout waiting for job {handle} after {attempts} attempts")]
    Timeout { handle: String, attempts: u32 },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic backend error.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl HalError {
    /// Whether this error ended a bounded wait rather than coming from the backend.
    pub fn is_timeout(&self) -> bool {
        matches!(self, HalError::Timeout { .. })
    }
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;
