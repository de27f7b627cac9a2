//! Error types for orchestration and job management.

use thiserror::Error;

use crate::config::ConfigError;
use crate::jobs::JobStatus;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Run-level and job-level errors.
///
/// Per-basis failures never appear here; they are recorded on the basis
/// outcome and the basis is left out of the pool.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Too few bases or bits survived to reach the requested output length.
    #[error(
        "Insufficient entropy collected: {surviving_bases} bases survived with {raw_bits} raw bits, {required_bits} required"
    )]
    InsufficientEntropy {
        surviving_bases: usize,
        raw_bits: usize,
        required_bits: usize,
    },

    /// Extraction pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] foam_extract::ExtractError),

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// A job status change that would move the state machine backwards.
    #[error("Invalid job transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    /// Backend error.
    #[error("Backend error: {0}")]
    Backend(#[from] foam_hal::HalError),

    /// Internal error, including panics caught at the job boundary.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
