//! Error types for bit extraction and certificates.

use thiserror::Error;

/// Errors raised while turning histograms into whitened bits.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// The histogram recorded no occurrences.
    #[error("Histogram is empty: no outcomes were recorded")]
    EmptyHistogram,

    /// An outcome label does not resolve to a two-bit value.
    #[error("Invalid outcome label: {0}")]
    InvalidOutcome(String),

    /// Nothing is left to whiten.
    #[error("Insufficient entropy: {available} bits available, {required} required")]
    InsufficientEntropy { available: usize, required: usize },

    /// The pipeline configuration is unusable.
    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Reasons a generation certificate fails verification.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CertificateError {
    /// The stored fingerprint does not match the certificate body.
    #[error("Certificate tampered: fingerprint mismatch")]
    FingerprintMismatch,

    /// The stored foam hash does not match the foam signature.
    #[error("Certificate tampered: foam hash mismatch")]
    FoamHashMismatch,

    /// Spread of expectation values is below the policy threshold.
    #[error("Foam signature too weak: std {std:.4} < {minimum:.4}")]
    WeakFoamSignature { std: f64, minimum: f64 },

    /// Canonical JSON encoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
