//! Randomness extraction for the quantum foam service.
//!
//! Turns raw outcome histograms into a fixed-length, debiased, whitened bit
//! string:
//!
//! 1. [`extract_basis`] expands one histogram into bits and an expectation value.
//! 2. [`ExtractionPipeline`] shuffles the pooled bits, applies the
//!    [`von_neumann`] extractor, optional [`block_parity`] decorrelation, and
//!    [`whiten`]s to exactly `output_bits` bits.
//! 3. [`bits_to_hex`] assembles the key; [`metrics`] and [`Certificate`]
//!    describe it.
//! 4. [`convert`] draws uniform floats and unbiased integers from the bits.
//!
//! Everything here is synchronous and CPU-only.

pub mod certificate;
pub mod convert;
pub mod debias;
pub mod error;
pub mod extractor;
pub mod hex;
pub mod metrics;
pub mod pipeline;
pub mod whiten;

pub use certificate::{Certificate, CertificatePolicy, FoamSignature};
pub use convert::{IntRange, bits_to_range_u64, bits_to_uniform_f64};
pub use debias::{block_parity, von_neumann};
pub use error::{CertificateError, ExtractError, ExtractResult};
pub use extractor::{BasisSample, Contingency, extract_basis};
pub use hex::{bits_to_hex, hex_to_bits};
pub use pipeline::{ExtractionOutput, ExtractionPipeline, PipelineConfig};
pub use whiten::{TOEPLITZ_SEED, ToeplitzParams, Whitened, WhiteningMethod, whiten};
