//! Key generation: one complete run from basis fan-out to hex key.

use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument, warn};

use foam_extract::metrics::{extraction_ratio, ones_fraction, population_std_dev};
use foam_extract::{Certificate, ExtractionPipeline, PipelineConfig, WhiteningMethod, bits_to_hex};
use foam_hal::BasisSet;

use crate::engine::{BasisOutcome, ExecutionEngine};
use crate::error::{Error, Result};

/// What to sample and how to extract it.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub bases: BasisSet,
    pub shots_per_basis: u32,
    pub pipeline: PipelineConfig,
    /// Device name recorded in certificates.
    pub device_label: String,
    /// Preparation angle recorded in certificates, if the device has one.
    pub theta_deg: Option<f64>,
    pub issue_certificate: bool,
}

/// Wall-clock cost of each phase, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Timings {
    pub submission_ms: u64,
    pub collection_ms: u64,
    pub total_ms: u64,
}

/// A basis that dropped out of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedBasis {
    pub label: String,
    pub error: String,
}

/// Output of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    /// `output_bits / 4` lowercase hex characters.
    pub key_hex: String,
    /// Population std-dev of the surviving bases' expectation values.
    pub foam_strength: f64,
    pub raw_bit_count: usize,
    pub extracted_bit_count: usize,
    /// Fraction of ones in the key.
    pub randomness_score: f64,
    pub extraction_ratio: f64,
    pub whitening: WhiteningMethod,
    /// Set when the key came from the hash expansion.
    pub hash_fallback: bool,
    pub surviving_bases: usize,
    pub failed_bases: Vec<FailedBasis>,
    pub shots_per_basis: u32,
    pub timings: Timings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,
}

/// Runs the full generation sequence against an engine.
pub struct KeyGenerator {
    engine: ExecutionEngine,
    config: GeneratorConfig,
    pipeline: ExtractionPipeline,
}

impl KeyGenerator {
    /// Create a generator, validating the pipeline settings.
    pub fn new(engine: ExecutionEngine, config: GeneratorConfig) -> Result<Self> {
        let pipeline = ExtractionPipeline::new(config.pipeline)?;
        Ok(Self {
            engine,
            config,
            pipeline,
        })
    }

    /// The generator settings.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Submit barrier, collect barrier, pool, extract.
    #[instrument(skip(self), fields(bases = self.config.bases.len(), output_bits = self.config.pipeline.output_bits))]
    pub async fn generate(&self) -> Result<GenerationResult> {
        let start = Instant::now();

        let submissions = self
            .engine
            .submit_all(&self.config.bases, self.config.shots_per_basis)
            .await;
        let submission_ms = elapsed_ms(start);

        let collection_start = Instant::now();
        let outcomes = self.engine.collect_all(submissions).await;
        let collection_ms = elapsed_ms(collection_start);

        let (pool, expectations, failed_bases) = pool_outcomes(outcomes);
        let surviving_bases = expectations.len();
        let raw_bits = pool.len();
        let output_bits = self.config.pipeline.output_bits;

        info!(
            surviving_bases,
            failed = failed_bases.len(),
            raw_bits,
            submission_ms,
            collection_ms,
            "collection complete"
        );

        // Von Neumann yields at most one bit per pair.
        let required_bits = 2 * output_bits;
        if surviving_bases == 0 || raw_bits < required_bits {
            return Err(Error::InsufficientEntropy {
                surviving_bases,
                raw_bits,
                required_bits,
            });
        }

        let output = self.pipeline.run(pool)?;
        if output.method.is_fallback() {
            warn!(
                debiased_bits = output.debiased_bits,
                output_bits, "too few debiased bits, key derived by hash fallback"
            );
        }

        let certificate = if self.config.issue_certificate {
            Certificate::issue(
                &output.bits,
                &expectations,
                &self.config.device_label,
                self.config.theta_deg,
            )
            .map(Some)
            .map_err(|e| Error::Internal(format!("certificate: {e}")))?
        } else {
            None
        };

        Ok(GenerationResult {
            key_hex: bits_to_hex(&output.bits),
            foam_strength: population_std_dev(&expectations),
            raw_bit_count: output.raw_bits,
            extracted_bit_count: output.bits.len(),
            randomness_score: ones_fraction(&output.bits),
            extraction_ratio: extraction_ratio(output.debiased_bits, output.raw_bits),
            whitening: output.method,
            hash_fallback: output.method.is_fallback(),
            surviving_bases,
            failed_bases,
            shots_per_basis: self.config.shots_per_basis,
            timings: Timings {
                submission_ms,
                collection_ms,
                total_ms: elapsed_ms(start),
            },
            certificate,
        })
    }
}

/// Split outcomes into the pooled bits, the surviving expectation values and
/// the failures.
fn pool_outcomes(outcomes: Vec<BasisOutcome>) -> (Vec<u8>, Vec<f64>, Vec<FailedBasis>) {
    let mut pool = Vec::new();
    let mut expectations = Vec::new();
    let mut failed = Vec::new();

    for outcome in outcomes {
        match outcome.error {
            None => {
                pool.extend(outcome.bits);
                expectations.push(outcome.expectation_value);
            }
            Some(e) => failed.push(FailedBasis {
                label: outcome.basis.label().to_string(),
                error: e.to_string(),
            }),
        }
    }

    (pool, expectations, failed)
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}
