//! The extraction pipeline.
//!
//! ```text
//!   pool ──→ shuffle ──→ von Neumann ──→ [block parity] ──→ whiten ──→ bits
//! ```
//!
//! Everything after the shuffle is deterministic.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::debias::{block_parity, von_neumann};
use crate::error::{ExtractError, ExtractResult};
use crate::whiten::{DEFAULT_SUBSET_SIZE, ToeplitzParams, WhiteningMethod, whiten};

/// Pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Exact length of the output; a positive multiple of 4.
    pub output_bits: usize,
    /// Block size of the optional parity stage. `None` skips it.
    pub decorrelation_block: Option<usize>,
    /// Input positions mixed into each output bit.
    pub toeplitz_subset: usize,
}

impl PipelineConfig {
    /// Configuration with no decorrelation stage and the default subset.
    pub fn new(output_bits: usize) -> Self {
        Self {
            output_bits,
            decorrelation_block: None,
            toeplitz_subset: DEFAULT_SUBSET_SIZE,
        }
    }

    /// Enable the block parity stage.
    pub fn with_decorrelation(mut self, block: usize) -> Self {
        self.decorrelation_block = Some(block);
        self
    }

    /// Set the Toeplitz subset size.
    pub fn with_toeplitz_subset(mut self, subset: usize) -> Self {
        self.toeplitz_subset = subset;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ExtractResult<()> {
        if self.output_bits == 0 || self.output_bits % 4 != 0 {
            return Err(ExtractError::InvalidConfig(format!(
                "output_bits must be a positive multiple of 4, got {}",
                self.output_bits
            )));
        }
        if self.toeplitz_subset == 0 {
            return Err(ExtractError::InvalidConfig(
                "toeplitz_subset must be positive".into(),
            ));
        }
        if self.decorrelation_block == Some(0) {
            return Err(ExtractError::InvalidConfig(
                "decorrelation_block must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Result of one pipeline run, with stage sizes for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOutput {
    /// Exactly `output_bits` whitened bits.
    pub bits: Vec<u8>,
    pub raw_bits: usize,
    pub debiased_bits: usize,
    pub decorrelated_bits: usize,
    pub method: WhiteningMethod,
}

/// Turns a pooled bit sequence into a fixed-length whitened output.
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    config: PipelineConfig,
}

impl ExtractionPipeline {
    /// Create a pipeline, validating its configuration.
    pub fn new(config: PipelineConfig) -> ExtractResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline with the thread-local RNG for the pool shuffle.
    pub fn run(&self, pool: Vec<u8>) -> ExtractResult<ExtractionOutput> {
        self.run_with_rng(pool, &mut rand::thread_rng())
    }

    /// Run the pipeline with a caller-supplied RNG for the pool shuffle.
    pub fn run_with_rng<R: Rng + ?Sized>(
        &self,
        mut pool: Vec<u8>,
        rng: &mut R,
    ) -> ExtractResult<ExtractionOutput> {
        let raw_bits = pool.len();
        pool.shuffle(rng);

        let debiased = von_neumann(&pool);
        let decorrelated = match self.config.decorrelation_block {
            Some(block) => block_parity(&debiased, block),
            None => debiased.clone(),
        };

        let whitened = whiten(
            &decorrelated,
            self.config.output_bits,
            &ToeplitzParams::with_subset(self.config.toeplitz_subset),
        )?;

        debug!(
            raw_bits,
            debiased_bits = debiased.len(),
            decorrelated_bits = decorrelated.len(),
            method = %whitened.method,
            "extraction complete"
        );

        Ok(ExtractionOutput {
            bits: whitened.bits,
            raw_bits,
            debiased_bits: debiased.len(),
            decorrelated_bits: decorrelated.len(),
            method: whitened.method,
        })
    }
}
