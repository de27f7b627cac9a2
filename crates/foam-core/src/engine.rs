//! Parallel execution engine.
//!
//! Runs the two fan-out/fan-in phases of a generation run over a basis set:
//!
//! ```text
//!   submit_all ──(barrier)──→ collect_all ──(barrier)──→ outcomes
//! ```
//!
//! Each phase starts one future per basis, bounded by a semaphore, and waits
//! for all of them with `join_all`. A failing basis yields a failed entry and
//! never cancels its siblings, so the phase costs as much as its slowest
//! basis rather than the sum.

use std::sync::Arc;

use futures::future::join_all;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use foam_extract::extract_basis;
use foam_hal::{Backend, Basis, BasisSet, HalError, JobHandle, PollPolicy};

/// Why a single basis dropped out of a run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum BasisError {
    #[error("submission failed: {0}")]
    Submission(String),

    #[error("result not ready after {attempts} attempts")]
    CollectionTimeout { attempts: u32 },

    #[error("collection failed: {0}")]
    Collection(String),

    /// The histogram was empty or held an unknown outcome.
    #[error("extraction failed: {0}")]
    Extraction(String),
}

impl From<HalError> for BasisError {
    fn from(err: HalError) -> Self {
        match err {
            HalError::Timeout { attempts, .. } => BasisError::CollectionTimeout { attempts },
            other => BasisError::Collection(other.to_string()),
        }
    }
}

/// Outcome of submitting one basis.
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub basis: Basis,
    pub outcome: Result<JobHandle, BasisError>,
}

/// Bits and statistic collected for one basis.
#[derive(Debug, Clone)]
pub struct BasisOutcome {
    pub basis: Basis,
    /// Within-basis shuffled bits; empty on failure.
    pub bits: Vec<u8>,
    pub expectation_value: f64,
    pub error: Option<BasisError>,
}

impl BasisOutcome {
    fn failed(basis: Basis, error: BasisError) -> Self {
        Self {
            basis,
            bits: Vec::new(),
            expectation_value: 0.0,
            error: Some(error),
        }
    }

    /// Check if this basis contributes to the pool.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum concurrent backend calls per phase.
    pub max_workers: usize,
    /// Retry budget for each result poll.
    pub poll: PollPolicy,
}

impl EngineConfig {
    /// Settings with one worker per basis.
    pub fn for_bases(bases: &BasisSet) -> Self {
        Self {
            max_workers: bases.len().max(1),
            poll: PollPolicy::default(),
        }
    }
}

/// Fans backend calls out across a basis set.
pub struct ExecutionEngine {
    backend: Arc<dyn Backend>,
    config: EngineConfig,
}

impl ExecutionEngine {
    /// Create an engine over `backend`.
    pub fn new(backend: Arc<dyn Backend>, config: EngineConfig) -> Self {
        Self { backend, config }
    }

    /// The backend jobs are sent to.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// The engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn semaphore(&self) -> Semaphore {
        Semaphore::new(self.config.max_workers.max(1))
    }

    /// Submit one job per basis. Returns once every submission has settled,
    /// in basis-set order.
    #[instrument(skip(self, bases), fields(bases = bases.len(), backend = self.backend.name()))]
    pub async fn submit_all(&self, bases: &BasisSet, shots: u32) -> Vec<SubmissionResult> {
        let limit = self.semaphore();

        let tasks = bases.iter().map(|basis| {
            let limit = &limit;
            async move {
                let outcome = match limit.acquire().await {
                    Ok(_permit) => self
                        .backend
                        .submit(basis, shots)
                        .await
                        .map_err(|e| BasisError::Submission(e.to_string())),
                    Err(e) => Err(BasisError::Submission(e.to_string())),
                };

                match &outcome {
                    Ok(handle) => debug!(basis = %basis, %handle, "submitted"),
                    Err(e) => warn!(basis = %basis, error = %e, "submission failed"),
                }

                SubmissionResult {
                    basis: basis.clone(),
                    outcome,
                }
            }
        });

        join_all(tasks).await
    }

    /// Wait for every successful submission and extract its bits. Failed
    /// submissions are carried through as failed outcomes.
    #[instrument(skip(self, submissions), fields(submissions = submissions.len()))]
    pub async fn collect_all(&self, submissions: Vec<SubmissionResult>) -> Vec<BasisOutcome> {
        let limit = self.semaphore();

        let tasks = submissions.into_iter().map(|submission| {
            let limit = &limit;
            async move {
                let SubmissionResult { basis, outcome } = submission;
                let handle = match outcome {
                    Ok(handle) => handle,
                    Err(e) => return BasisOutcome::failed(basis, e),
                };

                let histogram = match limit.acquire().await {
                    Ok(_permit) => self.backend.wait(&handle, &self.config.poll).await,
                    Err(e) => Err(HalError::Backend(e.to_string())),
                };

                let outcome = match histogram {
                    Ok(histogram) => match extract_basis(&histogram) {
                        Ok(sample) => {
                            let mut bits = sample.bits;
                            bits.shuffle(&mut rand::thread_rng());
                            BasisOutcome {
                                basis,
                                bits,
                                expectation_value: sample.expectation_value,
                                error: None,
                            }
                        }
                        Err(e) => BasisOutcome::failed(basis, BasisError::Extraction(e.to_string())),
                    },
                    Err(e) => BasisOutcome::failed(basis, e.into()),
                };

                match &outcome.error {
                    None => debug!(
                        basis = %outcome.basis,
                        bits = outcome.bits.len(),
                        expectation = outcome.expectation_value,
                        "collected"
                    ),
                    Some(e) => warn!(basis = %outcome.basis, error = %e, "collection failed"),
                }
                outcome
            }
        });

        join_all(tasks).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hal_error_mapping() {
        let timeout = HalError::Timeout {
            handle: "j".into(),
            attempts: 60,
        };
        assert_eq!(
            BasisError::from(timeout),
            BasisError::CollectionTimeout { attempts: 60 }
        );
        assert!(matches!(
            BasisError::from(HalError::JobFailed("x".into())),
            BasisError::Collection(_)
        ));
    }

    #[test]
    fn test_engine_config_for_bases() {
        assert_eq!(EngineConfig::for_bases(&BasisSet::standard()).max_workers, 9);
        assert_eq!(EngineConfig::for_bases(&BasisSet::new(vec![])).max_workers, 1);
    }

    #[test]
    fn test_basis_error_json() {
        let json = serde_json::to_string(&BasisError::CollectionTimeout { attempts: 3 }).unwrap();
        assert_eq!(json, r#"{"kind":"collection_timeout","detail":{"attempts":3}}"#);
    }
}
