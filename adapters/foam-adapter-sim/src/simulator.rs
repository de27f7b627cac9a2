//! Simulator backend implementation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, instrument};
use uuid::Uuid;

use foam_hal::{
    Backend, BackendAvailability, Basis, HalError, HalResult, Histogram, JobHandle, PollStatus,
};

use crate::circuit::{simulate, source_circuit};

/// Simulator settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Preparation angle of the entangled pair, in degrees.
    pub theta_deg: f64,
    /// Time from submission until the result becomes ready.
    pub latency: Duration,
    /// Upper bound of a uniform random delay added to `latency`.
    pub latency_jitter: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            theta_deg: 45.0,
            latency: Duration::ZERO,
            latency_jitter: Duration::ZERO,
        }
    }
}

/// A submitted job. The histogram is sampled at submission and held back
/// until `ready_at`.
struct SimJob {
    histogram: Histogram,
    ready_at: Instant,
}

/// Local simulator backend.
///
/// Samples the source circuit of each basis on an exact two-qubit
/// statevector. Latency is simulated, so a slow remote device can be
/// emulated without blocking any thread.
pub struct SimulatorBackend {
    config: SimulatorConfig,
    jobs: Arc<Mutex<FxHashMap<String, SimJob>>>,
}

impl SimulatorBackend {
    /// Create a simulator with default settings and no latency.
    pub fn new() -> Self {
        Self::with_config(SimulatorConfig::default())
    }

    /// Create a simulator with custom settings.
    pub fn with_config(config: SimulatorConfig) -> Self {
        Self {
            config,
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    /// The simulator settings.
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    #[instrument(skip(self, basis), fields(basis = %basis))]
    fn run_simulation(&self, basis: &Basis, shots: u32) -> Histogram {
        let gates = source_circuit(self.config.theta_deg.to_radians(), basis.spec());
        let counts = simulate(&gates).sample_counts(shots, &mut rand::thread_rng());
        debug!(gates = gates.len(), shots, "simulation completed");

        counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(outcome, count)| (format!("{outcome:02b}"), *count))
            .collect()
    }

    fn delay(&self) -> Duration {
        let jitter = self.config.latency_jitter.as_millis() as u64;
        let extra = if jitter > 0 {
            rand::thread_rng().gen_range(0..=jitter)
        } else {
            0
        };
        self.config.latency + Duration::from_millis(extra)
    }
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        "simulator"
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        let in_flight = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .values()
            .filter(|job| job.ready_at > Instant::now())
            .count();
        Ok(BackendAvailability {
            queue_depth: Some(in_flight as u32),
            estimated_wait: Some(self.config.latency),
            ..BackendAvailability::always_available()
        })
    }

    #[instrument(skip(self, basis), fields(basis = %basis))]
    async fn submit(&self, basis: &Basis, shots: u32) -> HalResult<JobHandle> {
        if shots == 0 {
            return Err(HalError::InvalidShots("shots must be positive".into()));
        }

        let handle = JobHandle::new(Uuid::new_v4().to_string());
        let job = SimJob {
            histogram: self.run_simulation(basis, shots),
            ready_at: Instant::now() + self.delay(),
        };

        self.jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(handle.0.clone(), job);

        debug!(%handle, "submitted job");
        Ok(handle)
    }

    async fn poll(&self, handle: &JobHandle) -> HalResult<PollStatus> {
        let jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let job = jobs
            .get(&handle.0)
            .ok_or_else(|| HalError::JobNotFound(handle.0.clone()))?;

        if Instant::now() >= job.ready_at {
            Ok(PollStatus::Ready(job.histogram.clone()))
        } else {
            Ok(PollStatus::Pending)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foam_hal::{OutcomeLabel, PollPolicy};

    #[tokio::test]
    async fn test_zz_histogram() {
        let backend = SimulatorBackend::new();
        let basis = Basis::parse("ZZ").unwrap();

        let handle = backend.submit(&basis, 1000).await.unwrap();
        let PollStatus::Ready(histogram) = backend.poll(&handle).await.unwrap() else {
            panic!("zero-latency job should be ready");
        };

        assert_eq!(histogram.total(), 1000);
        assert_eq!(histogram.get(&OutcomeLabel::from_key("01")), 0);
        assert_eq!(histogram.get(&OutcomeLabel::from_key("10")), 0);
    }

    #[tokio::test]
    async fn test_zero_shots_rejected() {
        let backend = SimulatorBackend::new();
        let basis = Basis::parse("XX").unwrap();
        assert!(matches!(
            backend.submit(&basis, 0).await,
            Err(HalError::InvalidShots(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_handle() {
        let backend = SimulatorBackend::new();
        assert!(matches!(
            backend.poll(&JobHandle::new("missing")).await,
            Err(HalError::JobNotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_holds_result_back() {
        let backend = SimulatorBackend::with_config(SimulatorConfig {
            latency: Duration::from_secs(3),
            ..SimulatorConfig::default()
        });
        let basis = Basis::parse("YX").unwrap();
        let handle = backend.submit(&basis, 50).await.unwrap();

        assert_eq!(backend.poll(&handle).await.unwrap(), PollStatus::Pending);
        assert_eq!(
            backend.availability().await.unwrap().queue_depth,
            Some(1)
        );

        let histogram = backend
            .wait(&handle, &PollPolicy::new(Duration::from_secs(1), 10))
            .await
            .unwrap();
        assert_eq!(histogram.total(), 50);
    }
}
