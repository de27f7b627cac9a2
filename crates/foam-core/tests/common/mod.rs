//! Scripted backend shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::time::Instant;

use foam_core::{EngineConfig, ExecutionEngine, GeneratorConfig, KeyGenerator};
use foam_extract::PipelineConfig;
use foam_hal::{
    Backend, BackendAvailability, Basis, BasisSet, HalError, HalResult, Histogram, JobHandle,
    PollPolicy, PollStatus,
};

/// 50 shots with a +0.04 expectation value.
pub fn balanced_histogram() -> Histogram {
    Histogram::from_pairs([("00", 13), ("01", 12), ("10", 12), ("11", 13)])
}

/// Backend whose behaviour is fixed per basis label. The job handle is the
/// basis label.
pub struct MockBackend {
    histograms: FxHashMap<String, Histogram>,
    default_histogram: Histogram,
    submit_latency: FxHashMap<String, Duration>,
    ready_delay: FxHashMap<String, Duration>,
    ready_at: Mutex<FxHashMap<String, Instant>>,
    failing: FxHashSet<String>,
    stuck: FxHashSet<String>,
    panics: bool,
    submissions: AtomicUsize,
}

impl MockBackend {
    pub fn new(histogram: Histogram) -> Self {
        Self {
            histograms: FxHashMap::default(),
            default_histogram: histogram,
            submit_latency: FxHashMap::default(),
            ready_delay: FxHashMap::default(),
            ready_at: Mutex::new(FxHashMap::default()),
            failing: FxHashSet::default(),
            stuck: FxHashSet::default(),
            panics: false,
            submissions: AtomicUsize::new(0),
        }
    }

    pub fn with_histogram(mut self, label: &str, histogram: Histogram) -> Self {
        self.histograms.insert(label.to_string(), histogram);
        self
    }

    pub fn with_latency(mut self, label: &str, latency: Duration) -> Self {
        self.submit_latency.insert(label.to_string(), latency);
        self
    }

    /// Jobs for `label` report `Pending` until `delay` after submission.
    pub fn with_ready_delay(mut self, label: &str, delay: Duration) -> Self {
        self.ready_delay.insert(label.to_string(), delay);
        self
    }

    /// Submissions for `label` are rejected.
    pub fn failing(mut self, label: &str) -> Self {
        self.failing.insert(label.to_string());
        self
    }

    /// Jobs for `label` never leave `Pending`.
    pub fn stuck(mut self, label: &str) -> Self {
        self.stuck.insert(label.to_string());
        self
    }

    /// Every submission panics.
    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        Ok(BackendAvailability::always_available())
    }

    async fn submit(&self, basis: &Basis, _shots: u32) -> HalResult<JobHandle> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        if self.panics {
            panic!("mock backend crashed");
        }
        if let Some(latency) = self.submit_latency.get(basis.label()) {
            tokio::time::sleep(*latency).await;
        }
        if self.failing.contains(basis.label()) {
            return Err(HalError::SubmissionFailed(format!(
                "{} rejected",
                basis.label()
            )));
        }
        if let Some(delay) = self.ready_delay.get(basis.label()) {
            self.ready_at
                .lock()
                .unwrap()
                .insert(basis.label().to_string(), Instant::now() + *delay);
        }
        Ok(JobHandle::new(basis.label()))
    }

    async fn poll(&self, handle: &JobHandle) -> HalResult<PollStatus> {
        if self.stuck.contains(&handle.0) {
            return Ok(PollStatus::Pending);
        }
        let ready_at = self.ready_at.lock().unwrap().get(&handle.0).copied();
        if ready_at.is_some_and(|at| Instant::now() < at) {
            return Ok(PollStatus::Pending);
        }
        let histogram = self
            .histograms
            .get(&handle.0)
            .unwrap_or(&self.default_histogram);
        Ok(PollStatus::Ready(histogram.clone()))
    }
}

pub fn fast_poll() -> PollPolicy {
    PollPolicy::new(Duration::from_millis(10), 3)
}

pub fn engine(backend: Arc<dyn Backend>) -> ExecutionEngine {
    ExecutionEngine::new(
        backend,
        EngineConfig {
            max_workers: 9,
            poll: fast_poll(),
        },
    )
}

pub fn generator_config(output_bits: usize) -> GeneratorConfig {
    GeneratorConfig {
        bases: BasisSet::standard(),
        shots_per_basis: 50,
        pipeline: PipelineConfig::new(output_bits),
        device_label: "mock".to_string(),
        theta_deg: None,
        issue_certificate: false,
    }
}

pub fn generator(backend: Arc<dyn Backend>, output_bits: usize) -> KeyGenerator {
    KeyGenerator::new(engine(backend), generator_config(output_bits)).unwrap()
}
