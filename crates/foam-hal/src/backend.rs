//! Backend trait.
//!
//! The [`Backend`] trait defines the lifecycle of one sampling job:
//!
//! ```text
//!   submit(basis, shots) ──→ poll() ──→ ... ──→ poll() = Ready(histogram)
//!        (async)              (async)
//! ```
//!
//! | Method | Kind | Required | Returns |
//! |--------|------|----------|---------|
//! | `name()` | sync | yes | `&str` |
//! | `availability()` | async | yes | `HalResult<BackendAvailability>` |
//! | `submit()` | async | yes | `HalResult<JobHandle>` |
//! | `poll()` | async | yes | `HalResult<PollStatus>` |
//! | `wait()` | async | provided | `HalResult<Histogram>` |
//!
//! Adapters only implement the first four; `wait()` turns them into a
//! bounded retry loop driven by a [`PollPolicy`].

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::basis::Basis;
use crate::error::{HalError, HalResult};
use crate::histogram::Histogram;
use crate::job::{JobHandle, PollPolicy, PollStatus};

/// Trait for sampling backends.
///
/// # Contract
///
/// - `submit()` MUST reject `shots == 0` with [`HalError::InvalidShots`].
/// - `poll()` MUST return [`PollStatus::Pending`] rather than an error while
///   the job is still running.
/// - Implementations MUST be safe to call from many tasks concurrently.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Check backend availability.
    async fn availability(&self) -> HalResult<BackendAvailability>;

    /// Submit one sampling job for `basis` with `shots` repetitions.
    async fn submit(&self, basis: &Basis, shots: u32) -> HalResult<JobHandle>;

    /// Ask once whether the job has finished.
    async fn poll(&self, handle: &JobHandle) -> HalResult<PollStatus>;

    /// Wait for a job to finish and return its histogram.
    ///
    /// Polls up to `policy.max_attempts` times, sleeping `policy.interval`
    /// between polls. A poll error is retried while attempts remain; the
    /// error of the last attempt is returned as-is. Exhausting the budget on
    /// `Pending` answers yields [`HalError::Timeout`].
    async fn wait(&self, handle: &JobHandle, policy: &PollPolicy) -> HalResult<Histogram> {
        let max_attempts = policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.poll(handle).await {
                Ok(PollStatus::Ready(histogram)) => {
                    debug!(backend = self.name(), %handle, attempt, "job ready");
                    return Ok(histogram);
                }
                Ok(PollStatus::Pending) => {}
                Err(e) if attempt < max_attempts => {
                    warn!(
                        backend = self.name(),
                        %handle,
                        attempt,
                        error = %e,
                        "poll failed, retrying"
                    );
                }
                Err(e) => return Err(e),
            }

            if attempt < max_attempts {
                tokio::time::sleep(policy.interval).await;
            }
        }

        Err(HalError::Timeout {
            handle: handle.0.clone(),
            attempts: max_attempts,
        })
    }
}

/// Backend availability information.
#[derive(Debug, Clone)]
pub struct BackendAvailability {
    /// Whether the backend is currently accepting jobs.
    pub is_available: bool,
    /// Number of jobs currently in flight (if known).
    pub queue_depth: Option<u32>,
    /// Estimated time until a new job is ready (if known).
    pub estimated_wait: Option<Duration>,
    /// Human-readable status message.
    pub status_message: Option<String>,
}

impl BackendAvailability {
    /// Availability of a backend with no queue.
    ///
    /// Typical for simulators.
    pub fn always_available() -> Self {
        Self {
            is_available: true,
            queue_depth: Some(0),
            estimated_wait: Some(Duration::ZERO),
            status_message: None,
        }
    }
}
