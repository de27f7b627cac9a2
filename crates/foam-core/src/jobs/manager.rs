//! Job lifecycle manager.
//!
//! `create_job` records a pending job and hands the run to a background task
//! tracked in a `JoinSet`; callers poll `get_job` for progress. The run body
//! sits behind an error and panic boundary, so once the task returns the job
//! is always `Completed` or `Failed`.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::FutureExt;
use tokio::task::JoinSet;
use tracing::{error, info, instrument};

use foam_hal::PollPolicy;

use super::job::{Job, JobId};
use super::store::JobStore;
use crate::error::{Error, Result};
use crate::generator::KeyGenerator;

/// State shared with background tasks.
#[derive(Clone)]
struct Runner {
    store: JobStore,
    generator: Arc<KeyGenerator>,
}

impl Runner {
    async fn run_job(&self, id: &JobId) -> Result<()> {
        self.store.mark_processing(id).await?;
        info!(job_id = %id, "job processing");
        let started = Instant::now();

        let outcome = AssertUnwindSafe(self.generator.generate())
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => {
                info!(
                    job_id = %id,
                    duration_ms = started.elapsed().as_millis() as u64,
                    whitening = %result.whitening,
                    foam_strength = result.foam_strength,
                    "job completed"
                );
                self.store.complete(id, result).await
            }
            Ok(Err(e)) => {
                error!(job_id = %id, error = %e, "job failed");
                self.store.fail(id, e.to_string()).await
            }
            Err(panic) => {
                let e = Error::Internal(format!("generation panicked: {}", panic_message(&*panic)));
                error!(job_id = %id, error = %e, "job failed");
                self.store.fail(id, e.to_string()).await
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Owns the job table and the background runs.
pub struct JobManager {
    runner: Runner,
    tasks: Mutex<JoinSet<()>>,
}

impl JobManager {
    /// Create a manager with an empty job table.
    pub fn new(generator: Arc<KeyGenerator>) -> Self {
        Self::with_store(generator, JobStore::new())
    }

    /// Create a manager over an existing store.
    pub fn with_store(generator: Arc<KeyGenerator>, store: JobStore) -> Self {
        Self {
            runner: Runner { store, generator },
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// The job table.
    pub fn store(&self) -> &JobStore {
        &self.runner.store
    }

    /// Record a pending job and start its run in the background.
    ///
    /// Returns without waiting for the run. Must be called within a Tokio
    /// runtime.
    pub async fn create_job(&self) -> JobId {
        let id = self.runner.store.insert_pending().await;
        info!(job_id = %id, "job created");

        let runner = self.runner.clone();
        let task_id = id.clone();
        let mut tasks = self
            .tasks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        reap_finished(&mut tasks);
        tasks.spawn(async move {
            if let Err(e) = runner.run_job(&task_id).await {
                error!(job_id = %task_id, error = %e, "job bookkeeping failed");
            }
        });

        id
    }

    /// Run a pending job to completion on the current task.
    ///
    /// Errors only when the job is unknown or not pending; generation
    /// failures are recorded on the job instead.
    #[instrument(skip(self, id), fields(job_id = %id))]
    pub async fn run_job(&self, id: &JobId) -> Result<()> {
        self.runner.run_job(id).await
    }

    /// Snapshot of a job.
    pub async fn get_job(&self, id: &JobId) -> Result<Job> {
        self.runner.store.get(id).await
    }

    /// Poll a job until it is terminal or the budget runs out.
    ///
    /// Returns the latest snapshot, which is still non-terminal if the
    /// budget ran out.
    pub async fn wait_for(&self, id: &JobId, policy: PollPolicy) -> Result<Job> {
        let attempts = policy.max_attempts.max(1);
        let mut job = self.get_job(id).await?;
        for _ in 1..attempts {
            if job.status.is_terminal() {
                break;
            }
            tokio::time::sleep(policy.interval).await;
            job = self.get_job(id).await?;
        }
        Ok(job)
    }

    /// Number of background runs not yet reaped.
    pub fn active_tasks(&self) -> usize {
        let mut tasks = self
            .tasks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        reap_finished(&mut tasks);
        tasks.len()
    }

    /// Wait for every background run to finish.
    pub async fn shutdown(&self) {
        let mut tasks = std::mem::take(
            &mut *self
                .tasks
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        );
        info!(pending = tasks.len(), "waiting for background jobs");
        while let Some(finished) = tasks.join_next().await {
            log_task_exit(finished);
        }
    }
}

fn reap_finished(tasks: &mut JoinSet<()>) {
    while let Some(finished) = tasks.try_join_next() {
        log_task_exit(finished);
    }
}

fn log_task_exit(finished: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = finished {
        if e.is_panic() {
            error!(error = %e, "background job task panicked");
        }
    }
}
