//! In-memory job table.
//!
//! Uses `Arc<RwLock<FxHashMap>>`; cloning the store clones the handle, not
//! the table. Every mutation runs under the write lock and reads return a
//! cloned snapshot, so no caller observes a half-applied transition. Jobs
//! live as long as the store.

use std::sync::Arc;

use chrono::Utc;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use super::job::{Job, JobId, JobStatus};
use crate::error::{Error, Result};
use crate::generator::GenerationResult;

/// Thread-safe job table.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<FxHashMap<JobId, Job>>>,
}

impl JobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new pending job under a fresh id.
    pub async fn insert_pending(&self) -> JobId {
        let mut jobs = self.jobs.write().await;
        let mut id = JobId::generate();
        while jobs.contains_key(&id) {
            id = JobId::generate();
        }
        jobs.insert(id.clone(), Job::pending(id.clone()));
        id
    }

    /// `Pending → Processing`.
    pub async fn mark_processing(&self, id: &JobId) -> Result<()> {
        self.transition(id, JobStatus::Processing, |_| {}).await
    }

    /// `Processing → Completed`, attaching the result.
    pub async fn complete(&self, id: &JobId, result: GenerationResult) -> Result<()> {
        self.transition(id, JobStatus::Completed, |job| job.result = Some(result))
            .await
    }

    /// `Processing → Failed`, attaching the message.
    pub async fn fail(&self, id: &JobId, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        self.transition(id, JobStatus::Failed, |job| job.error = Some(message))
            .await
    }

    async fn transition<F>(&self, id: &JobId, next: JobStatus, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| Error::JobNotFound(id.0.clone()))?;

        if !job.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: job.status,
                to: next,
            });
        }

        apply(job);
        job.status = next;
        job.updated_at = Utc::now();
        Ok(())
    }

    /// Snapshot of a job.
    pub async fn get(&self, id: &JobId) -> Result<Job> {
        self.jobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::JobNotFound(id.0.clone()))
    }

    /// Number of jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Check if the store holds no jobs.
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_job_lifecycle() {
        let store = JobStore::new();
        let id = store.insert_pending().await;

        let job = store.get(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.created_at, job.updated_at);

        store.mark_processing(&id).await.unwrap();
        store.fail(&id, "boom").await.unwrap();

        let job = store.get(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("boom"));
        assert!(job.result.is_none());
        assert!(job.updated_at >= job.created_at);
    }

    #[tokio::test]
    async fn test_illegal_transitions_rejected() {
        let store = JobStore::new();
        let id = store.insert_pending().await;

        assert!(matches!(
            store.fail(&id, "too early").await,
            Err(Error::InvalidTransition {
                from: JobStatus::Pending,
                to: JobStatus::Failed
            })
        ));

        store.mark_processing(&id).await.unwrap();
        store.fail(&id, "boom").await.unwrap();
        assert!(store.mark_processing(&id).await.is_err());
        assert!(store.fail(&id, "again").await.is_err());

        // A rejected transition leaves the record untouched.
        assert_eq!(store.get(&id).await.unwrap().error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_job_not_found() {
        let store = JobStore::new();
        let missing = JobId::from("nonexistent");
        assert!(matches!(store.get(&missing).await, Err(Error::JobNotFound(_))));
        assert!(matches!(
            store.mark_processing(&missing).await,
            Err(Error::JobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_len() {
        let store = JobStore::new();
        assert!(store.is_empty().await);
        for _ in 0..3 {
            store.insert_pending().await;
        }
        assert_eq!(store.len().await, 3);
    }
}
