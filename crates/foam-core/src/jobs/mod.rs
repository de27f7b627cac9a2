//! Asynchronous generation jobs.

mod job;
mod manager;
mod store;

pub use job::{Job, JobId, JobStatus};
pub use manager::JobManager;
pub use store::JobStore;
