//! Backend job handles and polling types.
//!
//! A backend job moves through a much smaller lifecycle than a service job:
//!
//! ```text
//!   submit() ──→ Pending ──→ Ready(histogram)
//!                   │
//!                   └──→ error (HalError)
//! ```
//!
//! "Not ready yet" is a value ([`PollStatus::Pending`]), never an error, so a
//! caller can tell a slow backend apart from a broken one without inspecting
//! error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::histogram::Histogram;

/// Opaque identifier returned by [`Backend::submit`](crate::Backend::submit).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle(pub String);

impl JobHandle {
    /// Create a new job handle.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobHandle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobHandle {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Answer to a single poll of a backend job.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus {
    /// The outcome histogram is available.
    Ready(Histogram),
    /// The job is still queued or running.
    Pending,
}

/// Bounded retry budget for waiting on a backend job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Delay between two consecutive polls.
    pub interval: Duration,
    /// Maximum number of polls before giving up.
    pub max_attempts: u32,
}

impl PollPolicy {
    /// Create a policy from an interval and an attempt cap.
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Upper bound on the time spent sleeping between polls.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

impl Default for PollPolicy {
    /// One poll per second for up to a minute.
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 60)
    }
}
