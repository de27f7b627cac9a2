//! Quantum foam backend abstraction layer
//!
//! This crate defines the contract between the randomness service and the
//! quantum backends it samples: which measurement bases exist, how a job is
//! submitted and polled, and what an outcome histogram looks like.
//!
//! # Overview
//!
//! - A common [`Backend`] trait for job submission and polling
//! - [`Basis`] / [`BasisSet`] describing measurement configurations
//! - [`Histogram`] with tolerant [`OutcomeLabel`] parsing
//! - A bounded [`PollPolicy`] used by the provided [`Backend::wait`]
//!
//! # Implementing a Custom Backend
//!
//! ```ignore
//! use foam_hal::{
//!     Backend, BackendAvailability, Basis, HalResult, Histogram, JobHandle, PollStatus,
//! };
//! use async_trait::async_trait;
//!
//! struct FixedBackend;
//!
//! #[async_trait]
//! impl Backend for FixedBackend {
//!     fn name(&self) -> &str { "fixed" }
//!
//!     async fn availability(&self) -> HalResult<BackendAvailability> {
//!         Ok(BackendAvailability::always_available())
//!     }
//!
//!     async fn submit(&self, basis: &Basis, _shots: u32) -> HalResult<JobHandle> {
//!         Ok(JobHandle::new(basis.label()))
//!     }
//!
//!     async fn poll(&self, _handle: &JobHandle) -> HalResult<PollStatus> {
//!         Ok(PollStatus::Ready(Histogram::from_pairs([("00", 25), ("11", 25)])))
//!     }
//! }
//! ```

pub mod backend;
pub mod basis;
pub mod error;
pub mod histogram;
pub mod job;

pub use backend::{Backend, BackendAvailability};
pub use basis::{Basis, BasisSet, BasisSpec, BellFamily, PauliAxis};
pub use error::{HalError, HalResult};
pub use histogram::{Histogram, OutcomeLabel};
pub use job::{JobHandle, PollPolicy, PollStatus};
