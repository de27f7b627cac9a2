//! Quantum foam orchestration core
//!
//! Runs generation jobs end to end:
//!
//! ```text
//!   JobManager::create_job
//!     └─ background task
//!          └─ KeyGenerator::generate
//!               ├─ ExecutionEngine::submit_all   (fan-out, barrier)
//!               ├─ ExecutionEngine::collect_all  (fan-out, barrier)
//!               └─ ExtractionPipeline::run       (pure)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use foam_core::{Config, ExecutionEngine, JobManager, KeyGenerator};
//! use foam_adapter_sim::SimulatorBackend;
//!
//! let config = Config::load(None)?;
//! let engine = ExecutionEngine::new(Arc::new(SimulatorBackend::new()), config.engine_config());
//! let generator = KeyGenerator::new(engine, config.generator_config("simulator"))?;
//! let manager = JobManager::new(Arc::new(generator));
//!
//! let id = manager.create_job().await;
//! let job = manager.wait_for(&id, config.poll_policy()).await?;
//! println!("{:?}", job.result.map(|r| r.key_hex));
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod jobs;
pub mod telemetry;

pub use config::{Config, ConfigError, Edition};
pub use engine::{BasisError, BasisOutcome, EngineConfig, ExecutionEngine, SubmissionResult};
pub use error::{Error, Result};
pub use generator::{FailedBasis, GenerationResult, GeneratorConfig, KeyGenerator, Timings};
pub use jobs::{Job, JobId, JobManager, JobStatus, JobStore};
pub use telemetry::{LogFormat, LoggingConfig, init_tracing};
