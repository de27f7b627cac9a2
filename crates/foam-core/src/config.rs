//! Configuration management for the randomness service.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with FOAM_ prefix)
//! 3. .env files
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use foam_extract::PipelineConfig;
use foam_hal::{BasisSet, PollPolicy};

use crate::engine::EngineConfig;
use crate::generator::GeneratorConfig;
use crate::telemetry::{LogFormat, LoggingConfig};

/// Basis-set profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    /// Nine two-qubit Pauli bases.
    #[default]
    Standard,
    /// 75 bases including rotated and Bell-diagonal families.
    Extended,
}

impl Edition {
    /// The bases sampled by this edition.
    pub fn basis_set(self) -> BasisSet {
        match self {
            Edition::Standard => BasisSet::standard(),
            Edition::Extended => BasisSet::extended(),
        }
    }

    /// Default Toeplitz subset size.
    pub fn toeplitz_subset(self) -> usize {
        match self {
            Edition::Standard => 32,
            Edition::Extended => 64,
        }
    }
}

impl std::str::FromStr for Edition {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Edition::Standard),
            "extended" => Ok(Edition::Extended),
            other => Err(ConfigError::ValidationError(format!(
                "Unknown edition: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for Edition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Edition::Standard => write!(f, "standard"),
            Edition::Extended => write!(f, "extended"),
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Key generation settings
    #[serde(default)]
    pub generator: GeneratorSettings,

    /// Fan-out and polling settings
    #[serde(default)]
    pub engine: EngineSettings,

    /// Backend selection
    #[serde(default)]
    pub backend: BackendSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Key generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Basis-set profile: "standard" or "extended"
    #[serde(default)]
    pub edition: Edition,

    /// Key length in bits (positive multiple of 4)
    #[serde(default = "default_output_bits")]
    pub output_bits: usize,

    /// Shots per basis; derived from the edition when absent
    #[serde(default)]
    pub shots_per_basis: Option<u32>,

    /// Block size of the optional parity stage
    #[serde(default)]
    pub decorrelation_block: Option<usize>,

    /// Toeplitz subset size; derived from the edition when absent
    #[serde(default)]
    pub toeplitz_subset: Option<usize>,

    /// Attach a generation certificate to each result
    #[serde(default)]
    pub issue_certificate: bool,
}

/// Fan-out and polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Concurrent backend calls per phase; defaults to the basis count
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// Delay between result polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Result polls per basis before timing out
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
}

/// Backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Backend type: "simulator"
    #[serde(default = "default_backend_kind")]
    pub kind: String,

    /// Entangled-pair preparation angle in degrees
    #[serde(default = "default_theta_deg")]
    pub theta_deg: f64,

    /// Simulated submission-to-result latency in milliseconds
    #[serde(default)]
    pub latency_ms: u64,

    /// Upper bound of extra random latency in milliseconds
    #[serde(default)]
    pub latency_jitter_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter directive: a bare level ("info") or per-target levels
    /// ("warn,foam_core=debug")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "console" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_output_bits() -> usize {
    256
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_poll_attempts() -> u32 {
    60
}

fn default_backend_kind() -> String {
    "simulator".to_string()
}

fn default_theta_deg() -> f64 {
    45.0
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            edition: Edition::default(),
            output_bits: default_output_bits(),
            shots_per_basis: None,
            decorrelation_block: None,
            toeplitz_subset: None,
            issue_certificate: false,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_workers: None,
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            kind: default_backend_kind(),
            theta_deg: default_theta_deg(),
            latency_ms: 0,
            latency_jitter_ms: 0,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: Config = serde_yaml_ng::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Load .env file if it exists
    /// 2. Load from file if provided
    /// 3. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };

        let config = config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Merge `FOAM_*` environment variables into this configuration.
    pub fn merge_env(self) -> Result<Self, ConfigError> {
        self.merge_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    ///
    /// Only keys that resolve override the current values. A value that does
    /// not parse is an error rather than being silently ignored.
    pub fn merge_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
            value.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("Invalid value for {key}: {value}"))
            })
        }

        // Generator
        if let Some(v) = lookup("FOAM_EDITION") {
            self.generator.edition = v.parse()?;
        }
        if let Some(v) = lookup("FOAM_OUTPUT_BITS") {
            self.generator.output_bits = parsed("FOAM_OUTPUT_BITS", v)?;
        }
        if let Some(v) = lookup("FOAM_SHOTS_PER_BASIS") {
            self.generator.shots_per_basis = Some(parsed("FOAM_SHOTS_PER_BASIS", v)?);
        }

        // Engine
        if let Some(v) = lookup("FOAM_MAX_WORKERS") {
            self.engine.max_workers = Some(parsed("FOAM_MAX_WORKERS", v)?);
        }
        if let Some(v) = lookup("FOAM_POLL_INTERVAL_MS") {
            self.engine.poll_interval_ms = parsed("FOAM_POLL_INTERVAL_MS", v)?;
        }
        if let Some(v) = lookup("FOAM_MAX_POLL_ATTEMPTS") {
            self.engine.max_poll_attempts = parsed("FOAM_MAX_POLL_ATTEMPTS", v)?;
        }

        // Backend
        if let Some(v) = lookup("FOAM_BACKEND_LATENCY_MS") {
            self.backend.latency_ms = parsed("FOAM_BACKEND_LATENCY_MS", v)?;
        }

        // Logging
        if let Some(v) = lookup("FOAM_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = lookup("FOAM_LOG_FORMAT") {
            self.logging.format = v;
        }

        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate key length
        let bits = self.generator.output_bits;
        if bits == 0 || bits % 4 != 0 {
            return Err(ConfigError::ValidationError(format!(
                "output_bits must be a positive multiple of 4, got {bits}"
            )));
        }

        if self.generator.shots_per_basis == Some(0) {
            return Err(ConfigError::ValidationError(
                "shots_per_basis must be greater than 0".to_string(),
            ));
        }
        if self.generator.toeplitz_subset == Some(0) {
            return Err(ConfigError::ValidationError(
                "toeplitz_subset must be greater than 0".to_string(),
            ));
        }
        if self.generator.decorrelation_block == Some(0) {
            return Err(ConfigError::ValidationError(
                "decorrelation_block must be greater than 0".to_string(),
            ));
        }

        // Validate engine limits
        if self.engine.max_workers == Some(0) {
            return Err(ConfigError::ValidationError(
                "max_workers must be greater than 0".to_string(),
            ));
        }
        if self.engine.max_poll_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "max_poll_attempts must be greater than 0".to_string(),
            ));
        }

        // Validate backend
        match self.backend.kind.as_str() {
            "simulator" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Unknown backend kind: {other}"
                )));
            }
        }

        // Validate log filter
        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level {:?}: {e}",
                self.logging.level
            )));
        }

        // Validate log format
        self.logging.format.parse::<LogFormat>()?;

        Ok(())
    }

    /// Shots per basis: the configured value, or the edition default.
    ///
    /// The extended edition spreads the bits over its bases, with a floor of
    /// 20 shots.
    pub fn shots_per_basis(&self) -> u32 {
        if let Some(shots) = self.generator.shots_per_basis {
            return shots;
        }
        match self.generator.edition {
            Edition::Standard => 50,
            Edition::Extended => {
                let bases = self.generator.edition.basis_set().len().max(1);
                let per_basis = self.generator.output_bits.div_ceil(2 * bases);
                u32::try_from(per_basis).unwrap_or(u32::MAX).max(20)
            }
        }
    }

    /// Extraction pipeline settings.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            output_bits: self.generator.output_bits,
            decorrelation_block: self.generator.decorrelation_block,
            toeplitz_subset: self
                .generator
                .toeplitz_subset
                .unwrap_or_else(|| self.generator.edition.toeplitz_subset()),
        }
    }

    /// Retry budget for each result poll.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(
            Duration::from_millis(self.engine.poll_interval_ms),
            self.engine.max_poll_attempts,
        )
    }

    /// Engine settings; workers default to one per basis.
    pub fn engine_config(&self) -> EngineConfig {
        let bases = self.generator.edition.basis_set();
        EngineConfig {
            max_workers: self.engine.max_workers.unwrap_or(bases.len()),
            poll: self.poll_policy(),
        }
    }

    /// Generator settings for a run against `device_label`.
    pub fn generator_config(&self, device_label: impl Into<String>) -> GeneratorConfig {
        GeneratorConfig {
            bases: self.generator.edition.basis_set(),
            shots_per_basis: self.shots_per_basis(),
            pipeline: self.pipeline_config(),
            device_label: device_label.into(),
            theta_deg: Some(self.backend.theta_deg),
            issue_certificate: self.generator.issue_certificate,
        }
    }

    /// Logging settings for [`init_tracing`](crate::telemetry::init_tracing).
    pub fn logging_config(&self) -> Result<LoggingConfig, ConfigError> {
        Ok(LoggingConfig {
            level: self.logging.level.clone(),
            format: self.logging.format.parse()?,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
