//! Shared helpers for CLI commands.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use foam_adapter_sim::{SimulatorBackend, SimulatorConfig};
use foam_core::{Config, Edition};
use foam_hal::Backend;

/// Load the configuration and apply command-line overrides.
pub fn load_config(
    path: Option<&Path>,
    edition: Option<Edition>,
    bits: Option<usize>,
) -> Result<Config> {
    let mut config = Config::load(path).with_context(|| match path {
        Some(p) => format!("Failed to load configuration from {}", p.display()),
        None => "Failed to load configuration".to_string(),
    })?;

    if let Some(edition) = edition {
        config.generator.edition = edition;
    }
    if let Some(bits) = bits {
        config.generator.output_bits = bits;
    }
    config.validate()?;
    Ok(config)
}

/// Create the backend named by the configuration.
pub fn build_backend(config: &Config) -> Result<Arc<dyn Backend>> {
    match config.backend.kind.as_str() {
        "simulator" | "sim" => Ok(Arc::new(SimulatorBackend::with_config(SimulatorConfig {
            theta_deg: config.backend.theta_deg,
            latency: Duration::from_millis(config.backend.latency_ms),
            latency_jitter: Duration::from_millis(config.backend.latency_jitter_ms),
        }))),
        other => anyhow::bail!("Unknown backend: '{other}'. Available: simulator"),
    }
}
