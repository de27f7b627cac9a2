//! Quantum foam command-line interface
//!
//! Generates random keys by sampling an entangled pair across many
//! measurement bases and distilling the outcomes.
//!
//! ```text
//!   foam generate            256-bit key from the standard basis set
//!   foam generate --json     full result as JSON
//!   foam generate --int 1..6 a die roll drawn from the key
//!   foam bases               list the sampled bases
//!   foam verify cert.json    check a generation certificate
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;

use foam_core::{Config, Edition, LoggingConfig, init_tracing};
use foam_extract::IntRange;

mod commands;

use commands::{bases, common, generate, verify, version};

/// Foam - quantum randomness from many-basis sampling
#[derive(Parser)]
#[command(name = "foam")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a random key
    Generate {
        /// Configuration file (YAML)
        #[arg(short, long, env = "FOAM_CONFIG")]
        config: Option<PathBuf>,

        /// Basis-set edition (standard, extended)
        #[arg(short, long)]
        edition: Option<Edition>,

        /// Key length in bits
        #[arg(short, long)]
        bits: Option<usize>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        /// Write a generation certificate to this file
        #[arg(long)]
        certificate: Option<PathBuf>,

        /// Also draw an integer from the key, inclusive on both ends
        #[arg(long = "int", value_name = "MIN..MAX")]
        int_range: Option<IntRange>,

        /// Also draw a float in [0, 1) from the key
        #[arg(long)]
        float: bool,
    },

    /// List the measurement bases of an edition
    Bases {
        /// Basis-set edition (standard, extended)
        #[arg(short, long, default_value = "standard")]
        edition: Edition,
    },

    /// Verify a generation certificate
    Verify {
        /// Certificate file (JSON)
        file: PathBuf,

        /// Minimum accepted foam strength
        #[arg(long, default_value_t = foam_extract::certificate::DEFAULT_MIN_FOAM_STRENGTH)]
        min_foam_strength: f64,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Handle errors
    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            config,
            edition,
            bits,
            json,
            certificate,
            int_range,
            float,
        } => {
            // Loaded before logging starts so its filter and format apply.
            let config = common::load_config(config.as_deref(), edition, bits)?;
            setup_logging(logging_config(cli.verbose, Some(&config))?);
            generate::execute(config, json, certificate.as_deref(), int_range, float).await
        }

        Commands::Bases { edition } => {
            setup_logging(logging_config(cli.verbose, None)?);
            bases::execute(edition);
            Ok(())
        }

        Commands::Verify {
            file,
            min_foam_strength,
        } => {
            setup_logging(logging_config(cli.verbose, None)?);
            verify::execute(&file, min_foam_strength)
        }

        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

/// Logging settings: the configuration's when there is one, with `-v`
/// raising the level over it.
fn logging_config(verbose: u8, config: Option<&Config>) -> anyhow::Result<LoggingConfig> {
    let mut logging = match config {
        Some(config) => config.logging_config()?,
        None => LoggingConfig {
            level: "warn".to_string(),
            ..LoggingConfig::from_env()
        },
    };
    let filter = match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    };
    if let Some(filter) = filter {
        logging.level = filter.to_string();
    }
    Ok(logging)
}

fn setup_logging(logging: LoggingConfig) {
    if let Err(e) = init_tracing(logging) {
        eprintln!("{} {}", style("Warning:").yellow().bold(), e);
    }
}

#[cfg(test)]
mod tests {
    use foam_core::LogFormat;

    use super::*;

    #[test]
    fn test_logging_follows_config() {
        let mut config = Config::default();
        config.logging.level = "warn,foam_core=debug".to_string();
        config.logging.format = "json".to_string();

        let logging = logging_config(0, Some(&config)).unwrap();
        assert_eq!(logging.level, "warn,foam_core=debug");
        assert_eq!(logging.format, LogFormat::Json);
    }

    #[test]
    fn test_verbose_overrides_config_level() {
        let mut config = Config::default();
        config.logging.format = "json".to_string();

        let logging = logging_config(2, Some(&config)).unwrap();
        assert_eq!(logging.level, "debug");
        assert_eq!(logging.format, LogFormat::Json);
        assert_eq!(logging_config(5, None).unwrap().level, "trace");
    }

    #[test]
    fn test_quiet_without_config() {
        assert_eq!(logging_config(0, None).unwrap().level, "warn");
    }
}
