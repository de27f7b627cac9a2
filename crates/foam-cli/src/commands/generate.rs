//! Generate command implementation.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use foam_core::{Config, ExecutionEngine, GenerationResult, JobManager, JobStatus, KeyGenerator};
use foam_extract::convert::F64_BITS;
use foam_extract::{IntRange, bits_to_uniform_f64, hex_to_bits};
use foam_hal::PollPolicy;

use super::common::build_backend;

const STATUS_POLL: Duration = Duration::from_millis(100);

/// Numbers drawn from the generated key.
#[derive(Debug, Default, PartialEq)]
struct Draws {
    integer: Option<u64>,
    float: Option<f64>,
}

/// Execute the generate command.
pub async fn execute(
    mut config: Config,
    json: bool,
    certificate_path: Option<&Path>,
    int_range: Option<IntRange>,
    float: bool,
) -> Result<()> {
    if certificate_path.is_some() {
        config.generator.issue_certificate = true;
    }

    let backend = build_backend(&config)?;
    let device = backend.name().to_string();
    let generator_config = config.generator_config(&device);

    if !json {
        println!(
            "{} Generating {}-bit key from {} bases on {} ({} shots each)",
            style("→").cyan().bold(),
            config.generator.output_bits,
            generator_config.bases.len(),
            style(&device).yellow(),
            generator_config.shots_per_basis
        );
    }

    let availability = backend.availability().await?;
    if !availability.is_available {
        anyhow::bail!("Backend '{device}' is not available");
    }

    let engine = ExecutionEngine::new(backend, config.engine_config());
    let generator = KeyGenerator::new(engine, generator_config)?;
    let manager = JobManager::new(Arc::new(generator));

    let spinner = ProgressBar::new_spinner();
    if json {
        spinner.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .context("Invalid spinner template")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let id = manager.create_job().await;
    spinner.set_message(format!("Running job {id}..."));

    // The run's own polls are bounded, so one extra minute covers submission
    // and extraction.
    let budget = config.poll_policy().budget() + Duration::from_secs(60);
    let attempts = u32::try_from(budget.as_millis() / STATUS_POLL.as_millis())
        .unwrap_or(u32::MAX)
        .saturating_add(1);
    let job = manager
        .wait_for(&id, PollPolicy::new(STATUS_POLL, attempts))
        .await?;
    spinner.finish_and_clear();
    manager.shutdown().await;

    match job.status {
        JobStatus::Completed => {}
        JobStatus::Failed => anyhow::bail!(
            "Job {id} failed: {}",
            job.error.as_deref().unwrap_or("unknown error")
        ),
        status => anyhow::bail!("Job {id} still {status} after {budget:?}"),
    }
    let result = job
        .result
        .ok_or_else(|| anyhow::anyhow!("Job {id} completed without a result"))?;

    if let Some(path) = certificate_path {
        let certificate = result
            .certificate
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Job {id} did not issue a certificate"))?;
        let contents = serde_json::to_string_pretty(certificate)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write certificate: {}", path.display()))?;
    }

    let draws = draw(&result.key_hex, int_range, float)?;

    if json {
        let mut value = serde_json::to_value(&result)?;
        if let Some(fields) = value.as_object_mut() {
            if let Some(integer) = draws.integer {
                fields.insert("integer".to_string(), integer.into());
            }
            if let Some(float) = draws.float {
                fields.insert("float".to_string(), float.into());
            }
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print_result(&result);
        if let (Some(range), Some(integer)) = (int_range, draws.integer) {
            println!("  Integer:       {} (in {range})", style(integer).green().bold());
        }
        if let Some(float) = draws.float {
            println!("  Float:         {}", style(float).green().bold());
        }
        if let Some(path) = certificate_path {
            println!("  Certificate:   {}", style(path.display()).green());
        }
    }

    Ok(())
}

/// Draw the requested numbers from the key.
///
/// The float takes the last 53 bits and the integer the bits before them, so
/// the two never share input.
fn draw(key_hex: &str, int_range: Option<IntRange>, float: bool) -> Result<Draws> {
    let bits = hex_to_bits(key_hex).context("Malformed key")?;
    let (int_bits, float_bits) = if float {
        bits.split_at(bits.len().saturating_sub(F64_BITS))
    } else {
        (bits.as_slice(), &[][..])
    };

    let integer = int_range
        .map(|range| {
            range
                .sample(int_bits)
                .with_context(|| format!("Cannot draw --int {range}; request a longer key with -b"))
        })
        .transpose()?;
    let float = float
        .then(|| {
            bits_to_uniform_f64(float_bits)
                .context("Cannot draw --float; request a longer key with -b")
        })
        .transpose()?;

    Ok(Draws { integer, float })
}

fn print_result(result: &GenerationResult) {
    println!();
    println!("  Key:           {}", style(&result.key_hex).green().bold());
    println!("  Foam strength: {:.4}", result.foam_strength);
    println!(
        "  Bits:          {} raw → {} extracted ({:.1}% von Neumann yield)",
        result.raw_bit_count,
        result.extracted_bit_count,
        result.extraction_ratio * 100.0
    );
    println!("  Ones fraction: {:.3}", result.randomness_score);

    let whitening = if result.hash_fallback {
        style(result.whitening.to_string()).yellow()
    } else {
        style(result.whitening.to_string()).cyan()
    };
    println!("  Whitening:     {whitening}");

    println!(
        "  Bases:         {} survived, {} failed",
        result.surviving_bases,
        result.failed_bases.len()
    );
    for failed in &result.failed_bases {
        println!(
            "    {} {}: {}",
            style("✗").red(),
            failed.label,
            style(&failed.error).dim()
        );
    }

    println!(
        "  Timings:       submit {} ms, collect {} ms, total {} ms",
        result.timings.submission_ms, result.timings.collection_ms, result.timings.total_ms
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "ffffffffffffffff0000000000000000";

    #[test]
    fn test_draw_nothing_requested() {
        assert_eq!(draw(KEY, None, false).unwrap(), Draws::default());
    }

    #[test]
    fn test_draw_integer_from_key_start() {
        let range = IntRange { min: 1, max: 6 };
        // Span 5 reads 3-bit chunks. The 21 chunks of leading ones (7) are
        // rejected; the next one straddles into the zeros as 0b100.
        let draws = draw(KEY, Some(range), false).unwrap();
        assert_eq!(draws.integer, Some(5));
        assert!(draws.float.is_none());
    }

    #[test]
    fn test_draw_float_from_key_end() {
        let draws = draw(KEY, None, true).unwrap();
        assert_eq!(draws.float, Some(0.0));

        let key = "0000000000000000ffffffffffffffff";
        let draws = draw(key, Some(IntRange { min: 0, max: 1 }), true).unwrap();
        assert_eq!(draws.integer, Some(0));
        assert!(draws.float.unwrap() > 0.99);
    }

    #[test]
    fn test_draw_needs_enough_bits() {
        assert!(draw("ffff", None, true).is_err());
        assert!(draw("f", Some(IntRange { min: 0, max: 5 }), false).is_err());
        assert!(draw("zz", None, false).is_err());
    }
}
