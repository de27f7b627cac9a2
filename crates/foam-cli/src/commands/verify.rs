//! Verify command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use foam_extract::{Certificate, CertificatePolicy};

/// Execute the verify command.
pub fn execute(path: &Path, min_foam_strength: f64) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read certificate: {}", path.display()))?;
    let certificate: Certificate = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid certificate JSON: {}", path.display()))?;

    certificate
        .verify(&CertificatePolicy { min_foam_strength })
        .with_context(|| format!("Certificate {} rejected", path.display()))?;

    println!(
        "{} Certificate {} is valid",
        style("✓").green().bold(),
        style(path.display()).green()
    );
    println!("  Device:        {}", certificate.device);
    println!("  Issued:        {}", certificate.timestamp);
    println!("  Bases:         {}", certificate.n_bases);
    println!(
        "  Foam strength: {:.4} (minimum {min_foam_strength})",
        certificate.foam_signature.std
    );
    println!("  Entropy hash:  {}", style(&certificate.entropy_hash).dim());

    Ok(())
}
