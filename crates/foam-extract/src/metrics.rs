//! Quality metrics reported next to a key.
//!
//! None of these gate success; they are diagnostics.

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by `n`); 0 for an empty slice.
///
/// Over per-basis expectation values this is the foam strength.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Fraction of ones (randomness score); 0.5 for an empty slice.
pub fn ones_fraction(bits: &[u8]) -> f64 {
    if bits.is_empty() {
        return 0.5;
    }
    bits.iter().filter(|&&b| b == 1).count() as f64 / bits.len() as f64
}

/// Debiased bits per raw bit; 0 when nothing was collected.
pub fn extraction_ratio(debiased: usize, raw: usize) -> f64 {
    if raw == 0 {
        return 0.0;
    }
    debiased as f64 / raw as f64
}
