//! Numbers drawn from extracted bits.
//!
//! Both conversions read bits MSB first from the start of the slice and
//! never fold bits with a modulo, so every value in the target range is
//! equally likely when the input bits are.

use std::str::FromStr;

use crate::error::{ExtractError, ExtractResult};

/// Mantissa width of an `f64`.
pub const F64_BITS: usize = 53;

fn fold(bits: &[u8]) -> u64 {
    bits.iter().fold(0u64, |acc, &bit| (acc << 1) | u64::from(bit & 1))
}

/// Uniform float in `[0, 1)` from the first 53 bits.
pub fn bits_to_uniform_f64(bits: &[u8]) -> ExtractResult<f64> {
    let mantissa = bits.get(..F64_BITS).ok_or(ExtractError::InsufficientEntropy {
        available: bits.len(),
        required: F64_BITS,
    })?;
    Ok(fold(mantissa) as f64 / (1u64 << F64_BITS) as f64)
}

/// Uniform integer in `[min, max]` by rejection sampling.
///
/// Bits are consumed in chunks just wide enough to hold `max - min`; a chunk
/// above the span is discarded and the next one tried. Errors when every
/// chunk is rejected.
pub fn bits_to_range_u64(bits: &[u8], min: u64, max: u64) -> ExtractResult<u64> {
    if min > max {
        return Err(ExtractError::InvalidConfig(format!(
            "empty range: {min} > {max}"
        )));
    }
    let span = max - min;
    if span == 0 {
        return Ok(min);
    }

    let width = (u64::BITS - span.leading_zeros()) as usize;
    bits.chunks_exact(width)
        .map(fold)
        .find(|&value| value <= span)
        .map(|value| min + value)
        .ok_or(ExtractError::InsufficientEntropy {
            available: bits.len(),
            required: width,
        })
}

/// Inclusive integer range written `MIN..MAX` (or `MIN..=MAX`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntRange {
    pub min: u64,
    pub max: u64,
}

impl IntRange {
    /// Draw a value from `bits`.
    pub fn sample(&self, bits: &[u8]) -> ExtractResult<u64> {
        bits_to_range_u64(bits, self.min, self.max)
    }
}

impl FromStr for IntRange {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ExtractError::InvalidConfig(format!("expected MIN..MAX, got {s:?}"));

        let (min, max) = s.split_once("..").ok_or_else(invalid)?;
        let max = max.strip_prefix('=').unwrap_or(max);
        let min = min.trim().parse().map_err(|_| invalid())?;
        let max = max.trim().parse().map_err(|_| invalid())?;
        if min > max {
            return Err(ExtractError::InvalidConfig(format!(
                "empty range: {min} > {max}"
            )));
        }
        Ok(Self { min, max })
    }
}

impl std::fmt::Display for IntRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}
