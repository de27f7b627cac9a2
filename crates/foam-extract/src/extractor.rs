//! Per-basis bit and statistic extraction.
//!
//! Every measured shot contributes exactly one bit pair. A histogram entry
//! `"01": 3` therefore expands to `0,1,0,1,0,1`: three independent events,
//! never a single pair and never a pair repeated beyond its count.

use foam_hal::Histogram;
use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, ExtractResult};

/// 2x2 contingency table of the two measured bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contingency {
    pub n00: u64,
    pub n01: u64,
    pub n10: u64,
    pub n11: u64,
}

impl Contingency {
    /// Total number of occurrences.
    pub fn total(&self) -> u64 {
        self.n00 + self.n01 + self.n10 + self.n11
    }

    /// Correlation statistic `(n00 + n11 - n01 - n10) / T`.
    ///
    /// `None` when the table is empty.
    pub fn expectation_value(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let agree = (self.n00 + self.n11) as f64;
        let disagree = (self.n01 + self.n10) as f64;
        Some((agree - disagree) / total as f64)
    }

    fn add(&mut self, (high, low): (u8, u8), count: u64) {
        match (high, low) {
            (0, 0) => self.n00 += count,
            (0, _) => self.n01 += count,
            (_, 0) => self.n10 += count,
            _ => self.n11 += count,
        }
    }
}

/// Bits and diagnostics extracted from one basis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasisSample {
    /// Two bits per occurrence, in histogram iteration order.
    pub bits: Vec<u8>,
    pub contingency: Contingency,
    /// Coupling statistic in `[-1, 1]`.
    pub expectation_value: f64,
}

/// Expand a histogram into bits and compute its expectation value.
///
/// Integer and bitstring labels of the same outcome are merged. An empty
/// histogram is an error, so callers never divide by zero.
pub fn extract_basis(histogram: &Histogram) -> ExtractResult<BasisSample> {
    let mut contingency = Contingency::default();
    let mut bits = Vec::with_capacity(histogram.total() as usize * 2);

    for (label, count) in histogram.iter() {
        let (high, low) = label
            .pair()
            .ok_or_else(|| ExtractError::InvalidOutcome(label.to_string()))?;
        contingency.add((high, low), count);

        for _ in 0..count {
            bits.push(high);
            bits.push(low);
        }
    }

    let expectation_value = contingency
        .expectation_value()
        .ok_or(ExtractError::EmptyHistogram)?;

    Ok(BasisSample {
        bits,
        contingency,
        expectation_value,
    })
}
