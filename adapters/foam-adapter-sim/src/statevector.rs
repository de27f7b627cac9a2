//! Two-qubit statevector engine.
//!
//! Amplitude index bit `k` is qubit `k`, so outcome `0b10` means qubit 1 read
//! 1 and qubit 0 read 0.

use num_complex::Complex64;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

const NUM_QUBITS: usize = 2;
const DIM: usize = 1 << NUM_QUBITS;

/// State of the two-qubit register.
#[derive(Debug, Clone)]
pub struct Statevector {
    amplitudes: [Complex64; DIM],
}

impl Statevector {
    /// |00⟩.
    pub fn new() -> Self {
        let mut amplitudes = [Complex64::new(0.0, 0.0); DIM];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self { amplitudes }
    }

    pub fn apply_rx(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        let neg_i_s = Complex64::new(0.0, -s);
        for i in 0..DIM {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a + neg_i_s * b;
                self.amplitudes[j] = neg_i_s * a + c * b;
            }
        }
    }

    pub fn apply_ry(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        for i in 0..DIM {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a - s * b;
                self.amplitudes[j] = s * a + c * b;
            }
        }
    }

    pub fn apply_rz(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase_0 = Complex64::from_polar(1.0, -theta / 2.0);
        let phase_1 = Complex64::from_polar(1.0, theta / 2.0);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            *amp *= if i & mask == 0 { phase_0 } else { phase_1 };
        }
    }

    pub fn apply_cx(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..DIM {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    /// Measurement probabilities indexed by outcome.
    pub fn probabilities(&self) -> [f64; DIM] {
        self.amplitudes.map(|amp| amp.norm_sqr())
    }

    /// Draw `shots` measurement outcomes and count them per outcome index.
    pub fn sample_counts<R: Rng + ?Sized>(&self, shots: u32, rng: &mut R) -> [u64; DIM] {
        let mut counts = [0u64; DIM];
        // Rotations keep the norm at 1, so the weights are never all zero.
        let Ok(dist) = WeightedIndex::new(self.probabilities()) else {
            counts[0] = u64::from(shots);
            return counts;
        };
        for _ in 0..shots {
            counts[dist.sample(rng)] += 1;
        }
        counts
    }
}

impl Default for Statevector {
    fn default() -> Self {
        Self::new()
    }
}
