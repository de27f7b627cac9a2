//! Fixed-length whitening.
//!
//! [`whiten`] always returns exactly `output_bits` bits:
//!
//! - with at least `output_bits` input bits, each output bit is the parity of
//!   a reproducible random subset of input positions (Toeplitz-style linear
//!   mixing);
//! - with fewer, the input is expanded through SHA-256 in counter mode and the
//!   result is flagged as [`WhiteningMethod::HashFallback`].

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ExtractError, ExtractResult};

/// Seed of the subset selection. It fixes which inputs feed which output
/// bit; it is not a secret.
pub const TOEPLITZ_SEED: u64 = 42;

/// Default number of input positions mixed into each output bit.
pub const DEFAULT_SUBSET_SIZE: usize = 32;

/// Parameters of the Toeplitz mixing branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToeplitzParams {
    /// Input positions XOR-ed into each output bit.
    pub subset_size: usize,
    pub seed: u64,
}

impl ToeplitzParams {
    /// Parameters with the given subset size and the fixed seed.
    pub fn with_subset(subset_size: usize) -> Self {
        Self {
            subset_size,
            seed: TOEPLITZ_SEED,
        }
    }
}

impl Default for ToeplitzParams {
    fn default() -> Self {
        Self::with_subset(DEFAULT_SUBSET_SIZE)
    }
}

/// Which whitening branch produced the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhiteningMethod {
    Toeplitz,
    /// Too few input bits; output is a hash expansion.
    HashFallback,
}

impl WhiteningMethod {
    /// Check if the hash fallback was taken.
    pub fn is_fallback(&self) -> bool {
        matches!(self, WhiteningMethod::HashFallback)
    }
}

impl std::fmt::Display for WhiteningMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WhiteningMethod::Toeplitz => write!(f, "toeplitz"),
            WhiteningMethod::HashFallback => write!(f, "sha256_fallback"),
        }
    }
}

/// Output of [`whiten`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Whitened {
    pub bits: Vec<u8>,
    pub method: WhiteningMethod,
}

/// Produce exactly `output_bits` whitened bits from `bits`.
pub fn whiten(bits: &[u8], output_bits: usize, params: &ToeplitzParams) -> ExtractResult<Whitened> {
    if bits.is_empty() {
        return Err(ExtractError::InsufficientEntropy {
            available: 0,
            required: output_bits,
        });
    }

    if bits.len() < output_bits {
        return Ok(Whitened {
            bits: hash_expand(bits, output_bits),
            method: WhiteningMethod::HashFallback,
        });
    }

    Ok(Whitened {
        bits: toeplitz_mix(bits, output_bits, params),
        method: WhiteningMethod::Toeplitz,
    })
}

fn toeplitz_mix(bits: &[u8], output_bits: usize, params: &ToeplitzParams) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let amount = params.subset_size.clamp(1, bits.len());

    (0..output_bits)
        .map(|_| {
            rand::seq::index::sample(&mut rng, bits.len(), amount)
                .iter()
                .fold(0u8, |acc, pos| acc ^ bits[pos])
        })
        .collect()
}

/// SHA-256 counter-mode expansion of a bit sequence.
///
/// Block `i` is `SHA256(bit_len_le || packed_bits || i_le)`; the bit length
/// prefix keeps inputs that differ only in zero padding apart.
fn hash_expand(bits: &[u8], output_bits: usize) -> Vec<u8> {
    let packed = pack_bits(bits);
    let bit_len = bits.len() as u64;
    let mut out = Vec::with_capacity(output_bits);
    let mut counter: u64 = 0;

    while out.len() < output_bits {
        let mut h = Sha256::new();
        h.update(bit_len.to_le_bytes());
        h.update(&packed);
        h.update(counter.to_le_bytes());
        let digest: [u8; 32] = h.finalize().into();

        for byte in digest {
            for shift in (0..8).rev() {
                out.push((byte >> shift) & 1);
            }
        }
        counter += 1;
    }

    out.truncate(output_bits);
    out
}

/// Pack bits MSB-first; the last byte is zero padded.
pub fn pack_bits(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (i, &bit)| byte | ((bit & 1) << (7 - i)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toeplitz_branch_is_reproducible() {
        let bits: Vec<u8> = (0..1000).map(|i| ((i * 7 + 3) % 5 % 2) as u8).collect();
        let params = ToeplitzParams::default();

        let a = whiten(&bits, 256, &params).unwrap();
        let b = whiten(&bits, 256, &params).unwrap();

        assert_eq!(a.method, WhiteningMethod::Toeplitz);
        assert_eq!(a.bits.len(), 256);
        assert_eq!(a, b);
    }

    #[test]
    fn test_subset_larger_than_input() {
        let bits = vec![1, 0, 1];
        let out = whiten(&bits, 3, &ToeplitzParams::with_subset(64)).unwrap();
        assert_eq!(out.method, WhiteningMethod::Toeplitz);
        // Every output bit mixes all three inputs.
        assert_eq!(out.bits, vec![0, 0, 0]);
    }

    #[test]
    fn test_fallback_when_short() {
        let out = whiten(&[1, 0, 1, 1], 300, &ToeplitzParams::default()).unwrap();
        assert_eq!(out.method, WhiteningMethod::HashFallback);
        assert!(out.method.is_fallback());
        assert_eq!(out.bits.len(), 300);
        assert!(out.bits.iter().all(|&b| b <= 1));
    }

    #[test]
    fn test_fallback_distinguishes_padding() {
        let a = whiten(&[1], 16, &ToeplitzParams::default()).unwrap();
        let b = whiten(&[1, 0], 16, &ToeplitzParams::default()).unwrap();
        assert_ne!(a.bits, b.bits);
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(
            whiten(&[], 8, &ToeplitzParams::default()),
            Err(ExtractError::InsufficientEntropy { available: 0, required: 8 })
        ));
    }

    #[test]
    fn test_pack_bits() {
        assert_eq!(pack_bits(&[1, 0, 1, 0, 0, 0, 0, 1, 1]), vec![0b1010_0001, 0b1000_0000]);
    }
}
