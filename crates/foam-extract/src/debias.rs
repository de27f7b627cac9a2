//! Bias removal and decorrelation.
//!
//! Bits are one `u8` per bit (`0` or `1`) throughout the pipeline.

/// Von Neumann extractor.
///
/// Scans non-overlapping pairs and emits the first bit of every unequal pair
/// (`01` → 0, `10` → 1). Equal pairs and a trailing odd bit are dropped.
/// Yield is about a quarter of the input for an unbiased source.
pub fn von_neumann(bits: &[u8]) -> Vec<u8> {
    bits.chunks_exact(2)
        .filter(|pair| pair[0] != pair[1])
        .map(|pair| pair[0])
        .collect()
}

/// Block-XOR decorrelation.
///
/// Emits the parity of each full block of `block` bits; a trailing partial
/// block is discarded. A block size of 0 or 1 leaves the input unchanged.
pub fn block_parity(bits: &[u8], block: usize) -> Vec<u8> {
    if block <= 1 {
        return bits.to_vec();
    }
    bits.chunks_exact(block)
        .map(|chunk| chunk.iter().fold(0, |acc, bit| acc ^ bit))
        .collect()
}
