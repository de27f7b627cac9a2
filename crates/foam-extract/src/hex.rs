//! Hex assembly.

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Encode bits as lowercase hex, four bits per digit, MSB first.
///
/// A trailing partial nibble is dropped.
pub fn bits_to_hex(bits: &[u8]) -> String {
    bits.chunks_exact(4)
        .map(|nibble| {
            let value = nibble.iter().fold(0usize, |acc, &bit| (acc << 1) | (bit & 1) as usize);
            HEX_DIGITS[value] as char
        })
        .collect()
}

/// Decode hex into bits, four per digit, MSB first.
///
/// Returns `None` on any non-hex character.
pub fn hex_to_bits(hex: &str) -> Option<Vec<u8>> {
    let mut bits = Vec::with_capacity(hex.len() * 4);
    for c in hex.chars() {
        let value = c.to_digit(16)?;
        bits.extend((0..4).rev().map(|i| ((value >> i) & 1) as u8));
    }
    Some(bits)
}

/// Render bits as a `0`/`1` string.
pub fn bits_to_string(bits: &[u8]) -> String {
    bits.iter().map(|&b| if b == 0 { '0' } else { '1' }).collect()
}
