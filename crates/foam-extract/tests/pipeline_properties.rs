//! Property tests for the extraction contracts.

use foam_extract::{
    ExtractionPipeline, PipelineConfig, ToeplitzParams, bits_to_hex, bits_to_range_u64,
    bits_to_uniform_f64, extract_basis, von_neumann, whiten,
};
use foam_hal::Histogram;
use proptest::prelude::*;

fn bit_vec(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..=1, 1..max_len)
}

proptest! {
    #[test]
    fn whiten_returns_exact_length(bits in bit_vec(600), nibbles in 1usize..128) {
        let output_bits = nibbles * 4;
        let out = whiten(&bits, output_bits, &ToeplitzParams::default()).unwrap();
        prop_assert_eq!(out.bits.len(), output_bits);
        prop_assert!(out.bits.iter().all(|&b| b <= 1));
        prop_assert_eq!(out.method.is_fallback(), bits.len() < output_bits);
    }

    #[test]
    fn expectation_value_in_range(
        n00 in 0u64..500, n01 in 0u64..500, n10 in 0u64..500, n11 in 1u64..500,
    ) {
        let histogram = Histogram::from_pairs([("00", n00), ("01", n01), ("10", n10), ("11", n11)]);
        let sample = extract_basis(&histogram).unwrap();
        prop_assert!((-1.0..=1.0).contains(&sample.expectation_value));
        prop_assert_eq!(sample.bits.len() as u64, 2 * (n00 + n01 + n10 + n11));
    }

    #[test]
    fn von_neumann_never_exceeds_half(bits in bit_vec(400)) {
        let out = von_neumann(&bits);
        prop_assert!(out.len() <= bits.len() / 2);
    }

    #[test]
    fn equal_pairs_yield_nothing(pairs in prop::collection::vec(0u8..=1, 0..100)) {
        let bits: Vec<u8> = pairs.iter().flat_map(|&b| [b, b]).collect();
        prop_assert!(von_neumann(&bits).is_empty());
    }

    #[test]
    fn pipeline_key_has_quarter_length(nibbles in 1usize..64) {
        let output_bits = nibbles * 4;
        let pool: Vec<u8> = (0..output_bits * 8 + 256).map(|i| (i % 2) as u8).collect();
        let pipeline = ExtractionPipeline::new(PipelineConfig::new(output_bits)).unwrap();
        let out = pipeline.run(pool).unwrap();
        prop_assert_eq!(bits_to_hex(&out.bits).len(), output_bits / 4);
    }

    #[test]
    fn uniform_float_in_unit_interval(bits in prop::collection::vec(0u8..=1, 53..128)) {
        let value = bits_to_uniform_f64(&bits).unwrap();
        prop_assert!((0.0..1.0).contains(&value));
    }

    #[test]
    fn range_value_within_bounds(
        bits in prop::collection::vec(0u8..=1, 64..256),
        min in 0u64..1_000_000,
        span in 0u64..1_000_000,
    ) {
        let max = min + span;
        match bits_to_range_u64(&bits, min, max) {
            Ok(value) => prop_assert!((min..=max).contains(&value)),
            Err(e) => prop_assert!(e.to_string().starts_with("Insufficient entropy")),
        }
    }
}
