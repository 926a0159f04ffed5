use latentac::bit_io::{BitReader, BitWriter};
use latentac::{decode, encode, CoderConfig, QuantizedMap, Scheme};
use proptest::prelude::*;

fn config_strategy() -> impl Strategy<Value = CoderConfig> {
    (1..=300u32, any::<bool>(), prop_oneof![Just(0u8), 1..=12u8]).prop_map(|(bound, signed, unary_len)| {
        let scheme = match unary_len {
            0 if bound <= 256 => Scheme::Unary,
            0 => Scheme::default(),
            unary_len => Scheme::UnaryExpGolomb { unary_len },
        };
        CoderConfig { bound, signed, scheme }
    })
}

fn map_strategy() -> impl Strategy<Value = (CoderConfig, QuantizedMap)> {
    (config_strategy(), 1..=3usize, 1..=9usize, 1..=9usize).prop_flat_map(|(config, c, h, w)| {
        let symbols = prop::collection::vec(config.min_symbol()..=config.max_symbol(), c * h * w);
        symbols.prop_map(move |data| {
            let map = if c == 1 {
                QuantizedMap::from_2d(h, w, data).unwrap()
            } else {
                QuantizedMap::from_3d(c, h, w, data).unwrap()
            };
            (config, map)
        })
    })
}

proptest! {
    #[test]
    fn test_map_roundtrip((config, map) in map_strategy()) {
        let bytes = encode(&map, &config).unwrap();
        prop_assert_eq!(decode(&bytes, &config).unwrap(), map);
    }

    #[test]
    fn test_sparse_map_roundtrip(
        data in prop::collection::vec(prop_oneof![8 => Just(0i32), 1 => -1000..=1000i32], 64),
    ) {
        let config = CoderConfig::new(1000);
        let map = QuantizedMap::from_2d(8, 8, data).unwrap();
        let bytes = encode(&map, &config).unwrap();
        prop_assert_eq!(decode(&bytes, &config).unwrap(), map);
    }

    #[test]
    fn test_truncation_never_decodes((config, map) in map_strategy(), cut in 1..4usize) {
        let bytes = encode(&map, &config).unwrap();
        let cut = cut.min(bytes.len());
        prop_assert!(decode(&bytes[..bytes.len() - cut], &config).is_err());
    }

    #[test]
    fn test_bitstream_roundtrip(bits in prop::collection::vec(0..=1u8, 0..200)) {
        let mut writer = BitWriter::new(Vec::new());
        for &bit in &bits {
            writer.write_bit(bit);
        }
        let bytes = writer.flush();
        prop_assert_eq!(bytes.len(), bits.len().div_ceil(8));

        let mut reader = BitReader::new(&bytes);
        for &bit in &bits {
            prop_assert_eq!(reader.read_bit().unwrap(), bit);
        }
        prop_assert!(reader.ensure_drained(bits.len()).is_ok());
    }
}
