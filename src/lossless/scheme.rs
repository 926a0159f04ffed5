//! Magnitude binarization: truncated unary flags plus an optional Exp-Golomb escape.
//!
//! For a magnitude `m >= 1` the flags "m > k" are coded for `k = 1, 2, ...`
//! until one is 0, `k` reaches the bound (then `m == bound` is implied) or `k`
//! passes the scheme's unary length. In the last case the remainder `m - k`
//! is coded as an order-0 Exp-Golomb number whose prefix is truncated at the
//! longest prefix the bound allows.

use super::{context::Context, LosslessCoder};
use crate::config::Scheme;
use crate::entropy_coding::{ACRead, ACWrite, ArithmeticCoder, P_BYPASS};
use crate::error::{Error, Result};

impl LosslessCoder {
    /// Number of unary steps before escaping
    fn unary_len(&self) -> u32 {
        match self.config.scheme {
            Scheme::Unary => self.config.bound,
            Scheme::UnaryExpGolomb { unary_len } => u32::from(unary_len),
        }
    }

    pub(super) fn encode_magnitude<W: ACWrite>(
        &mut self,
        ac: &mut ArithmeticCoder<W>,
        magnitude: u32,
        class: u8,
    ) -> Result<()> {
        debug_assert!(magnitude >= 1 && magnitude <= self.config.bound);
        let bound = self.config.bound;
        let unary_len = self.unary_len();

        let mut k = 1;
        loop {
            if k == bound {
                return Ok(());
            }
            if k > unary_len {
                break;
            }
            let more = magnitude > k;
            self.encode_bit(ac, Context::Greater { step: k, class }, u8::from(more))?;
            if !more {
                return Ok(());
            }
            k += 1;
        }

        self.encode_escape(ac, magnitude - k, bound - k)
    }

    pub(super) fn decode_magnitude<R: ACRead>(
        &mut self,
        ac: &mut ArithmeticCoder<R>,
        class: u8,
        index: usize,
    ) -> Result<u32> {
        let bound = self.config.bound;
        let unary_len = self.unary_len();

        let mut k = 1;
        loop {
            if k == bound {
                return Ok(k);
            }
            if k > unary_len {
                break;
            }
            if self.decode_bit(ac, Context::Greater { step: k, class })? == 0 {
                return Ok(k);
            }
            k += 1;
        }

        let remainder = self.decode_escape(ac, bound - k, index)?;
        Ok(k + remainder)
    }

    fn encode_escape<W: ACWrite>(
        &mut self,
        ac: &mut ArithmeticCoder<W>,
        remainder: u32,
        max_remainder: u32,
    ) -> Result<()> {
        let v = remainder + 1;
        let len = ilog2(v);
        let max_len = ilog2(max_remainder + 1);

        for prefix in 0..len {
            self.encode_bit(ac, Context::Escape { prefix }, 1)?;
        }
        if len < max_len {
            self.encode_bit(ac, Context::Escape { prefix: len }, 0)?;
        }
        for i in (0..len).rev() {
            ac.encode(crate::u8!((v >> i) & 1), P_BYPASS)?;
        }
        Ok(())
    }

    fn decode_escape<R: ACRead>(
        &mut self,
        ac: &mut ArithmeticCoder<R>,
        max_remainder: u32,
        index: usize,
    ) -> Result<u32> {
        let max_len = ilog2(max_remainder + 1);

        let mut len = 0;
        while len < max_len && self.decode_bit(ac, Context::Escape { prefix: len })? == 1 {
            len += 1;
        }

        let mut v: u32 = 1;
        for _ in 0..len {
            v = (v << 1) | u32::from(ac.decode(P_BYPASS)?);
        }

        let remainder = v - 1;
        if remainder > max_remainder {
            return Err(Error::CorruptStream {
                index,
                reason: "escape value exceeds the alphabet bound",
            });
        }
        Ok(remainder)
    }
}

#[inline(always)]
fn ilog2(v: u32) -> u32 {
    debug_assert!(v > 0);
    u32::BITS - 1 - v.leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::ilog2;
    use crate::config::{CoderConfig, Scheme};
    use crate::entropy_coding::{
        ac_io::{ACReader, ACWriter},
        ArithmeticCoder, P_BYPASS,
    };
    use crate::lossless::context::Context;
    use crate::error::Error;
    use crate::lossless::LosslessCoder;

    fn round_trip_magnitudes(config: CoderConfig, magnitudes: &[u32]) {
        let mut coder = LosslessCoder::new(&config).unwrap();
        let mut ac = ArithmeticCoder::new_coder(ACWriter::new(Vec::new()));
        for &m in magnitudes {
            coder.encode_magnitude(&mut ac, m, 0).unwrap();
        }
        ac.flush().unwrap();
        let bytes = ac.into_inner().into_bytes();

        let mut coder = LosslessCoder::new(&config).unwrap();
        let mut ac = ArithmeticCoder::new_decoder(ACReader::new(&bytes)).unwrap();
        for (index, &m) in magnitudes.iter().enumerate() {
            assert_eq!(coder.decode_magnitude(&mut ac, 0, index).unwrap(), m);
        }
        ac.finish(magnitudes.len()).unwrap();
    }

    #[test]
    fn ilog2_floors() {
        assert_eq!([1, 2, 3, 4, 7, 8, 1 << 20].map(ilog2), [0, 1, 1, 2, 2, 3, 20]);
    }

    #[test]
    fn every_magnitude_of_small_alphabets() {
        for bound in 1..=20 {
            let all: Vec<u32> = (1..=bound).chain((1..=bound).rev()).collect();
            for unary_len in [1, 2, 3, 8] {
                let config = CoderConfig::new(bound).with_scheme(Scheme::UnaryExpGolomb { unary_len });
                round_trip_magnitudes(config, &all);
            }
            round_trip_magnitudes(CoderConfig::new(bound).with_scheme(Scheme::Unary), &all);
        }
    }

    #[test]
    fn escape_reaches_large_bounds() {
        let bound = crate::config::MAX_BOUND;
        let magnitudes = [1, 2, 9, 10, 1000, bound - 1, bound, 65_537];
        round_trip_magnitudes(CoderConfig::new(bound), &magnitudes);
    }

    #[test]
    fn oversized_escape_is_corrupt() {
        // remainders in [0, 10] allow a 3 bit prefix, so suffixes up to 0b1111 are
        // representable; 0b1111 = 15 means a remainder of 14, beyond the bound
        let config = CoderConfig::new(12).with_scheme(Scheme::UnaryExpGolomb { unary_len: 1 });
        let mut coder = LosslessCoder::new(&config).unwrap();
        let mut ac = ArithmeticCoder::new_coder(ACWriter::new(Vec::new()));
        for prefix in 0..3 {
            coder.encode_bit(&mut ac, Context::Escape { prefix }, 1).unwrap();
        }
        for _ in 0..3 {
            ac.encode(1, P_BYPASS).unwrap();
        }
        ac.flush().unwrap();
        let bytes = ac.into_inner().into_bytes();

        let mut coder = LosslessCoder::new(&config).unwrap();
        let mut ac = ArithmeticCoder::new_decoder(ACReader::new(&bytes)).unwrap();
        let res = coder.decode_escape(&mut ac, 10, 5);
        assert!(matches!(res, Err(Error::CorruptStream { index: 5, .. })));
    }

    #[test]
    fn largest_escape_round_trips() {
        let config = CoderConfig::new(12).with_scheme(Scheme::UnaryExpGolomb { unary_len: 1 });
        let mut coder = LosslessCoder::new(&config).unwrap();
        let mut ac = ArithmeticCoder::new_coder(ACWriter::new(Vec::new()));
        coder.encode_escape(&mut ac, 10, 10).unwrap();
        ac.flush().unwrap();
        let bytes = ac.into_inner().into_bytes();

        let mut coder = LosslessCoder::new(&config).unwrap();
        let mut ac = ArithmeticCoder::new_decoder(ACReader::new(&bytes)).unwrap();
        assert_eq!(coder.decode_escape(&mut ac, 10, 0).unwrap(), 10);
        ac.finish(1).unwrap();
    }
}
