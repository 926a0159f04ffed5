//! Context-adaptive coding of a whole quantized map.
//!
//! Every symbol becomes a zero flag, a sign flag (signed alphabets only) and a
//! magnitude binarization (see [`scheme`]). Each decision picks its estimator
//! from the symbol's causal neighbors, so encoder and decoder see the same
//! contexts without any side information.

pub mod context;
mod scheme;

use self::context::{Context, ContextTable, Neighbors};
use crate::config::CoderConfig;
use crate::counters::Model;
use crate::entropy_coding::{ACRead, ACWrite, ArithmeticCoder};
use crate::error::{Error, Result};
use crate::map::{QuantizedMap, Shape};

/// Codes one map per instance, the context table lives exactly as long as the pass
pub struct LosslessCoder {
    config: CoderConfig,
    table: ContextTable,
}

impl LosslessCoder {
    pub fn new(config: &CoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config: *config, table: ContextTable::new() })
    }

    pub fn table(&self) -> &ContextTable {
        &self.table
    }

    pub fn into_table(self) -> ContextTable {
        self.table
    }

    /// Codes every element in scan order
    ///
    /// Fails with `AlphabetViolation` on the first element outside the alphabet.
    pub fn encode<W: ACWrite>(&mut self, map: &QuantizedMap, ac: &mut ArithmeticCoder<W>) -> Result<()> {
        let (min, max) = (self.config.min_symbol(), self.config.max_symbol());
        let data = map.data();

        for (index, &value) in data.iter().enumerate() {
            if value < min || value > max {
                return Err(Error::AlphabetViolation { index, value, min, max });
            }
            let neighbors = Neighbors::causal(data, map.shape(), index);
            self.encode_symbol(ac, value, neighbors)?;
        }

        Ok(())
    }

    /// Decodes `shape.len()` elements, deriving contexts from the elements decoded so far
    pub fn decode<R: ACRead>(&mut self, shape: &Shape, ac: &mut ArithmeticCoder<R>) -> Result<Vec<i32>> {
        let mut data = vec![0; shape.len()];

        for index in 0..data.len() {
            let neighbors = Neighbors::causal(&data, shape, index);
            data[index] = self.decode_symbol(ac, neighbors, index).map_err(|err| match err {
                Error::ExhaustedInput { bits_read, .. } => {
                    Error::ExhaustedInput { bits_read, index: Some(index) }
                }
                err => err,
            })?;
        }

        Ok(data)
    }

    fn encode_symbol<W: ACWrite>(
        &mut self,
        ac: &mut ArithmeticCoder<W>,
        value: i32,
        neighbors: Neighbors,
    ) -> Result<()> {
        let class = neighbors.class();
        let magnitude = value.unsigned_abs();

        self.encode_bit(ac, Context::Zero { class }, u8::from(magnitude != 0))?;
        if magnitude == 0 {
            return Ok(());
        }
        if self.config.signed {
            let pattern = neighbors.sign_pattern();
            self.encode_bit(ac, Context::Sign { pattern }, u8::from(value < 0))?;
        }
        self.encode_magnitude(ac, magnitude, class)
    }

    fn decode_symbol<R: ACRead>(
        &mut self,
        ac: &mut ArithmeticCoder<R>,
        neighbors: Neighbors,
        index: usize,
    ) -> Result<i32> {
        let class = neighbors.class();

        if self.decode_bit(ac, Context::Zero { class })? == 0 {
            return Ok(0);
        }
        let negative = self.config.signed
            && self.decode_bit(ac, Context::Sign { pattern: neighbors.sign_pattern() })? == 1;
        let magnitude = crate::i32!(self.decode_magnitude(ac, class, index)?);

        Ok(if negative { -magnitude } else { magnitude })
    }

    #[inline(always)]
    fn encode_bit<W: ACWrite>(&mut self, ac: &mut ArithmeticCoder<W>, ctx: Context, bit: u8) -> Result<()> {
        let model = self.table.model(ctx);
        ac.encode(bit, model.predict())?;
        model.update(bit);
        Ok(())
    }

    #[inline(always)]
    fn decode_bit<R: ACRead>(&mut self, ac: &mut ArithmeticCoder<R>, ctx: Context) -> Result<u8> {
        let model = self.table.model(ctx);
        let bit = ac.decode(model.predict())?;
        model.update(bit);
        Ok(bit)
    }
}
