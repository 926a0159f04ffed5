pub mod ac_io;

use crate::error::{Error, Result};

const PREC_SHIFT: u32 = u32::BITS - 1; // 31
const Q1: u32 = 1 << (PREC_SHIFT - 1); // 0x40000000, 1 = 0b01, quarter 1
const Q2: u32 = 2 << (PREC_SHIFT - 1); // 0x80000000, 2 = 0b10, range middle
const Q3: u32 = 3 << (PREC_SHIFT - 1); // 0xC0000000, 3 = 0b11, quarter 3
const RLO_MOD: u32 = (1 << PREC_SHIFT) - 1; // 0x7FFFFFFF, range low modify
const RHI_MOD: u32 = (1 << PREC_SHIFT) + 1; // 0x80000001, range high modify

/// Probability of one half, for bits that aren't worth modeling
pub const P_BYPASS: u16 = 1 << 15;

/// The `ArithmeticCoder` encodes/decodes bits given a probability
///
/// Probabilities are P(bit = 1) in units of 2^-16.
/// Bit 1 takes the lower part `[x1, xmid]` of the interval, bit 0 the upper part.
pub struct ArithmeticCoder<T> {
    x1: u32, // low
    x2: u32, // high
    x: u32,  // state
    io: T,   // bit reader/writer
    done: bool,
}

pub trait ACRead {
    /// Read the next bit, fails on EOF
    fn read_bit(&mut self) -> Result<u8>;
    /// Read 4 bytes BE as u32
    fn read_u32(&mut self) -> Result<u32> {
        let mut x = 0;
        for _ in 0..u32::BITS {
            x = (x << 1) | u32::from(self.read_bit()?);
        }
        Ok(x)
    }
    /// Fails unless only zero padding is left
    fn ensure_drained(&self, index: usize) -> Result<()>;
}

pub trait ACWrite {
    /// Increases the number of reverse bits to write
    fn inc_parity(&mut self);
    /// Writes a bit and maintains E3 mapping logic
    fn write_bit(&mut self, bit: u8) -> Result<()>;
    /// Writes all 32 bits of the final state (resolving leftover parity bits first)
    fn flush(&mut self, mut state: u32) -> Result<()> {
        for _ in 0..u32::BITS {
            self.write_bit(crate::u8!(state >> PREC_SHIFT))?;
            state <<= 1;
        }
        Ok(())
    }
}

impl<T> ArithmeticCoder<T> {
    pub fn io(&self) -> &T {
        &self.io
    }

    pub fn into_inner(self) -> T {
        self.io
    }
}

impl<W: ACWrite> ArithmeticCoder<W> {
    pub fn new_coder(writer: W) -> Self {
        Self { io: writer, x1: 0, x2: u32::MAX, x: 0, done: false }
    }

    pub fn encode(&mut self, bit: u8, prob: u16) -> Result<()> {
        if self.done {
            return Err(Error::InvalidState("encode called after flush"));
        }
        let xmid = lerp(self.x1, self.x2, prob);

        // Update range (kinda like binary search)
        match bit {
            0 => self.x1 = xmid + 1,
            _ => self.x2 = xmid,
        }

        // Renormalize range -> write matching bits to stream
        while ((self.x1 ^ self.x2) >> PREC_SHIFT) == 0 {
            self.io.write_bit(crate::u8!(self.x1 >> PREC_SHIFT))?;
            self.x1 <<= 1;
            self.x2 = (self.x2 << 1) | 1;
        }

        // E3 renorm (special case) -> increase parity
        while self.x1 >= Q1 && self.x2 < Q3 {
            self.io.inc_parity();
            self.x1 = (self.x1 << 1) & RLO_MOD;
            self.x2 = (self.x2 << 1) | RHI_MOD;
        }

        Ok(())
    }

    /// Writes enough bits for the decoder to reach every encoded bit
    ///
    /// The decoder reads exactly as many bits as are written here, so a
    /// truncated stream can't decode successfully.
    pub fn flush(&mut self) -> Result<()> {
        if self.done {
            return Err(Error::InvalidState("flush called twice"));
        }
        self.done = true;

        // assert state is normalized, so Q2 lies within [x1, x2]
        debug_assert!(self.x1 >> PREC_SHIFT == 0 && self.x2 >> PREC_SHIFT == 1);
        self.io.flush(Q2)
    }
}

impl<R: ACRead> ArithmeticCoder<R> {
    pub fn new_decoder(mut reader: R) -> Result<Self> {
        let x = reader.read_u32()?;
        Ok(Self { io: reader, x1: 0, x2: u32::MAX, x, done: false })
    }

    pub fn decode(&mut self, prob: u16) -> Result<u8> {
        if self.done {
            return Err(Error::InvalidState("decode called after the stream ended"));
        }
        let xmid = lerp(self.x1, self.x2, prob);
        let bit = (self.x <= xmid).into();

        // Update range (kinda like binary search)
        match bit {
            0 => self.x1 = xmid + 1,
            _ => self.x2 = xmid,
        }

        // Renormalize range -> read new bits from stream
        while ((self.x1 ^ self.x2) >> PREC_SHIFT) == 0 {
            self.x1 <<= 1;
            self.x2 = (self.x2 << 1) | 1;
            self.x = (self.x << 1) | self.next_bit()?;
        }

        // E3 renorm (special case) -> fix parity
        while self.x1 >= Q1 && self.x2 < Q3 {
            self.x1 = (self.x1 << 1) & RLO_MOD;
            self.x2 = (self.x2 << 1) | RHI_MOD;
            self.x = ((self.x << 1) ^ Q2) | self.next_bit()?;
        }

        Ok(bit)
    }

    /// Ends decoding, fails if anything but zero padding is left unread
    pub fn finish(&mut self, index: usize) -> Result<()> {
        if self.done {
            return Err(Error::InvalidState("finish called after the stream ended"));
        }
        self.done = true;
        self.io.ensure_drained(index)
    }

    // a failed read leaves the state half-updated, so the coder is unusable afterwards
    fn next_bit(&mut self) -> Result<u32> {
        self.io.read_bit().map(u32::from).map_err(|err| {
            self.done = true;
            err
        })
    }
}

#[inline(always)]
fn lerp(x1: u32, x2: u32, prob: u16) -> u32 {
    // make prob 32-bit & always leave chance
    let p = if prob == 0 { 1 } else { u64::from(prob) << 16 };
    let range = u64::from(x2 - x1);
    let lerped_range = (range * p) >> 32;

    // no overflows/underflows, as both range < 2^32 and p < 2^32
    let xmid = x1 + crate::u32!(lerped_range);
    debug_assert!(xmid >= x1 && xmid < x2);
    xmid
}
