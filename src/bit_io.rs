/*!
Bit IO over in-memory byte buffers

Bits are packed most-significant-bit first. The writer pads the last partial
byte with `0`s, the reader hands bits back in the order they were written.

# Examples

```
use latentac::bit_io::{BitReader, BitWriter};

let mut writer = BitWriter::new(Vec::new());
for bit in [1, 0, 1] {
    writer.write_bit(bit);
}
let bytes = writer.flush();
assert_eq!(bytes, [0b1010_0000]);

let mut reader = BitReader::new(&bytes);
assert_eq!(reader.read_bit().unwrap(), 1);
assert_eq!(reader.read_bit().unwrap(), 0);
```
*/
#![warn(missing_docs)]

use self::bit_helpers::BitQueue;
use crate::error::{Error, Result};

/// A BitWriter appends bits to a growable byte buffer
#[derive(Debug)]
pub struct BitWriter {
    inner: Vec<u8>,
    bit_queue: BitQueue,
}

impl BitWriter {
    /// Initializes a BitWriter that appends after the bytes already in `inner`
    pub fn new(inner: Vec<u8>) -> Self {
        Self { inner, bit_queue: BitQueue::new() }
    }

    /// Appends a single bit, only the lowest bit of `bit` is used
    pub fn write_bit(&mut self, bit: u8) {
        debug_assert!(bit <= 1, "Provided value wasn't a valid bit");
        self.bit_queue.push(bit & 1);
        if let Some(byte) = self.bit_queue.try_flush() {
            self.inner.push(byte);
        }
    }

    /// Number of bits written since creation (bytes handed in at creation included)
    pub fn bits_written(&self) -> u64 {
        (self.inner.len() as u64) * u64::from(u8::BITS) + u64::from(self.bit_queue.len())
    }

    /// Pads the partial byte with 0s and returns the buffer
    pub fn flush(mut self) -> Vec<u8> {
        if let Some(byte) = self.bit_queue.drain_padded() {
            self.inner.push(byte);
        }
        self.inner
    }
}

/// A BitReader reads bits from a borrowed byte buffer
#[derive(Debug)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    bit_queue: BitQueue,
}

impl<'a> BitReader<'a> {
    /// Initializes a BitReader at the first bit of `bytes`
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0, bit_queue: BitQueue::new() }
    }

    /// Reads the next bit or fails with `ExhaustedInput`
    pub fn read_bit(&mut self) -> Result<u8> {
        if let Some(bit) = self.bit_queue.pop() {
            return Ok(bit);
        }

        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or(Error::ExhaustedInput { bits_read: self.bits_read(), index: None })?;
        self.pos += 1;
        Ok(self.bit_queue.fill(byte))
    }

    /// Number of bits handed out so far
    pub fn bits_read(&self) -> u64 {
        (self.pos as u64) * u64::from(u8::BITS) - u64::from(self.bit_queue.len())
    }

    /// Succeeds only if nothing but zero padding is left unread
    ///
    /// `index` is reported in the error and should be the number of symbols decoded.
    pub fn ensure_drained(&self, index: usize) -> Result<()> {
        if !self.bit_queue.is_zero() {
            return Err(Error::CorruptStream { index, reason: "non-zero padding bits" });
        }
        if self.pos != self.bytes.len() {
            return Err(Error::CorruptStream { index, reason: "trailing bytes after coded data" });
        }
        Ok(())
    }
}

mod bit_helpers {
    /// An 8 element bit queue (with internal store u8)
    ///
    /// Bits leave the queue in the order they came in.
    #[derive(Debug, Default)]
    pub struct BitQueue {
        /// Byte buffer
        t: u8,
        /// Number of bits being held
        count: u8,
    }

    impl BitQueue {
        pub fn new() -> Self {
            Self::default()
        }

        /// Push a bit in the queue
        ///
        /// Do not push elements other than 0 and 1!
        /// Callers drain the queue with `try_flush` after every push, so it never overflows.
        pub fn push(&mut self, bit: u8) {
            debug_assert!(!self.is_full());
            self.t = (self.t << 1) | bit;
            self.count += 1;
        }

        /// Pop the oldest bit, `None` if the queue is empty
        pub fn pop(&mut self) -> Option<u8> {
            if self.is_empty() {
                return None;
            }

            self.count -= 1;
            Some((self.t >> self.count) & 1)
        }

        /// Returns the byte and empties the queue, only succeeds if full
        pub fn try_flush(&mut self) -> Option<u8> {
            if !self.is_full() {
                return None;
            }

            self.count = 0;
            Some(self.t)
        }

        /// Empties the queue into a byte padded with trailing 0s, `None` if already empty
        pub fn drain_padded(&mut self) -> Option<u8> {
            if self.is_empty() {
                return None;
            }

            let byte = self.t << (8 - self.count);
            self.count = 0;
            Some(byte)
        }

        /// Loads a whole byte and pops its most significant bit
        pub fn fill(&mut self, byte: u8) -> u8 {
            debug_assert!(self.is_empty()); // we shouldn't skip bits
            self.t = byte;
            self.count = 7;
            byte >> 7
        }

        /// Number of bits held
        pub fn len(&self) -> u8 {
            self.count
        }

        /// True if every bit still held is 0
        pub fn is_zero(&self) -> bool {
            self.is_empty() || self.t & ((1 << self.count) - 1) == 0
        }

        pub fn is_empty(&self) -> bool {
            self.count == 0
        }

        fn is_full(&self) -> bool {
            self.count == 8
        }
    }
}
