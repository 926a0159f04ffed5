use super::{ACRead, ACWrite};
use crate::bit_io::{BitReader, BitWriter};
use crate::error::Result;

/// Reads the arithmetic coder's input bits from a byte slice
pub struct ACReader<'a> {
    reader: BitReader<'a>,
}

impl<'a> ACReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { reader: BitReader::new(bytes) }
    }

    pub fn bits_read(&self) -> u64 {
        self.reader.bits_read()
    }
}

impl ACRead for ACReader<'_> {
    fn read_bit(&mut self) -> Result<u8> {
        self.reader.read_bit()
    }

    fn ensure_drained(&self, index: usize) -> Result<()> {
        self.reader.ensure_drained(index)
    }
}

/// Bits whose value is only known once the next resolved bit arrives
///
/// An E3 rescale means the interval straddles the middle: the next emitted bit
/// `b` decides the side, and every pending bit is then the opposite `b ^ 1`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PendingBits {
    count: u64,
}

impl PendingBits {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn push(&mut self) {
        self.count += 1;
    }

    pub fn len(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Emits `bit` followed by all pending bits (inverted) and clears the counter
    pub fn resolve(&mut self, bit: u8, mut emit: impl FnMut(u8)) {
        emit(bit);
        while self.count > 0 {
            self.count -= 1;
            emit(bit ^ 1);
        }
    }
}

/// Writes the arithmetic coder's output bits to a byte buffer
pub struct ACWriter {
    writer: BitWriter,
    pending: PendingBits,
}

impl ACWriter {
    /// Coded bits are appended after the bytes already in `prefix` (e.g. a header)
    pub fn new(prefix: Vec<u8>) -> Self {
        Self { writer: BitWriter::new(prefix), pending: PendingBits::new() }
    }

    pub fn bits_written(&self) -> u64 {
        self.writer.bits_written()
    }

    /// Pads to a byte boundary and returns the buffer
    pub fn into_bytes(self) -> Vec<u8> {
        debug_assert!(self.pending.is_empty(), "pending bits left, was the coder flushed?");
        self.writer.flush()
    }
}

impl ACWrite for ACWriter {
    fn write_bit(&mut self, bit: u8) -> Result<()> {
        debug_assert!(bit <= 1, "Provided value wasn't a valid bit");
        let writer = &mut self.writer;
        self.pending.resolve(bit, |b| writer.write_bit(b));
        Ok(())
    }

    #[inline(always)]
    fn inc_parity(&mut self) {
        self.pending.push();
    }
}

#[cfg(test)]
mod tests {
    use super::{ACReader, ACWriter, PendingBits};
    use crate::entropy_coding::{ACRead, ACWrite};

    #[test]
    fn pending_bits_resolve_inverted() {
        let mut pending = PendingBits::new();
        let mut out = Vec::new();
        pending.resolve(0, |b| out.push(b));
        assert_eq!(out, [0]);

        (0..3).for_each(|_| pending.push());
        assert_eq!(pending.len(), 3);
        pending.resolve(1, |b| out.push(b));
        assert_eq!(out, [0, 1, 0, 0, 0]);
        assert!(pending.is_empty());

        pending.push();
        pending.resolve(0, |b| out.push(b));
        assert_eq!(out, [0, 1, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn writer_emits_parity_after_resolved_bit() {
        let mut writer = ACWriter::new(Vec::new());
        writer.inc_parity();
        writer.inc_parity();
        writer.write_bit(0).unwrap(); // 011
        writer.write_bit(1).unwrap(); // 0111
        writer.inc_parity();
        writer.write_bit(1).unwrap(); // 0111 10
        assert_eq!(writer.bits_written(), 6);
        assert_eq!(writer.into_bytes(), [0b0111_1000]);
    }

    #[test]
    fn flush_writes_full_state() {
        let mut writer = ACWriter::new(vec![0x42]);
        writer.inc_parity();
        writer.flush(0x8000_0000).unwrap();
        // 1, one parity 0, then 31 zeroes
        assert_eq!(writer.bits_written(), 8 + 33);
        assert_eq!(writer.into_bytes(), [0x42, 0x80, 0, 0, 0, 0]);
    }

    #[test]
    fn reader_reads_u32_big_endian() {
        let data = [0xDE, 0xAD, 0xBE, 0xEF, 0x80];
        let mut reader = ACReader::new(&data);
        assert_eq!(reader.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_bit().unwrap(), 1);
        assert_eq!(reader.bits_read(), 33);
        reader.ensure_drained(0).unwrap();
    }
}
