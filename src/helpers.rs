use crate::entropy_coding::ACWrite;
use crate::error::Result;

/// Counts the bits an arithmetic coder would write, without writing them
#[derive(Debug, Default)]
pub struct ACStats {
    bit_count: u64,
    rev_bits: u64,
}

impl ACStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coded bits so far, pending parity bits not included
    pub fn bits(&self) -> u64 {
        self.bit_count
    }

    /// Bytes in compressed size roughly
    pub fn result(&self) -> u64 {
        self.bit_count.div_ceil(8)
    }
}

impl ACWrite for ACStats {
    fn inc_parity(&mut self) {
        self.rev_bits += 1;
    }

    fn write_bit(&mut self, _bit: u8) -> Result<()> {
        self.bit_count += 1 + self.rev_bits;
        self.rev_bits = 0;
        Ok(())
    }
}
