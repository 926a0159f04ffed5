mod adaptive_bit;

pub use self::adaptive_bit::*;

/// A binary model: predicts the probability of the next bit being a one
/// and adapts once the bit is known
pub trait Model {
    /// P(bit = 1) in units of 2^-16
    fn predict(&self) -> u16;
    fn update(&mut self, bit: u8);
}
