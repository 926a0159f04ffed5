use super::Model;

/// Probability of a one, in units of 2^-16, that every estimator starts with
pub const P_HALF: u16 = 1 << 15;
/// Lowest probability an estimator will report
pub const P_MIN: u16 = 32;
/// Highest probability an estimator will report
pub const P_MAX: u16 = u16::MAX - 31;
/// Slowest adaptation rate, as a shift of the prediction error
const RATE_LIMIT: u8 = 5;

/// Shift-based exponential probability estimator
///
/// The first few updates adapt fast (shift 1, 2, ...) and settle at `RATE_LIMIT`,
/// so a fresh context converges quickly while a warm one stays stable.
/// The prediction never leaves `[P_MIN, P_MAX]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdaptiveBit {
    p: u16,
    count: u8,
}

impl AdaptiveBit {
    pub fn new() -> Self {
        Self { p: P_HALF, count: 0 }
    }
}

impl Default for AdaptiveBit {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for AdaptiveBit {
    #[inline(always)]
    fn predict(&self) -> u16 {
        self.p
    }

    fn update(&mut self, bit: u8) {
        let shift = (self.count + 1).min(RATE_LIMIT);
        let p = u32::from(self.p);
        let p = match bit {
            0 => p - (p >> shift),
            _ => p + (((1 << u16::BITS) - p) >> shift),
        };
        self.p = crate::u16!(p.clamp(u32::from(P_MIN), u32::from(P_MAX)));
        self.count = (self.count + 1).min(RATE_LIMIT);
    }
}
