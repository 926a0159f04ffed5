use crate::error::{Error, Result};

/// Largest supported alphabet bound
pub const MAX_BOUND: u32 = 1 << 20;
/// Largest bound the pure unary scheme accepts, it codes up to `bound` flags per symbol
pub const MAX_UNARY_BOUND: u32 = 256;

/// How a magnitude is turned into binary decisions
///
/// Picked once per map and recorded in the header by its tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Truncated unary: one context-coded "greater than k" flag per step up to the bound
    Unary,
    /// Truncated unary up to `unary_len`, then an Exp-Golomb escape for the remainder
    UnaryExpGolomb { unary_len: u8 },
}

impl Scheme {
    pub fn tag(self) -> u8 {
        match self {
            Scheme::Unary => 1,
            Scheme::UnaryExpGolomb { .. } => 2,
        }
    }

    pub fn param(self) -> u8 {
        match self {
            Scheme::Unary => 0,
            Scheme::UnaryExpGolomb { unary_len } => unary_len,
        }
    }

    /// Inverse of `tag`/`param`, `None` for unknown or inconsistent pairs
    pub fn from_tag(tag: u8, param: u8) -> Option<Self> {
        match (tag, param) {
            (1, 0) => Some(Scheme::Unary),
            (2, unary_len) if unary_len > 0 => Some(Scheme::UnaryExpGolomb { unary_len }),
            _ => None,
        }
    }
}

impl Default for Scheme {
    fn default() -> Self {
        Scheme::UnaryExpGolomb { unary_len: 8 }
    }
}

/// Everything both sides have to agree on besides the map itself
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CoderConfig {
    /// Largest magnitude a symbol may have
    pub bound: u32,
    /// Symbols lie in `[-bound, bound]` if set, `[0, bound]` otherwise
    pub signed: bool,
    pub scheme: Scheme,
}

impl CoderConfig {
    /// Signed alphabet `[-bound, bound]` with the default scheme
    pub fn new(bound: u32) -> Self {
        Self { bound, ..Self::default() }
    }

    pub fn unsigned(mut self) -> Self {
        self.signed = false;
        self
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Smallest allowed symbol
    pub fn min_symbol(&self) -> i32 {
        if self.signed { -self.max_symbol() } else { 0 }
    }

    /// Largest allowed symbol
    pub fn max_symbol(&self) -> i32 {
        i32::try_from(self.bound).unwrap_or(i32::MAX)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bound == 0 || self.bound > MAX_BOUND {
            return Err(Error::InvalidConfig(format!(
                "bound {} outside 1..={MAX_BOUND}",
                self.bound
            )));
        }
        match self.scheme {
            Scheme::Unary if self.bound > MAX_UNARY_BOUND => Err(Error::InvalidConfig(format!(
                "unary scheme supports bounds up to {MAX_UNARY_BOUND}, got {}",
                self.bound
            ))),
            Scheme::UnaryExpGolomb { unary_len: 0 } => {
                Err(Error::InvalidConfig("unary_len must be positive".to_string()))
            }
            _ => Ok(()),
        }
    }
}

impl Default for CoderConfig {
    fn default() -> Self {
        Self { bound: 8, signed: true, scheme: Scheme::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::{CoderConfig, Scheme, MAX_BOUND};

    #[test]
    fn scheme_tags_round_trip() {
        for scheme in [Scheme::Unary, Scheme::UnaryExpGolomb { unary_len: 1 }, Scheme::default()] {
            assert_eq!(Scheme::from_tag(scheme.tag(), scheme.param()), Some(scheme));
        }
        assert_eq!(Scheme::from_tag(1, 3), None);
        assert_eq!(Scheme::from_tag(2, 0), None);
        assert_eq!(Scheme::from_tag(9, 1), None);
    }

    #[test]
    fn validation() {
        assert!(CoderConfig::default().validate().is_ok());
        assert!(CoderConfig::new(0).validate().is_err());
        assert!(CoderConfig::new(MAX_BOUND).validate().is_ok());
        assert!(CoderConfig::new(MAX_BOUND + 1).validate().is_err());
        assert!(CoderConfig::new(300).with_scheme(Scheme::Unary).validate().is_err());
        assert!(CoderConfig::new(3).with_scheme(Scheme::UnaryExpGolomb { unary_len: 0 }).validate().is_err());
    }

    #[test]
    fn symbol_range() {
        let cfg = CoderConfig::new(5);
        assert_eq!((cfg.min_symbol(), cfg.max_symbol()), (-5, 5));
        let cfg = cfg.unsigned();
        assert_eq!((cfg.min_symbol(), cfg.max_symbol()), (0, 5));
    }
}
