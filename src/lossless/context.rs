use crate::counters::AdaptiveBit;
use crate::map::Shape;

/// Neighbor classes, `min(|left|, 2) + min(|above|, 2)`
const CLASSES: usize = 5;
/// Sign patterns of (left, above), 3 x 3
const SIGN_PATTERNS: usize = 9;
/// Unary steps past this one share their context
pub const MAX_GREATER_STEP: u32 = 16;
/// Escape prefix positions past this one share their context
const MAX_ESCAPE_PREFIX: u32 = 24;

const ZERO_BASE: usize = 0;
const SIGN_BASE: usize = ZERO_BASE + CLASSES;
const GREATER_BASE: usize = SIGN_BASE + SIGN_PATTERNS;
const ESCAPE_BASE: usize = GREATER_BASE + MAX_GREATER_STEP as usize * CLASSES;
const TABLE_LEN: usize = ESCAPE_BASE + MAX_ESCAPE_PREFIX as usize;

/// Selects the estimator for one binary decision
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Context {
    /// Is the symbol nonzero
    Zero { class: u8 },
    /// Is the symbol negative, `pattern` encodes the neighbors' signs
    Sign { pattern: u8 },
    /// Is the magnitude greater than `step`
    Greater { step: u32, class: u8 },
    /// Does the Exp-Golomb prefix continue past position `prefix`
    Escape { prefix: u32 },
}

impl Context {
    pub fn index(self) -> usize {
        match self {
            Context::Zero { class } => ZERO_BASE + usize::from(class),
            Context::Sign { pattern } => SIGN_BASE + usize::from(pattern),
            Context::Greater { step, class } => {
                let step = crate::usize!(step.clamp(1, MAX_GREATER_STEP) - 1);
                GREATER_BASE + step * CLASSES + usize::from(class)
            }
            Context::Escape { prefix } => {
                ESCAPE_BASE + crate::usize!(prefix.min(MAX_ESCAPE_PREFIX - 1))
            }
        }
    }
}

/// The already-resolved neighbors of an element, missing ones count as 0
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Neighbors {
    pub left: i32,
    pub above: i32,
}

impl Neighbors {
    /// Looks up the left and above neighbors of `index` within its channel
    ///
    /// Only `data[..index]` is consulted, so the decoder can call this on a
    /// partially decoded buffer and get the same answer as the encoder.
    pub fn causal(data: &[i32], shape: &Shape, index: usize) -> Self {
        let width = shape.width();
        let col = index % width;
        let row = (index / width) % shape.height();

        let left = if col > 0 { data[index - 1] } else { 0 };
        let above = if row > 0 { data[index - width] } else { 0 };
        Self { left, above }
    }

    pub fn class(self) -> u8 {
        let clip = |v: i32| v.unsigned_abs().min(2);
        crate::u8!(clip(self.left) + clip(self.above))
    }

    pub fn sign_pattern(self) -> u8 {
        crate::u8!((self.left.signum() + 1) * 3 + self.above.signum() + 1)
    }
}

/// One lazily created estimator per context, owned by a single coding pass
#[derive(Clone, Debug)]
pub struct ContextTable {
    models: Vec<Option<AdaptiveBit>>,
}

impl ContextTable {
    pub fn new() -> Self {
        Self { models: vec![None; TABLE_LEN] }
    }

    /// The estimator for `ctx`, created neutral on first use
    pub fn model(&mut self, ctx: Context) -> &mut AdaptiveBit {
        self.models[ctx.index()].get_or_insert_with(AdaptiveBit::new)
    }

    /// The estimator for `ctx` if it has been used
    pub fn get(&self, ctx: Context) -> Option<&AdaptiveBit> {
        self.models[ctx.index()].as_ref()
    }

    /// Number of contexts that have been used
    pub fn touched(&self) -> usize {
        self.models.iter().filter(|model| model.is_some()).count()
    }
}

impl Default for ContextTable {
    fn default() -> Self {
        Self::new()
    }
}
