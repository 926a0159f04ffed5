//! Error types shared by the bitstream, the arithmetic coder and the map coder.

use thiserror::Error;

/// Everything that can go wrong while coding a quantized map
#[derive(Debug, Error)]
pub enum Error {
    /// A symbol handed to the encoder lies outside the declared alphabet
    #[error("symbol {value} at index {index} lies outside the alphabet [{min}, {max}]")]
    AlphabetViolation { index: usize, value: i32, min: i32, max: i32 },

    /// The coded bits can't have been produced by a valid encode
    #[error("corrupt stream at symbol {index}: {reason}")]
    CorruptStream { index: usize, reason: &'static str },

    /// The header is unreadable or disagrees with the caller's configuration
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// The bit reader ran past the end of the payload
    ///
    /// `index` is the symbol being decoded, if the read happened inside a map.
    #[error("input exhausted after {bits_read} bits{}", at_symbol(.index))]
    ExhaustedInput { bits_read: u64, index: Option<usize> },

    /// API misuse, e.g. encoding after flush
    #[error("invalid coder state: {0}")]
    InvalidState(&'static str),

    /// The configuration or map shape handed to the encoder is unusable
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn at_symbol(index: &Option<usize>) -> String {
    index.map(|index| format!(" while decoding symbol {index}")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;
