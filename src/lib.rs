//! Lossless entropy coding of quantized autoencoder feature maps.
//!
//! ```
//! use latentac::{decode, encode, CoderConfig, QuantizedMap};
//!
//! let map = QuantizedMap::from_2d(2, 3, vec![0, 1, -2, 0, 0, 3]).unwrap();
//! let config = CoderConfig::new(3);
//! let bytes = encode(&map, &config).unwrap();
//! assert_eq!(decode(&bytes, &config).unwrap(), map);
//! ```

pub mod bit_io;
pub mod compression;
pub mod config;
pub mod counters;
pub mod entropy_coding;
pub mod error;
pub mod helpers;
pub mod lossless;
pub mod macros;
pub mod map;

pub use compression::{decode, decode_with_header, encode, Header};
pub use config::{CoderConfig, Scheme};
pub use error::{Error, Result};
pub use map::{QuantizedMap, Shape};
