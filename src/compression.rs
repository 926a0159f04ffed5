/*!
Entry points: a quantized map in, one self-describing byte buffer out, and back.

# Format

```text
magic "QM" | scheme tag u8 | ndims u8 | extent u32 * ndims | bound u32 | signed u8 | scheme param u8 | coded bits
```

Integers are big endian. The header is a whole number of bytes, so the coded
bits start on a byte boundary and run until the end of the buffer, padded with
0s to a full byte.
*/

use std::{fs, path::Path};

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::config::{CoderConfig, Scheme, MAX_BOUND};
use crate::entropy_coding::{
    ac_io::{ACReader, ACWriter},
    ArithmeticCoder,
};
use crate::error::{Error, Result};
use crate::helpers::ACStats;
use crate::lossless::LosslessCoder;
use crate::map::{QuantizedMap, Shape};

pub use crate::map::MAX_ELEMENTS;

const MAGIC: [u8; 2] = *b"QM";

/// Everything the decoder needs to know before the first coded bit
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub shape: Shape,
    pub config: CoderConfig,
}

#[allow(clippy::len_without_is_empty)]
impl Header {
    pub fn new(shape: Shape, config: CoderConfig) -> Self {
        Self { shape, config }
    }

    /// Serialized size in bytes
    pub fn len(&self) -> usize {
        MAGIC.len() + 2 + 4 * self.shape.dims().len() + 4 + 2
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len());
        buf.extend_from_slice(&MAGIC);
        buf.push(self.config.scheme.tag());
        buf.push(crate::u8!(self.shape.dims().len()));
        for &extent in self.shape.dims() {
            buf.extend_from_slice(&crate::u32!(extent).to_be_bytes());
        }
        buf.extend_from_slice(&self.config.bound.to_be_bytes());
        buf.push(u8::from(self.config.signed));
        buf.push(self.config.scheme.param());
        buf
    }

    /// Parses and validates a header, returns it with the coded bits that follow
    pub fn parse(bytes: &[u8]) -> Result<(Self, &[u8])> {
        let mut rest = bytes;

        if take::<2>(&mut rest, "magic")? != MAGIC {
            return Err(malformed("not a quantized map payload"));
        }
        let [tag] = take::<1>(&mut rest, "scheme tag")?;
        let [ndims] = take::<1>(&mut rest, "dimension count")?;
        if !(2..=3).contains(&ndims) {
            return Err(malformed(format!("expected 2 or 3 dimensions, found {ndims}")));
        }

        let mut dims = Vec::with_capacity(usize::from(ndims));
        for _ in 0..ndims {
            let extent = u32::from_be_bytes(take::<4>(&mut rest, "extent")?);
            if extent == 0 {
                return Err(malformed("zero extent"));
            }
            dims.push(usize::try_from(extent).map_err(|_| malformed("extent overflows"))?);
        }
        let elements = dims.iter().try_fold(1usize, |acc, &extent| acc.checked_mul(extent));
        if !elements.is_some_and(|n| n <= MAX_ELEMENTS) {
            return Err(malformed(format!("shape {dims:?} exceeds {MAX_ELEMENTS} elements")));
        }

        let bound = u32::from_be_bytes(take::<4>(&mut rest, "bound")?);
        if bound == 0 || bound > MAX_BOUND {
            return Err(malformed(format!("bound {bound} outside 1..={MAX_BOUND}")));
        }
        let signed = match take::<1>(&mut rest, "sign flag")? {
            [0] => false,
            [1] => true,
            [flag] => return Err(malformed(format!("sign flag {flag}"))),
        };
        let [param] = take::<1>(&mut rest, "scheme parameter")?;
        let scheme = Scheme::from_tag(tag, param)
            .ok_or_else(|| malformed(format!("unknown scheme {tag} with parameter {param}")))?;

        let config = CoderConfig { bound, signed, scheme };
        config.validate().map_err(|err| malformed(err.to_string()))?;
        let shape = Shape::new(&dims).map_err(|err| malformed(err.to_string()))?;

        trace!(dims = ?shape.dims(), bound, signed, ?scheme, "parsed header");
        Ok((Self { shape, config }, rest))
    }

    /// The caller's configuration has to match the one the payload was coded with
    pub fn check_against(&self, config: &CoderConfig) -> Result<()> {
        if self.config != *config {
            return Err(malformed(format!(
                "payload was coded with {:?}, expected {:?}",
                self.config, config
            )));
        }
        Ok(())
    }
}

fn malformed(reason: impl Into<String>) -> Error {
    Error::MalformedHeader(reason.into())
}

fn take<const N: usize>(rest: &mut &[u8], what: &str) -> Result<[u8; N]> {
    if rest.len() < N {
        return Err(malformed(format!("truncated before {what}")));
    }
    let (head, tail) = rest.split_at(N);
    *rest = tail;
    let mut field = [0; N];
    field.copy_from_slice(head);
    Ok(field)
}

/// Compresses `map` into a header followed by the coded bits
pub fn encode(map: &QuantizedMap, config: &CoderConfig) -> Result<Vec<u8>> {
    let mut coder = LosslessCoder::new(config)?;
    let header = Header::new(map.shape().clone(), *config);
    let mut ac = ArithmeticCoder::new_coder(ACWriter::new(header.to_bytes()));
    coder.encode(map, &mut ac)?;
    ac.flush()?;
    let bytes = ac.into_inner().into_bytes();

    debug!(
        dims = ?map.shape().dims(),
        bytes = bytes.len(),
        contexts = coder.table().touched(),
        "encoded quantized map"
    );
    Ok(bytes)
}

/// Reconstructs the map from `bytes`, which must have been coded with `config`
pub fn decode(bytes: &[u8], config: &CoderConfig) -> Result<QuantizedMap> {
    let (header, payload) = Header::parse(bytes)?;
    header.check_against(config)?;
    decode_payload(header, payload)
}

/// Reconstructs the map with whatever configuration the header declares
pub fn decode_with_header(bytes: &[u8]) -> Result<QuantizedMap> {
    let (header, payload) = Header::parse(bytes)?;
    decode_payload(header, payload)
}

fn decode_payload(header: Header, payload: &[u8]) -> Result<QuantizedMap> {
    let mut coder = LosslessCoder::new(&header.config)?;
    let mut ac = ArithmeticCoder::new_decoder(ACReader::new(payload))?;
    let data = coder.decode(&header.shape, &mut ac)?;
    ac.finish(data.len())?;

    debug!(dims = ?header.shape.dims(), bytes = payload.len(), "decoded quantized map");
    QuantizedMap::new(header.shape, data)
}

/// Size of the coded bits `encode` would produce, header excluded, without building the buffer
pub fn estimate_bits(map: &QuantizedMap, config: &CoderConfig) -> Result<u64> {
    let mut coder = LosslessCoder::new(config)?;
    let mut ac = ArithmeticCoder::new_coder(ACStats::new());
    coder.encode(map, &mut ac)?;
    ac.flush()?;
    Ok(ac.into_inner().bits())
}

/// Compresses independent maps in parallel, one coder pass per map
pub fn encode_batch(maps: &[QuantizedMap], config: &CoderConfig) -> Result<Vec<Vec<u8>>> {
    maps.par_iter().map(|map| encode(map, config)).collect()
}

/// Inverse of `encode_batch`, fails if any payload fails
pub fn decode_batch<B>(payloads: &[B], config: &CoderConfig) -> Result<Vec<QuantizedMap>>
where
    B: AsRef<[u8]> + Sync,
{
    payloads.par_iter().map(|bytes| decode(bytes.as_ref(), config)).collect()
}

/// Compresses `map` and writes the payload to `path`, returns the payload size
pub fn encode_to_path(map: &QuantizedMap, config: &CoderConfig, path: impl AsRef<Path>) -> Result<usize> {
    let bytes = encode(map, config)?;
    fs::write(path, &bytes)?;
    Ok(bytes.len())
}

pub fn decode_from_path(path: impl AsRef<Path>, config: &CoderConfig) -> Result<QuantizedMap> {
    let bytes = fs::read(path)?;
    decode(&bytes, config)
}
