use crate::error::{Error, Result};

/// Largest number of elements a map may hold
pub const MAX_ELEMENTS: usize = 1 << 28;

/// Extents of a quantized map, 2D `[height, width]` or 3D `[channels, height, width]`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<usize>,
}

// a valid shape always holds at least one element
#[allow(clippy::len_without_is_empty)]
impl Shape {
    /// Every extent is at least 1 and the element count is at most `MAX_ELEMENTS`,
    /// so each extent also fits in a `u32`
    pub fn new(dims: &[usize]) -> Result<Self> {
        if !(2..=3).contains(&dims.len()) {
            return Err(Error::InvalidConfig(format!(
                "expected 2 or 3 dimensions, got {}",
                dims.len()
            )));
        }
        if dims.iter().any(|&extent| extent == 0) {
            return Err(Error::InvalidConfig(format!("zero extent in shape {dims:?}")));
        }
        let elements = dims.iter().try_fold(1usize, |acc, &extent| acc.checked_mul(extent));
        if !elements.is_some_and(|n| n <= MAX_ELEMENTS) {
            return Err(Error::InvalidConfig(format!(
                "shape {dims:?} exceeds {MAX_ELEMENTS} elements"
            )));
        }
        Ok(Self { dims: dims.to_vec() })
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn channels(&self) -> usize {
        if self.dims.len() == 3 { self.dims[0] } else { 1 }
    }

    pub fn height(&self) -> usize {
        self.dims[self.dims.len() - 2]
    }

    pub fn width(&self) -> usize {
        self.dims[self.dims.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }
}

/// A grid of quantized integers, stored channel-major then row-major
///
/// This is also the order in which the coder visits the elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuantizedMap {
    shape: Shape,
    data: Vec<i32>,
}

impl QuantizedMap {
    pub fn new(shape: Shape, data: Vec<i32>) -> Result<Self> {
        if shape.len() != data.len() {
            return Err(Error::InvalidConfig(format!(
                "shape {:?} holds {} elements, got {}",
                shape.dims(),
                shape.len(),
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn from_2d(height: usize, width: usize, data: Vec<i32>) -> Result<Self> {
        Self::new(Shape::new(&[height, width])?, data)
    }

    pub fn from_3d(channels: usize, height: usize, width: usize, data: Vec<i32>) -> Result<Self> {
        Self::new(Shape::new(&[channels, height, width])?, data)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn data(&self) -> &[i32] {
        &self.data
    }

    /// Element at `[channel, row, col]`, `channel` is 0 for 2D maps
    pub fn get(&self, channel: usize, row: usize, col: usize) -> Option<i32> {
        let (c, h, w) = (self.shape.channels(), self.shape.height(), self.shape.width());
        if channel >= c || row >= h || col >= w {
            return None;
        }
        Some(self.data[(channel * h + row) * w + col])
    }
}

#[cfg(test)]
mod tests {
    use super::{QuantizedMap, Shape, MAX_ELEMENTS};
    use crate::error::Error;

    #[test]
    fn shape_accessors() {
        let flat = Shape::new(&[3, 5]).unwrap();
        assert_eq!((flat.channels(), flat.height(), flat.width(), flat.len()), (1, 3, 5, 15));

        let stacked = Shape::new(&[4, 3, 5]).unwrap();
        assert_eq!((stacked.channels(), stacked.height(), stacked.width(), stacked.len()), (4, 3, 5, 60));
    }

    #[test]
    fn invalid_shapes() {
        assert!(matches!(Shape::new(&[7]), Err(Error::InvalidConfig(_))));
        assert!(matches!(Shape::new(&[1, 2, 3, 4]), Err(Error::InvalidConfig(_))));
        assert!(matches!(Shape::new(&[4, 0]), Err(Error::InvalidConfig(_))));
        assert!(matches!(Shape::new(&[usize::MAX, 2]), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn element_count_is_capped() {
        assert!(Shape::new(&[MAX_ELEMENTS, 1]).is_ok());
        assert!(Shape::new(&[4, MAX_ELEMENTS / 8, 2]).is_ok());
        assert!(matches!(Shape::new(&[MAX_ELEMENTS + 1, 1]), Err(Error::InvalidConfig(_))));
        assert!(matches!(Shape::new(&[1 << 15, 1 << 14]), Err(Error::InvalidConfig(_))));
        // a single extent beyond u32 range
        assert!(matches!(Shape::new(&[usize::MAX / 2, 1]), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn data_must_fill_shape() {
        assert!(QuantizedMap::from_2d(2, 2, vec![1, 2, 3]).is_err());
        let map = QuantizedMap::from_3d(2, 1, 2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(map.get(1, 0, 0), Some(3));
        assert_eq!(map.get(2, 0, 0), None);
    }
}
