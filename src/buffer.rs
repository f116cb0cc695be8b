use crate::{
    components::DataType,
    errors::{MergeError, Result},
};

/// Row-major, band-major pixel storage of shape `(bands, rows, cols)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer<T, const ND: usize> {
    data: Box<[T]>,
    shape: [usize; ND],
}

impl<T: DataType, const ND: usize> Buffer<T, ND> {
    pub fn new_zeroed(shape: [usize; ND]) -> Self {
        Self {
            data: vec![T::zero(); shape.iter().product()].into_boxed_slice(),
            shape,
        }
    }

    pub fn from_vec(shape: [usize; ND], data: Vec<T>) -> Result<Self> {
        if data.len() != shape.iter().product::<usize>() {
            return Err(MergeError::BufferShape {
                len: data.len(),
                shape: shape.to_vec(),
            });
        }
        Ok(Self {
            data: data.into_boxed_slice(),
            shape,
        })
    }
}

impl<T, const ND: usize> Buffer<T, ND> {
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn shape(&self) -> [usize; ND] {
        self.shape
    }
}

impl<T> Buffer<T, 3> {
    /// Pixels per band.
    pub fn band_len(&self) -> usize {
        self.shape[1] * self.shape[2]
    }

    pub fn band(&self, index: usize) -> &[T] {
        let len = self.band_len();
        &self.data[index * len..(index + 1) * len]
    }

    pub fn band_mut(&mut self, index: usize) -> &mut [T] {
        let len = self.band_len();
        &mut self.data[index * len..(index + 1) * len]
    }
}
