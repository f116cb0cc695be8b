use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    buffer::Buffer,
    components::{
        bounds::PixelWindow,
        profile::{OutputProfile, SourceProfile, DEFAULT_BLOCK_SIZE},
        sink::{RasterDriver, RasterSink},
        source::{read_boundless, RasterSource},
        transforms::GeoTransform,
        DataType,
    },
    errors::{MergeError, Result},
};

pub const MEMORY_DRIVER: &str = "MEM";

/// Raster held in a `(bands, rows, cols)` buffer.
///
/// Works both as a source and as a merge output. Reads are counted.
#[derive(Debug)]
pub struct MemRaster<T: DataType> {
    description: String,
    transform: GeoTransform,
    data: Buffer<T, 3>,
    profile: SourceProfile,
    /// (rows, cols) of each block.
    block_shape: (usize, usize),
    reads: AtomicUsize,
}

impl<T: DataType> MemRaster<T> {
    pub fn new(transform: GeoTransform, data: Buffer<T, 3>) -> Self {
        let [count, ..] = data.shape();
        Self {
            description: MEMORY_DRIVER.to_string(),
            transform,
            data,
            profile: SourceProfile::new(MEMORY_DRIVER, T::NAME, count),
            block_shape: (DEFAULT_BLOCK_SIZE, DEFAULT_BLOCK_SIZE),
            reads: AtomicUsize::new(0),
        }
    }

    /// `data` laid out as `(count, rows, cols)`.
    pub fn from_vec(transform: GeoTransform, shape: [usize; 3], data: Vec<T>) -> Result<Self> {
        Ok(Self::new(transform, Buffer::from_vec(shape, data)?))
    }

    pub fn zeros(transform: GeoTransform, shape: (usize, usize), count: usize) -> Self {
        Self::new(transform, Buffer::new_zeroed([count, shape.0, shape.1]))
    }

    /// Every band set to its value in `values`.
    pub fn filled(transform: GeoTransform, shape: (usize, usize), values: impl AsRef<[T]>) -> Self {
        let values = values.as_ref();
        let mut raster = Self::zeros(transform, shape, values.len());
        for (band, value) in values.iter().enumerate() {
            raster.data.band_mut(band).fill(*value);
        }
        raster
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// (rows, cols) of the blocks handed out as a sink.
    pub fn with_block_shape(mut self, block_shape: (usize, usize)) -> Self {
        self.block_shape = block_shape;
        self.profile.block_size = Some((block_shape.1, block_shape.0));
        self
    }

    pub fn profile_mut(&mut self) -> &mut SourceProfile {
        &mut self.profile
    }

    pub fn data(&self) -> &Buffer<T, 3> {
        &self.data
    }

    pub fn band(&self, index: usize) -> &[T] {
        self.data.band(index)
    }

    pub fn set_band(&mut self, index: usize, values: &[T]) {
        self.data.band_mut(index).copy_from_slice(values)
    }

    /// Number of window reads served as a source.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl<T: DataType> RasterSource<T> for MemRaster<T> {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn shape(&self) -> (usize, usize) {
        let [_, rows, cols] = self.data.shape();
        (rows, cols)
    }

    fn transform(&self) -> GeoTransform {
        self.transform
    }

    fn count(&self) -> usize {
        self.data.shape()[0]
    }

    fn profile(&self) -> SourceProfile {
        self.profile.clone()
    }

    fn read_window(&self, window: &PixelWindow, bands: usize, slice: &mut [T]) -> Result<()> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let (_, cols) = self.shape();
        let bands = bands.min(self.count());
        read_boundless(self.shape(), window, bands, slice, |band, clipped, buff| {
            let data = self.data.band(band);
            let clip_cols = clipped.shape().1;
            for (row, buff_row) in (clipped.rows.0..clipped.rows.1).zip(buff.chunks_exact_mut(clip_cols)) {
                let start = row as usize * cols + clipped.cols.0 as usize;
                buff_row.copy_from_slice(&data[start..start + clip_cols]);
            }
            Ok(())
        })
    }
}

impl<T: DataType> RasterSink<T> for MemRaster<T> {
    fn block_windows(&self) -> Result<Vec<PixelWindow>> {
        Ok(PixelWindow::tiles(self.shape(), self.block_shape))
    }

    fn write_window(&mut self, window: &PixelWindow, buffer: &Buffer<T, 3>) -> Result<()> {
        let shape = self.shape();
        if !window.within(shape) {
            return Err(MergeError::WindowOutOfRange {
                window: *window,
                shape,
            });
        }
        let (rows, cols) = window.shape();
        let [count, ..] = buffer.shape();
        if buffer.shape() != [self.count(), rows, cols] {
            return Err(MergeError::BufferShape {
                len: buffer.len(),
                shape: vec![self.count(), rows, cols],
            });
        }
        let (row_off, col_off) = (window.rows.0 as usize, window.cols.0 as usize);
        for band in 0..count {
            let data = self.data.band_mut(band);
            for (row, buff_row) in buffer.band(band).chunks_exact(cols).enumerate() {
                let start = (row_off + row) * shape.1 + col_off;
                data[start..start + cols].copy_from_slice(buff_row);
            }
        }
        Ok(())
    }
}

/// Creates [MemRaster] outputs.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemDriver;

impl<T: DataType> RasterDriver<T> for MemDriver {
    type Sink = MemRaster<T>;

    fn create(&self, profile: &OutputProfile) -> Result<MemRaster<T>> {
        if profile.data_type != T::NAME {
            return Err(MergeError::DataTypeMismatch {
                expected: T::NAME,
                found: profile.data_type.clone(),
            });
        }
        let (block_x, block_y) = profile
            .block_size
            .unwrap_or((DEFAULT_BLOCK_SIZE, DEFAULT_BLOCK_SIZE));
        let mut raster = MemRaster::zeros(profile.transform, profile.shape(), profile.count)
            .with_block_shape((block_y, block_x));
        raster.profile = SourceProfile {
            driver: profile.driver.clone(),
            data_type: profile.data_type.clone(),
            count: profile.count,
            nodata: profile.nodata,
            tiled: profile.tiled,
            block_size: Some((block_x, block_y)),
            compress: profile.compress.clone(),
            creation_options: profile.creation_options.clone(),
        };
        Ok(raster)
    }
}
