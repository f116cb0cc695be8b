use std::fmt::Debug;

use crate::{
    components::{
        bounds::{GeoBounds, PixelWindow},
        profile::SourceProfile,
        transforms::GeoTransform,
        DataType,
    },
    errors::Result,
};

/// Read only access to an input raster.
pub trait RasterSource<T: DataType>: Debug + Send + Sync {
    fn description(&self) -> String;
    /// (rows, cols)
    fn shape(&self) -> (usize, usize);
    fn transform(&self) -> GeoTransform;
    fn count(&self) -> usize;
    fn profile(&self) -> SourceProfile;

    /// Boundless read of the first `bands` bands of `window` into `slice`,
    /// laid out as `(bands, rows, cols)`. Pixels outside the raster are zero.
    fn read_window(&self, window: &PixelWindow, bands: usize, slice: &mut [T]) -> Result<()>;

    fn bounds(&self) -> GeoBounds {
        GeoBounds::from_transform(&self.transform(), self.shape())
    }

    fn resolution(&self) -> (f64, f64) {
        self.transform().resolution()
    }
}

impl<T: DataType, S: RasterSource<T> + ?Sized> RasterSource<T> for Box<S> {
    fn description(&self) -> String {
        (**self).description()
    }
    fn shape(&self) -> (usize, usize) {
        (**self).shape()
    }
    fn transform(&self) -> GeoTransform {
        (**self).transform()
    }
    fn count(&self) -> usize {
        (**self).count()
    }
    fn profile(&self) -> SourceProfile {
        (**self).profile()
    }
    fn read_window(&self, window: &PixelWindow, bands: usize, slice: &mut [T]) -> Result<()> {
        (**self).read_window(window, bands, slice)
    }
}

/// Copies the part of `window` that overlaps a `(rows, cols)` raster.
///
/// `read` receives the clipped window and a row-major buffer for one band and
/// fills it, the rest of `slice` stays zero.
pub(crate) fn read_boundless<T: DataType>(
    shape: (usize, usize),
    window: &PixelWindow,
    bands: usize,
    slice: &mut [T],
    mut read: impl FnMut(usize, &PixelWindow, &mut [T]) -> Result<()>,
) -> Result<()> {
    slice.fill(T::zero());
    let clipped = PixelWindow::new(
        (window.rows.0.max(0), window.rows.1.min(shape.0 as isize)),
        (window.cols.0.max(0), window.cols.1.min(shape.1 as isize)),
    );
    if clipped.area() == 0 {
        return Ok(());
    }
    let (rows, cols) = window.shape();
    let clip_cols = clipped.shape().1;
    let row_shift = (clipped.rows.0 - window.rows.0) as usize;
    let col_shift = (clipped.cols.0 - window.cols.0) as usize;
    let mut band_buff = vec![T::zero(); clipped.area()];
    for (band, band_slice) in slice.chunks_exact_mut(rows * cols).take(bands).enumerate() {
        read(band, &clipped, &mut band_buff)?;
        for (row, clipped_row) in band_buff.chunks_exact(clip_cols).enumerate() {
            let start = (row + row_shift) * cols + col_shift;
            band_slice[start..start + clip_cols].copy_from_slice(clipped_row);
        }
    }
    Ok(())
}
