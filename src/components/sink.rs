use crate::{
    buffer::Buffer,
    components::{bounds::PixelWindow, profile::OutputProfile, DataType},
    errors::Result,
};

/// Writable output raster.
pub trait RasterSink<T: DataType> {
    /// Native block layout, each window is written exactly once.
    fn block_windows(&self) -> Result<Vec<PixelWindow>>;

    /// Writes a `(bands, rows, cols)` buffer at `window`.
    fn write_window(&mut self, window: &PixelWindow, buffer: &Buffer<T, 3>) -> Result<()>;
}

/// Creates output rasters from a resolved profile.
pub trait RasterDriver<T: DataType> {
    type Sink: RasterSink<T>;

    fn create(&self, profile: &OutputProfile) -> Result<Self::Sink>;
}
