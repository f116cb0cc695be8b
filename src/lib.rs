//! Windowed merging of RGBA raster mosaics.
//!
//! Output is produced block by block following the destination tiling. For each
//! block, sources are consulted in input order and a pixel is taken from the
//! first source whose alpha band is non-zero there. Once a block is fully
//! covered the remaining sources are skipped.

mod buffer;
pub mod cli;
mod components;
mod errors;
mod intersection;
mod merge;

pub use buffer::Buffer;
pub use components::{
    backends, BlockReport, DataType, DestinationGrid, GeoBounds, GeoTransform, LogObserver,
    MergeObserver, MergeOptions, MergeSummary, Merger, OutputProfile, PixelWindow,
    ProfileOverrides, RasterDriver, RasterSink, RasterSource, ReadStrategy, Resolution, RoundOp,
    SourceProfile,
};
pub use errors::{MergeError, Result, ValidationError};
pub use merge::{merge, resolve_profile, Merged};
