/// In memory rasters.
pub mod memory_backend;

/// Implementations for gdal
#[cfg(feature = "gdal")]
pub mod gdal_backend;

pub use memory_backend as memory;
