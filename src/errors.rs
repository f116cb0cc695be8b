use std::path::PathBuf;

use crate::components::PixelWindow;

pub type Result<T> = std::result::Result<T, MergeError>;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Inputs must be 4-band RGBA rasters, source {index} ({description}) has {count} bands")]
    NotRgba {
        index: usize,
        description: String,
        count: usize,
    },
    #[error("At least one input raster is required")]
    NoSources,
    #[error("Output needs an alpha band as band 4, only {count} bands available")]
    MissingAlpha { count: usize },
    #[error("Resolution must be one or two positive values, got {0:?}")]
    InvalidResolution(Vec<f64>),
    #[error("Bounds {0:?} are not ordered as west south east north")]
    InvalidBounds([f64; 4]),
    #[error("Bounds need four values, got {0:?}")]
    BoundsLength(Vec<f64>),
}

#[derive(thiserror::Error, Debug)]
pub enum MergeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[cfg(feature = "gdal")]
    #[error(transparent)]
    Gdal(#[from] gdal::errors::GdalError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Buffer of length {len} can not hold shape {shape:?}")]
    BufferShape { len: usize, shape: Vec<usize> },
    #[error("Transform is not invertible")]
    NonInvertibleTransform,
    #[error("Window {window:?} is outside of raster with shape {shape:?}")]
    WindowOutOfRange {
        window: PixelWindow,
        shape: (usize, usize),
    },
    #[error("Raster data type {found} does not match requested {expected}")]
    DataTypeMismatch {
        expected: &'static str,
        found: String,
    },
    #[error("Invalid creation option {0:?}, expected KEY=VALUE")]
    CreationOption(String),
    #[error("Output {0:?} exists and won't be overwritten without the `-f` option")]
    OutputExists(PathBuf),
}
