use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    components::{
        bounds::GeoBounds, profile::ProfileOverrides, source::RasterSource,
        transforms::GeoTransform, validation::validate_rgba, DataType,
    },
    errors::{Result, ValidationError},
};

/// Decimal places used to snap coordinates onto pixel indices.
pub const DEFAULT_PRECISION: u32 = 7;

/// Requested output pixel size.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Resolution {
    /// Pixel size of the first source.
    #[default]
    Native,
    Scalar(f64),
    /// One value is used for both axes, two are taken as (x, y).
    Sequence(Vec<f64>),
}

impl Resolution {
    pub fn resolve(&self, native: (f64, f64)) -> Result<(f64, f64)> {
        let resolution = match self {
            Resolution::Native => native,
            Resolution::Scalar(res) => (*res, *res),
            Resolution::Sequence(values) => match values.as_slice() {
                [res] => (*res, *res),
                [x, y] => (*x, *y),
                _ => Err(ValidationError::InvalidResolution(values.clone()))?,
            },
        };
        if !(resolution.0 > 0. && resolution.1 > 0.) {
            Err(ValidationError::InvalidResolution(vec![
                resolution.0,
                resolution.1,
            ]))?
        }
        Ok(resolution)
    }
}

impl From<f64> for Resolution {
    fn from(value: f64) -> Self {
        Resolution::Scalar(value)
    }
}

/// Everything that shapes a merge besides its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeOptions {
    /// `[west, south, east, north]`, derived from the sources when unset.
    pub bounds: Option<[f64; 4]>,
    pub resolution: Resolution,
    pub precision: u32,
    pub overrides: ProfileOverrides,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            bounds: None,
            resolution: Resolution::Native,
            precision: DEFAULT_PRECISION,
            overrides: ProfileOverrides::default(),
        }
    }
}

/// Geometry of the output raster.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationGrid {
    /// Pixel exact extent, east and south may overshoot the request.
    pub bounds: GeoBounds,
    pub resolution: (f64, f64),
    pub transform: GeoTransform,
    pub width: usize,
    pub height: usize,
}

impl DestinationGrid {
    /// Smallest grid anchored at the top left of `bounds` that covers it.
    pub fn new(bounds: GeoBounds, resolution: (f64, f64)) -> Self {
        Self::with_precision(bounds, resolution, DEFAULT_PRECISION)
    }

    /// As [DestinationGrid::new], pixel counts within `precision` decimals of
    /// an integer are taken as that integer.
    pub fn with_precision(bounds: GeoBounds, resolution: (f64, f64), precision: u32) -> Self {
        let (west, north) = (bounds.west(), bounds.north());
        let transform = GeoTransform::from_origin(west, north, resolution);
        debug!("Output transform: {:?}", transform.to_gdal());

        let width = covering_pixels(bounds.east() - west, resolution.0, precision);
        let height = covering_pixels(north - bounds.south(), resolution.1, precision);
        let (east, south) = transform.xy(width as f64, height as f64);
        debug!("Output width: {width}, height: {height}");

        let bounds = GeoBounds::new(west, south, east, north);
        debug!("Adjusted bounds: {:?}", bounds.as_array());
        Self {
            bounds,
            resolution,
            transform,
            width,
            height,
        }
    }

    /// Grid from explicit bounds or the union of all sources.
    ///
    /// Source bounds are only scanned, and checked for RGBA, when no bounds
    /// are given.
    pub fn resolve<T: DataType, S: RasterSource<T>>(
        sources: &[S],
        options: &MergeOptions,
    ) -> Result<Self> {
        let first = sources.first().ok_or(ValidationError::NoSources)?;
        let bounds = match options.bounds {
            Some(bounds) => {
                let [west, south, east, north] = bounds;
                if !(west <= east && south <= north) {
                    Err(ValidationError::InvalidBounds(bounds))?
                }
                GeoBounds::new(west, south, east, north)
            }
            None => {
                validate_rgba(sources)?;
                sources
                    .iter()
                    .map(|source| source.bounds())
                    .reduce(|union, bounds| union.union(&bounds))
                    .ok_or(ValidationError::NoSources)?
            }
        };
        debug!("Output bounds: {:?}", bounds.as_array());

        let resolution = options.resolution.resolve(first.resolution())?;
        Ok(Self::with_precision(bounds, resolution, options.precision))
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }
}

/// Pixels of size `resolution` needed to span `extent`, at least one.
fn covering_pixels(extent: f64, resolution: f64, precision: u32) -> usize {
    let pixels = extent / resolution;
    let scale = 10f64.powi(precision as i32);
    let snapped = (pixels * scale).round() / scale;
    let pixels = if snapped.is_finite() { snapped } else { pixels };
    (pixels.ceil() as usize).max(1)
}
