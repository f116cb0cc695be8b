use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    components::{grid::DestinationGrid, transforms::GeoTransform},
    errors::{MergeError, Result},
};

/// Block edge used when a profile asks for tiles without giving a size.
pub const DEFAULT_BLOCK_SIZE: usize = 256;

/// Format description of an input raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProfile {
    pub driver: String,
    pub data_type: String,
    pub count: usize,
    pub nodata: Option<f64>,
    pub tiled: bool,
    /// (x, y) block size.
    pub block_size: Option<(usize, usize)>,
    pub compress: Option<String>,
    pub creation_options: BTreeMap<String, String>,
}

impl SourceProfile {
    pub fn new(driver: impl Into<String>, data_type: impl Into<String>, count: usize) -> Self {
        Self {
            driver: driver.into(),
            data_type: data_type.into(),
            count,
            nodata: None,
            tiled: false,
            block_size: None,
            compress: None,
            creation_options: BTreeMap::new(),
        }
    }
}

/// Caller supplied format options, applied after everything derived from
/// the sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileOverrides {
    pub driver: Option<String>,
    pub tiled: Option<bool>,
    pub block_x_size: Option<usize>,
    pub block_y_size: Option<usize>,
    pub compress: Option<String>,
    pub nodata: Option<f64>,
    /// Format specific options passed through untouched.
    pub creation_options: BTreeMap<String, String>,
}

impl ProfileOverrides {
    /// Parses `KEY=VALUE` pairs, later pairs win.
    pub fn parse<S: AsRef<str>>(pairs: impl IntoIterator<Item = S>) -> Result<Self> {
        let mut overrides = Self::default();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair
                .split_once('=')
                .filter(|(key, _)| !key.trim().is_empty())
                .ok_or_else(|| MergeError::CreationOption(pair.to_string()))?;
            overrides.set(key.trim(), value.trim())?;
        }
        Ok(overrides)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || MergeError::CreationOption(format!("{key}={value}"));
        match key.to_ascii_lowercase().as_str() {
            "driver" => self.driver = Some(value.to_string()),
            "tiled" => {
                self.tiled = Some(match value.to_ascii_lowercase().as_str() {
                    "true" | "yes" | "1" => true,
                    "false" | "no" | "0" => false,
                    _ => return Err(invalid()),
                })
            }
            "blockxsize" => self.block_x_size = Some(value.parse().map_err(|_| invalid())?),
            "blockysize" => self.block_y_size = Some(value.parse().map_err(|_| invalid())?),
            "compress" => self.compress = Some(value.to_ascii_lowercase()),
            "nodata" => self.nodata = Some(value.parse().map_err(|_| invalid())?),
            // Fixed by the merge itself.
            "count" | "dtype" | "width" | "height" | "transform" | "crs" => return Err(invalid()),
            other => {
                self.creation_options
                    .insert(other.to_string(), value.to_string());
            }
        }
        Ok(())
    }
}

/// Profile of the merged raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputProfile {
    pub driver: String,
    pub data_type: String,
    pub count: usize,
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
    pub nodata: Option<f64>,
    pub tiled: bool,
    /// (x, y) block size.
    pub block_size: Option<(usize, usize)>,
    pub compress: Option<String>,
    pub creation_options: BTreeMap<String, String>,
}

impl OutputProfile {
    /// Starts from the first source's format, places it on `grid`, drops
    /// nodata as alpha is the only transparency signal, then applies `overrides`.
    pub fn derive(first: SourceProfile, grid: &DestinationGrid, overrides: &ProfileOverrides) -> Self {
        let SourceProfile {
            driver,
            data_type,
            count,
            tiled,
            block_size,
            compress,
            mut creation_options,
            ..
        } = first;

        let block_size = match (overrides.block_x_size, overrides.block_y_size) {
            (None, None) => block_size,
            (x, y) => Some((
                x.or(block_size.map(|size| size.0))
                    .unwrap_or(DEFAULT_BLOCK_SIZE),
                y.or(block_size.map(|size| size.1))
                    .unwrap_or(DEFAULT_BLOCK_SIZE),
            )),
        };
        creation_options.extend(overrides.creation_options.clone());

        Self {
            driver: overrides.driver.clone().unwrap_or(driver),
            data_type,
            count,
            width: grid.width,
            height: grid.height,
            transform: grid.transform,
            nodata: overrides.nodata,
            tiled: overrides.tiled.unwrap_or(tiled),
            block_size,
            compress: overrides.compress.clone().or(compress),
            creation_options,
        }
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }
}
