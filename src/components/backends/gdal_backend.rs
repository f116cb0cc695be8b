use gdal::{
    cpl::CslStringList,
    raster::{Buffer as GdalBuffer, GdalDataType, GdalType},
    Dataset as GdalDataset, DriverManager, Metadata as GdalMetadata,
};
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::{
    buffer::Buffer,
    components::{
        bounds::PixelWindow,
        profile::{OutputProfile, SourceProfile},
        sink::{RasterDriver, RasterSink},
        source::{read_boundless, RasterSource},
        transforms::GeoTransform,
        DataType,
    },
    errors::{MergeError, Result},
};

/// Sample types gdal can read and write.
pub trait GdalSample: DataType + GdalType {}

impl<T: DataType + GdalType> GdalSample for T {}

/// Profile name of a gdal band type.
fn type_name(band_type: GdalDataType) -> String {
    match band_type {
        GdalDataType::UInt8 => "uint8".to_string(),
        GdalDataType::UInt16 => "uint16".to_string(),
        GdalDataType::Int16 => "int16".to_string(),
        GdalDataType::UInt32 => "uint32".to_string(),
        GdalDataType::Int32 => "int32".to_string(),
        GdalDataType::Float32 => "float32".to_string(),
        GdalDataType::Float64 => "float64".to_string(),
        other => other.name().to_lowercase(),
    }
}

/// Profile name of the first band's type of the raster at `path`.
pub fn data_type_of<P: AsRef<Path>>(path: P) -> Result<String> {
    let dataset = GdalDataset::open(path)?;
    Ok(type_name(dataset.rasterband(1)?.band_type()))
}

fn check_band_type<T: GdalSample>(band_type: GdalDataType) -> Result<()> {
    if T::gdal_ordinal() != band_type as u32 {
        Err(MergeError::DataTypeMismatch {
            expected: T::NAME,
            found: type_name(band_type),
        })?
    }
    Ok(())
}

/// Raster file opened through gdal.
///
/// Only metadata is kept, windows are read from a fresh handle so the
/// source can be shared between threads.
#[derive(Debug)]
pub struct GdalSource {
    path: PathBuf,
    description: String,
    shape: (usize, usize),
    transform: GeoTransform,
    count: usize,
    profile: SourceProfile,
}

impl GdalSource {
    pub fn open<T: GdalSample, P: AsRef<Path>>(path: P) -> Result<Self> {
        let dataset = GdalDataset::open(&path)?;
        let (cols, rows) = dataset.raster_size();
        let count = dataset.raster_count();
        let band = dataset.rasterband(1)?;
        check_band_type::<T>(band.band_type())?;

        let (block_x, block_y) = band.block_size();
        let mut profile = SourceProfile::new(dataset.driver().short_name(), T::NAME, count);
        profile.nodata = band.no_data_value();
        profile.tiled = block_x < cols;
        profile.block_size = Some((block_x, block_y));
        profile.compress = dataset
            .metadata_item("COMPRESSION", "IMAGE_STRUCTURE")
            .map(|compress| compress.to_lowercase());

        let description = match GdalMetadata::description(&dataset)? {
            description if !description.is_empty() => description,
            _ => path.as_ref().display().to_string(),
        };
        debug!("opened {description}: {rows}x{cols}, {count} bands");
        Ok(GdalSource {
            path: path.as_ref().to_path_buf(),
            description,
            shape: (rows, cols),
            transform: GeoTransform::from(dataset.geo_transform()?),
            count,
            profile,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: GdalSample> RasterSource<T> for GdalSource {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn transform(&self) -> GeoTransform {
        self.transform
    }

    fn count(&self) -> usize {
        self.count
    }

    fn profile(&self) -> SourceProfile {
        self.profile.clone()
    }

    fn read_window(&self, window: &PixelWindow, bands: usize, slice: &mut [T]) -> Result<()> {
        let dataset = GdalDataset::open(&self.path)?;
        let bands = bands.min(self.count);
        read_boundless(self.shape, window, bands, slice, |band, clipped, buff| {
            let rasterband = dataset.rasterband(band + 1)?;
            check_band_type::<T>(rasterband.band_type())?;
            let (rows, cols) = clipped.shape();
            rasterband.read_into_slice::<T>(
                (clipped.cols.0, clipped.rows.0),
                (cols, rows),
                (cols, rows),
                buff,
                None,
            )?;
            Ok(())
        })
    }
}

/// Creates rasters with a gdal driver at `path`.
#[derive(Debug, Clone)]
pub struct GdalDriver {
    pub path: PathBuf,
}

impl GdalDriver {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        GdalDriver {
            path: path.as_ref().to_path_buf(),
        }
    }
}

fn creation_options(profile: &OutputProfile) -> Result<CslStringList> {
    let mut options = CslStringList::new();
    if profile.tiled {
        options.set_name_value("TILED", "YES")?;
    }
    if let Some((block_x, block_y)) = profile.block_size {
        if profile.tiled {
            options.set_name_value("BLOCKXSIZE", &block_x.to_string())?;
        }
        options.set_name_value("BLOCKYSIZE", &block_y.to_string())?;
    }
    if let Some(compress) = &profile.compress {
        options.set_name_value("COMPRESS", &compress.to_uppercase())?;
    }
    for (key, value) in &profile.creation_options {
        options.set_name_value(&key.to_uppercase(), value)?;
    }
    Ok(options)
}

impl<T: GdalSample> RasterDriver<T> for GdalDriver {
    type Sink = GdalSink;

    fn create(&self, profile: &OutputProfile) -> Result<GdalSink> {
        let driver = DriverManager::get_driver_by_name(&profile.driver)?;
        let options = creation_options(profile)?;
        info!(
            "creating {} {}x{} at {}",
            profile.driver,
            profile.width,
            profile.height,
            self.path.display()
        );
        let mut dataset = driver.create_with_band_type_with_options::<T, _>(
            &self.path,
            profile.width,
            profile.height,
            profile.count,
            &options,
        )?;
        dataset.set_geo_transform(&profile.transform.to_gdal())?;
        if let Some(nodata) = profile.nodata {
            for band in 1..=profile.count {
                dataset.rasterband(band)?.set_no_data_value(Some(nodata))?;
            }
        }
        Ok(GdalSink { dataset })
    }
}

/// Output dataset written block by block.
#[derive(Debug)]
pub struct GdalSink {
    dataset: GdalDataset,
}

impl GdalSink {
    pub fn into_dataset(self) -> GdalDataset {
        self.dataset
    }
}

impl<T: GdalSample> RasterSink<T> for GdalSink {
    fn block_windows(&self) -> Result<Vec<PixelWindow>> {
        let (cols, rows) = self.dataset.raster_size();
        let (block_x, block_y) = self.dataset.rasterband(1)?.block_size();
        Ok(PixelWindow::tiles((rows, cols), (block_y, block_x)))
    }

    fn write_window(&mut self, window: &PixelWindow, buffer: &Buffer<T, 3>) -> Result<()> {
        let (raster_cols, raster_rows) = self.dataset.raster_size();
        if !window.within((raster_rows, raster_cols)) {
            return Err(MergeError::WindowOutOfRange {
                window: *window,
                shape: (raster_rows, raster_cols),
            });
        }
        let (rows, cols) = window.shape();
        let [count, ..] = buffer.shape();
        for band in 0..count {
            let mut rasterband = self.dataset.rasterband(band + 1)?;
            let mut gdal_buffer = GdalBuffer::new((cols, rows), buffer.band(band).to_vec());
            rasterband.write((window.cols.0, window.rows.0), (cols, rows), &mut gdal_buffer)?;
        }
        Ok(())
    }
}
