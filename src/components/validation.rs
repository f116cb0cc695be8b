use crate::{
    components::{source::RasterSource, DataType},
    errors::{Result, ValidationError},
};

/// Bands of an RGBA raster, the last one being alpha.
pub const RGBA_BANDS: usize = 4;

/// Zero based index of the alpha band.
pub const ALPHA_BAND: usize = RGBA_BANDS - 1;

/// Every source must be a 4 band RGBA raster.
pub fn validate_rgba<T: DataType, S: RasterSource<T>>(sources: &[S]) -> Result<()> {
    if sources.is_empty() {
        Err(ValidationError::NoSources)?
    }
    for (index, source) in sources.iter().enumerate() {
        let count = source.count();
        if count != RGBA_BANDS {
            Err(ValidationError::NotRgba {
                index,
                description: source.description(),
                count,
            })?
        }
    }
    Ok(())
}
