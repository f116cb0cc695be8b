use log::trace;

use crate::{
    buffer::Buffer,
    components::{
        bounds::{GeoBounds, PixelWindow},
        resample,
        source::RasterSource,
        transforms::{GeoTransform, RoundOp},
        DataType,
    },
    errors::Result,
    intersection::Intersection,
};

/// Destination block placed on the output grid.
#[derive(Debug, Clone, Copy)]
pub struct Block {
    pub window: PixelWindow,
    /// Block pixel to geographic transform.
    pub transform: GeoTransform,
    pub bounds: GeoBounds,
}

impl Block {
    pub fn new(window: PixelWindow, grid_transform: &GeoTransform) -> Self {
        let (row, col) = window.offset();
        let transform = grid_transform.offset(col, row);
        let bounds = GeoBounds::from_transform(&transform, window.shape());
        Self {
            window,
            transform,
            bounds,
        }
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.window.shape()
    }

    pub fn area(&self) -> usize {
        self.window.area()
    }
}

/// How a source is brought onto a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadStrategy {
    /// Source pixels line up with the block, read `window` as is.
    Direct(PixelWindow),
    /// Read `window`, placed by `transform`, and resample onto the block.
    Resample {
        window: PixelWindow,
        transform: GeoTransform,
    },
    /// Source does not overlap the block.
    Skip,
}

impl ReadStrategy {
    /// Picks the cheapest way to read `source_transform` onto `block`.
    ///
    /// The source window is found by rounding the block corners to the
    /// nearest source pixel. If that window has the block's shape and its
    /// transform matches the block's to `precision` decimals the grids are
    /// aligned and the window is read directly.
    pub fn plan(
        block: &Block,
        source_transform: &GeoTransform,
        source_bounds: &GeoBounds,
        precision: u32,
    ) -> Result<Self> {
        if block.bounds.intersection(source_bounds).is_none() {
            return Ok(ReadStrategy::Skip);
        }
        let bounds = &block.bounds;

        let window = source_window(source_transform, bounds, precision, RoundOp::Round, RoundOp::Round)?;
        let window_transform = source_transform.offset(window.cols.0, window.rows.0);
        if window.shape() == block.shape()
            && window_transform.almost_equals(&block.transform, precision)
        {
            return Ok(ReadStrategy::Direct(window));
        }

        // Full cover plus one pixel for the bilinear neighbourhood.
        let window =
            source_window(source_transform, bounds, precision, RoundOp::Floor, RoundOp::Ceil)?.pad(1);
        let transform = source_transform.offset(window.cols.0, window.rows.0);
        Ok(ReadStrategy::Resample { window, transform })
    }

    pub fn is_resampled(&self) -> bool {
        matches!(self, ReadStrategy::Resample { .. })
    }
}

fn source_window(
    transform: &GeoTransform,
    bounds: &GeoBounds,
    precision: u32,
    start_op: RoundOp,
    stop_op: RoundOp,
) -> Result<PixelWindow> {
    let start = transform.rowcol(bounds.west(), bounds.north(), start_op, precision)?;
    let stop = transform.rowcol(bounds.east(), bounds.south(), stop_op, precision)?;
    Ok(PixelWindow::new((start.0, stop.0), (start.1, stop.1)))
}

/// Fills `contribution` with what `source` holds for `block`.
///
/// `contribution` has the block's shape and is fully overwritten. Sources
/// with fewer bands than `contribution` leave the missing bands zero.
pub fn read_contribution<T: DataType, S: RasterSource<T>>(
    block: &Block,
    source: &S,
    strategy: &ReadStrategy,
    contribution: &mut Buffer<T, 3>,
) -> Result<()> {
    let [count, ..] = contribution.shape();
    let bands = count.min(source.count());
    match strategy {
        ReadStrategy::Skip => contribution.as_mut().fill(T::zero()),
        ReadStrategy::Direct(window) => {
            trace!("direct read of {window:?} from {}", source.description());
            contribution.as_mut().fill(T::zero());
            source.read_window(window, bands, contribution.as_mut())?
        }
        ReadStrategy::Resample { window, transform } => {
            trace!("resampling {window:?} from {}", source.description());
            let (rows, cols) = window.shape();
            let mut read_buff = Buffer::new_zeroed([count, rows, cols]);
            source.read_window(window, bands, read_buff.as_mut())?;

            // Part of the read window covered by the source, in window pixels.
            let (src_rows, src_cols) = source.shape();
            let valid = PixelWindow::new(
                (
                    (-window.rows.0).max(0),
                    (src_rows as isize - window.rows.0).min(rows as isize),
                ),
                (
                    (-window.cols.0).max(0),
                    (src_cols as isize - window.cols.0).min(cols as isize),
                ),
            );
            resample::bilinear(&read_buff, transform, &valid, contribution, &block.transform)?;
            resample::clear_stray_ones(contribution);
        }
    }
    Ok(())
}
