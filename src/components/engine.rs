use log::{debug, info, trace};
use std::marker::PhantomData;

use crate::{
    buffer::Buffer,
    components::{
        bounds::{GeoBounds, PixelWindow},
        grid::DestinationGrid,
        sink::RasterSink,
        source::RasterSource,
        transforms::GeoTransform,
        validation::{ALPHA_BAND, RGBA_BANDS},
        window::{read_contribution, Block, ReadStrategy},
        DataType,
    },
    errors::{Result, ValidationError},
};

/// What happened while compositing one block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockReport {
    pub window: PixelWindow,
    /// Sources planned and read, in input order.
    pub sources_consulted: usize,
    pub sources_resampled: usize,
    /// Pixels with non-zero alpha after compositing.
    pub covered: usize,
    pub area: usize,
    /// Remaining sources were skipped as the block was full.
    pub early_exit: bool,
}

/// Totals over a whole merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeSummary {
    pub blocks: usize,
    pub early_exits: usize,
    pub sources_consulted: usize,
    pub sources_resampled: usize,
}

impl MergeSummary {
    fn add(&mut self, report: &BlockReport) {
        self.blocks += 1;
        self.early_exits += usize::from(report.early_exit);
        self.sources_consulted += report.sources_consulted;
        self.sources_resampled += report.sources_resampled;
    }
}

/// Receives progress of a merge.
pub trait MergeObserver {
    fn grid_resolved(&mut self, _grid: &DestinationGrid) {}
    fn block_composited(&mut self, _report: &BlockReport) {}
}

impl MergeObserver for () {}

/// Forwards progress to the `log` facade.
#[derive(Debug, Default)]
pub struct LogObserver;

impl MergeObserver for LogObserver {
    fn grid_resolved(&mut self, grid: &DestinationGrid) {
        info!(
            "output grid {}x{} at {:?}, resolution {:?}",
            grid.width,
            grid.height,
            grid.bounds.as_array(),
            grid.resolution
        );
    }

    fn block_composited(&mut self, report: &BlockReport) {
        debug!(
            "block {:?}: {}/{} covered after {} sources ({} resampled){}",
            report.window,
            report.covered,
            report.area,
            report.sources_consulted,
            report.sources_resampled,
            if report.early_exit { ", skipped the rest" } else { "" }
        );
    }
}

/// Composites sources, in priority order, onto the blocks of a grid.
pub struct Merger<'a, T: DataType, S: RasterSource<T>> {
    sources: &'a [S],
    /// Transform and bounds of each source, in input order.
    placements: Vec<(GeoTransform, GeoBounds)>,
    grid: &'a DestinationGrid,
    count: usize,
    precision: u32,
    _t: PhantomData<T>,
}

impl<'a, T: DataType, S: RasterSource<T>> Merger<'a, T, S> {
    /// `count` bands are written per block, band 4 being alpha.
    pub fn new(
        sources: &'a [S],
        grid: &'a DestinationGrid,
        count: usize,
        precision: u32,
    ) -> Result<Self> {
        if sources.is_empty() {
            Err(ValidationError::NoSources)?
        }
        if count < RGBA_BANDS {
            Err(ValidationError::MissingAlpha { count })?
        }
        let placements = sources
            .iter()
            .map(|source| (source.transform(), source.bounds()))
            .collect();
        Ok(Self {
            sources,
            placements,
            grid,
            count,
            precision,
            _t: PhantomData,
        })
    }

    /// Composites the block at `window` of the grid.
    pub fn composite_block(&self, window: &PixelWindow) -> Result<(Buffer<T, 3>, BlockReport)> {
        let block = Block::new(*window, &self.grid.transform);
        let (rows, cols) = block.shape();
        let area = block.area();
        let mut block_buff = Buffer::new_zeroed([self.count, rows, cols]);
        let mut contribution = Buffer::new_zeroed([self.count, rows, cols]);
        let mut report = BlockReport {
            window: *window,
            sources_consulted: 0,
            sources_resampled: 0,
            covered: 0,
            area,
            early_exit: false,
        };

        for (index, (source, (transform, bounds))) in
            self.sources.iter().zip(&self.placements).enumerate()
        {
            let strategy = ReadStrategy::plan(&block, transform, bounds, self.precision)?;
            trace!("block {window:?}, source {index}: {strategy:?}");
            report.sources_consulted += 1;
            report.sources_resampled += usize::from(strategy.is_resampled());

            read_contribution(&block, source, &strategy, &mut contribution)?;
            report.covered = composite(&mut block_buff, &contribution);

            if report.covered == area {
                report.early_exit = index + 1 < self.sources.len();
                break;
            }
        }
        Ok((block_buff, report))
    }

    /// Composites and writes every block of `sink`, in its native order.
    pub fn run<K: RasterSink<T>>(
        &self,
        sink: &mut K,
        observer: &mut impl MergeObserver,
    ) -> Result<MergeSummary> {
        let windows = sink.block_windows()?;
        debug!(
            "merging {} sources into {} blocks",
            self.sources.len(),
            windows.len()
        );
        let mut summary = MergeSummary::default();
        for window in windows {
            let (block_buff, report) = self.composite_block(&window)?;
            sink.write_window(&window, &block_buff)?;
            observer.block_composited(&report);
            summary.add(&report);
        }
        Ok(summary)
    }
}

/// Copies every band of `contribution` where `block` has no alpha yet and
/// `contribution` has. Returns the pixels of `block` with alpha afterwards.
fn composite<T: DataType>(block: &mut Buffer<T, 3>, contribution: &Buffer<T, 3>) -> usize {
    let writeable: Vec<bool> = block
        .band(ALPHA_BAND)
        .iter()
        .zip(contribution.band(ALPHA_BAND))
        .map(|(dst, src)| dst.is_zero() && !src.is_zero())
        .collect();

    let [count, ..] = block.shape();
    for band in 0..count {
        block
            .band_mut(band)
            .iter_mut()
            .zip(contribution.band(band))
            .zip(&writeable)
            .filter(|(_, writeable)| **writeable)
            .for_each(|((dst, src), _)| *dst = *src);
    }

    block
        .band(ALPHA_BAND)
        .iter()
        .filter(|alpha| !alpha.is_zero())
        .count()
}
