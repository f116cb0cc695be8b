use log::debug;

use crate::{
    components::{
        engine::{MergeObserver, MergeSummary, Merger},
        grid::{DestinationGrid, MergeOptions},
        profile::OutputProfile,
        sink::RasterDriver,
        source::RasterSource,
        DataType,
    },
    errors::{Result, ValidationError},
};

/// Output of a finished merge.
#[derive(Debug)]
pub struct Merged<K> {
    pub output: K,
    pub profile: OutputProfile,
    pub summary: MergeSummary,
}

/// Output grid and profile a merge of `sources` would produce.
///
/// Nothing is read besides the sources' metadata.
pub fn resolve_profile<T: DataType, S: RasterSource<T>>(
    sources: &[S],
    options: &MergeOptions,
) -> Result<(DestinationGrid, OutputProfile)> {
    let first = sources.first().ok_or(ValidationError::NoSources)?;
    let grid = DestinationGrid::resolve(sources, options)?;
    let profile = OutputProfile::derive(first.profile(), &grid, &options.overrides);
    debug!("Output profile: {profile:?}");
    Ok((grid, profile))
}

/// Merges `sources`, in priority order, into a raster created by `driver`.
///
/// Inputs are validated before the output is created, a rejected merge
/// leaves nothing behind.
pub fn merge<T, S, D>(
    sources: &[S],
    driver: &D,
    options: &MergeOptions,
    observer: &mut impl MergeObserver,
) -> Result<Merged<D::Sink>>
where
    T: DataType,
    S: RasterSource<T>,
    D: RasterDriver<T>,
{
    let (grid, profile) = resolve_profile(sources, options)?;
    observer.grid_resolved(&grid);
    let merger = Merger::new(sources, &grid, profile.count, options.precision)?;

    let mut output = driver.create(&profile)?;
    let summary = merger.run(&mut output, observer)?;
    debug!(
        "merged {} blocks, {} exited early, {} source reads ({} resampled)",
        summary.blocks, summary.early_exits, summary.sources_consulted, summary.sources_resampled
    );
    Ok(Merged {
        output,
        profile,
        summary,
    })
}
