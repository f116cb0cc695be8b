use rayon::prelude::*;

use crate::{
    buffer::Buffer,
    components::{bounds::PixelWindow, transforms::GeoTransform, DataType},
    errors::Result,
};

/// Source pixels and weights blended into one destination pixel.
#[derive(Debug, Clone, Copy)]
struct Sample {
    top_left: usize,
    top_right: usize,
    bottom_left: usize,
    bottom_right: usize,
    dx: f64,
    dy: f64,
}

impl Sample {
    fn blend<T: DataType>(&self, band: &[T]) -> T {
        let top = band[self.top_left].to_sample() * (1. - self.dx)
            + band[self.top_right].to_sample() * self.dx;
        let bottom = band[self.bottom_left].to_sample() * (1. - self.dx)
            + band[self.bottom_right].to_sample() * self.dx;
        T::from_sample(top * (1. - self.dy) + bottom * self.dy)
    }
}

/// Lower and upper neighbour along one axis and the weight of the upper one.
///
/// `position` is in pixel coordinates, positions outside `range` have no
/// neighbours and neighbours are clamped to `range`.
fn neighbours(position: f64, range: (isize, isize)) -> Option<(usize, usize, f64)> {
    let (first, end) = (range.0 as f64, range.1 as f64);
    if !(position >= first && position < end) {
        return None;
    }
    let centred = position - 0.5;
    let floor = centred.floor();
    let lower = floor.clamp(first, end - 1.) as usize;
    let upper = (floor + 1.).clamp(first, end - 1.) as usize;
    Some((lower, upper, centred - floor))
}

/// Bilinear resampling of every band of `src` onto the grid of `dst`.
///
/// Pixel centres of `dst` are mapped into `src` pixel space. Only the
/// `valid` part of `src` holds data: centres outside of it stay zero and
/// neighbours are clamped to it. No value is treated as nodata. Bands are
/// resampled in parallel.
pub fn bilinear<T: DataType>(
    src: &Buffer<T, 3>,
    src_transform: &GeoTransform,
    valid: &PixelWindow,
    dst: &mut Buffer<T, 3>,
    dst_transform: &GeoTransform,
) -> Result<()> {
    let [_, _, src_cols] = src.shape();
    let [_, dst_rows, dst_cols] = dst.shape();
    if valid.area() == 0 || dst.is_empty() {
        dst.as_mut().fill(T::zero());
        return Ok(());
    }
    let dst_to_src = src_transform.inverse()?.compose(dst_transform);

    let samples: Vec<Option<Sample>> = (0..dst_rows)
        .flat_map(|row| (0..dst_cols).map(move |col| (row, col)))
        .map(|(row, col)| {
            let (x, y) = dst_to_src.xy(col as f64 + 0.5, row as f64 + 0.5);
            let (left, right, dx) = neighbours(x, valid.cols)?;
            let (top, bottom, dy) = neighbours(y, valid.rows)?;
            Some(Sample {
                top_left: top * src_cols + left,
                top_right: top * src_cols + right,
                bottom_left: bottom * src_cols + left,
                bottom_right: bottom * src_cols + right,
                dx,
                dy,
            })
        })
        .collect();

    let src_band_len = src.band_len();
    let dst_band_len = dst.band_len();
    dst.as_mut()
        .par_chunks_mut(dst_band_len)
        .zip(src.as_slice().par_chunks(src_band_len))
        .for_each(|(dst_band, src_band)| {
            dst_band
                .iter_mut()
                .zip(samples.iter())
                .for_each(|(value, sample)| {
                    *value = match sample {
                        Some(sample) => sample.blend(src_band),
                        None => T::zero(),
                    }
                });
        });
    Ok(())
}

/// Forces samples equal to exactly `1` back to `0`.
///
/// Workaround for resampled edges leaking stray `1` values into otherwise
/// empty areas. Only applied to resampled contributions.
pub fn clear_stray_ones<T: DataType>(buffer: &mut Buffer<T, 3>) {
    buffer
        .as_mut()
        .iter_mut()
        .filter(|value| value.is_one())
        .for_each(|value| *value = T::zero());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(west: f64, north: f64, res: f64) -> GeoTransform {
        GeoTransform::from_origin(west, north, (res, res))
    }

    fn all_of<T>(buffer: &Buffer<T, 3>) -> PixelWindow {
        let [_, rows, cols] = buffer.shape();
        PixelWindow::new((0, rows as isize), (0, cols as isize))
    }

    #[test]
    fn aligned_grids_copy_values() {
        let src = Buffer::<u8, 3>::from_vec([1, 2, 2], vec![10, 20, 30, 40]).unwrap();
        let mut dst = Buffer::<u8, 3>::new_zeroed([1, 2, 2]);
        bilinear(&src, &grid(0., 2., 1.), &all_of(&src), &mut dst, &grid(0., 2., 1.)).unwrap();
        assert_eq!(dst.as_slice(), &[10, 20, 30, 40]);
    }

    #[test]
    fn downsampling_by_two_averages_pairs() {
        #[rustfmt::skip]
        let src = Buffer::<u8, 3>::from_vec([1, 2, 4], vec![
            0, 200, 100, 100,
            0, 200, 100, 100,
        ]).unwrap();
        let mut dst = Buffer::<u8, 3>::new_zeroed([1, 1, 2]);
        bilinear(&src, &grid(0., 2., 1.), &all_of(&src), &mut dst, &grid(0., 2., 2.)).unwrap();
        assert_eq!(dst.as_slice(), &[100, 100]);
    }

    #[test]
    fn half_pixel_shift_blends_neighbours() {
        let src = Buffer::<f32, 3>::from_vec([1, 1, 3], vec![0., 10., 20.]).unwrap();
        let mut dst = Buffer::<f32, 3>::new_zeroed([1, 1, 2]);
        bilinear(&src, &grid(0., 1., 1.), &all_of(&src), &mut dst, &grid(0.5, 1., 1.)).unwrap();
        assert_eq!(dst.as_slice(), &[5., 15.]);
    }

    #[test]
    fn bands_are_resampled_independently() {
        let src = Buffer::<u8, 3>::from_vec([2, 1, 1], vec![7, 9]).unwrap();
        let mut dst = Buffer::<u8, 3>::new_zeroed([2, 2, 2]);
        bilinear(&src, &grid(0., 1., 1.), &all_of(&src), &mut dst, &grid(0., 1., 0.5)).unwrap();
        assert_eq!(dst.band(0), &[7; 4]);
        assert_eq!(dst.band(1), &[9; 4]);
    }

    #[test]
    fn edges_clamp_to_valid_region() {
        // First row and column are padding outside of the source.
        #[rustfmt::skip]
        let src = Buffer::<u8, 3>::from_vec([1, 3, 3], vec![
            0, 0, 0,
            0, 200, 200,
            0, 200, 200,
        ]).unwrap();
        let valid = PixelWindow::new((1, 3), (1, 3));
        let mut dst = Buffer::<u8, 3>::new_zeroed([1, 3, 3]);
        bilinear(&src, &grid(0., 3., 1.), &valid, &mut dst, &grid(0.6, 2.4, 1.)).unwrap();
        #[rustfmt::skip]
        assert_eq!(dst.as_slice(), &[
            200, 200, 0,
            200, 200, 0,
            0, 0, 0,
        ]);
    }

    #[test]
    fn stray_ones_are_cleared_only() {
        let mut buffer = Buffer::<u8, 3>::from_vec([1, 1, 4], vec![0, 1, 2, 255]).unwrap();
        clear_stray_ones(&mut buffer);
        assert_eq!(buffer.as_slice(), &[0, 0, 2, 255]);
    }
}
