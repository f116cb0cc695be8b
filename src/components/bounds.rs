use geo::{Coord, Rect};
use itertools::iproduct;
use shrinkwraprs::Shrinkwrap;

use crate::components::transforms::GeoTransform;

/// Geographic extent, as `(west, south, east, north)`.
#[derive(Shrinkwrap, Clone, Copy, Debug, PartialEq)]
pub struct GeoBounds(Rect<f64>);

impl GeoBounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self(Rect::new(
            Coord { x: west, y: south },
            Coord { x: east, y: north },
        ))
    }

    /// Extent of a `(rows, cols)` raster placed with `transform`.
    pub fn from_transform(transform: &GeoTransform, shape: (usize, usize)) -> Self {
        let (x0, y0) = transform.xy(0., 0.);
        let (x1, y1) = transform.xy(shape.1 as f64, shape.0 as f64);
        Self(Rect::new(Coord { x: x0, y: y0 }, Coord { x: x1, y: y1 }))
    }

    pub fn west(&self) -> f64 {
        self.0.min().x
    }

    pub fn south(&self) -> f64 {
        self.0.min().y
    }

    pub fn east(&self) -> f64 {
        self.0.max().x
    }

    pub fn north(&self) -> f64 {
        self.0.max().y
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.west(), self.south(), self.east(), self.north()]
    }

    pub fn union(&self, rhs: &GeoBounds) -> GeoBounds {
        GeoBounds::new(
            self.west().min(rhs.west()),
            self.south().min(rhs.south()),
            self.east().max(rhs.east()),
            self.north().max(rhs.north()),
        )
    }
}

/// Pixel window given by row and column start/stop pairs.
///
/// Offsets are signed as windows may reach past the raster they are read
/// from. Stops are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelWindow {
    pub rows: (isize, isize),
    pub cols: (isize, isize),
}

impl PixelWindow {
    pub fn new(rows: (isize, isize), cols: (isize, isize)) -> Self {
        Self { rows, cols }
    }

    /// Top left pixel as (row, col).
    pub fn offset(&self) -> (isize, isize) {
        (self.rows.0, self.cols.0)
    }

    /// (rows, cols), empty for inverted windows.
    pub fn shape(&self) -> (usize, usize) {
        (
            (self.rows.1 - self.rows.0).max(0) as usize,
            (self.cols.1 - self.cols.0).max(0) as usize,
        )
    }

    pub fn area(&self) -> usize {
        let (rows, cols) = self.shape();
        rows * cols
    }

    pub fn pad(&self, pixels: isize) -> Self {
        Self::new(
            (self.rows.0 - pixels, self.rows.1 + pixels),
            (self.cols.0 - pixels, self.cols.1 + pixels),
        )
    }

    /// Whether the window lies inside a raster of `(rows, cols)`.
    pub fn within(&self, shape: (usize, usize)) -> bool {
        self.rows.0 >= 0
            && self.cols.0 >= 0
            && self.rows.1 as i128 <= shape.0 as i128
            && self.cols.1 as i128 <= shape.1 as i128
    }

    /// Tiles a raster of `shape` into blocks of `block` (rows, cols), row by row.
    pub fn tiles(shape: (usize, usize), block: (usize, usize)) -> Vec<PixelWindow> {
        let (block_rows, block_cols) = (block.0.max(1), block.1.max(1));
        iproduct!(
            (0..shape.0).step_by(block_rows),
            (0..shape.1).step_by(block_cols)
        )
        .map(|(row, col)| PixelWindow {
            rows: (row as isize, (row + block_rows).min(shape.0) as isize),
            cols: (col as isize, (col + block_cols).min(shape.1) as isize),
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_from_north_up_transform() {
        let transform = GeoTransform::from([-114., 0.2, 0., 46., 0., -0.2]);
        let bounds = GeoBounds::from_transform(&transform, (10, 10));
        assert_eq!(bounds.west(), -114.);
        assert_eq!(bounds.north(), 46.);
        assert!((bounds.east() + 112.).abs() < 1e-12);
        assert!((bounds.south() - 44.).abs() < 1e-12);
    }

    #[test]
    fn union_covers_both() {
        let union = GeoBounds::new(0., 0., 1., 1.).union(&GeoBounds::new(-1., 0.5, 0.5, 3.));
        assert_eq!(union.as_array(), [-1., 0., 1., 3.]);
    }

    #[test]
    fn tiles_clip_last_row_and_column() {
        let tiles = PixelWindow::tiles((5, 7), (2, 4));
        assert_eq!(tiles.len(), 6);
        assert_eq!(tiles[0], PixelWindow::new((0, 2), (0, 4)));
        assert_eq!(tiles[1], PixelWindow::new((0, 2), (4, 7)));
        assert_eq!(tiles[5], PixelWindow::new((4, 5), (4, 7)));
        assert_eq!(tiles.iter().map(PixelWindow::area).sum::<usize>(), 35);
    }

    #[test]
    fn window_shape_and_bounds_checks() {
        let window = PixelWindow::new((-1, 3), (2, 5));
        assert_eq!(window.shape(), (4, 3));
        assert!(!window.within((10, 10)));
        assert!(PixelWindow::new((0, 10), (0, 10)).within((10, 10)));
        assert!(!PixelWindow::new((0, 11), (0, 10)).within((10, 10)));
        assert_eq!(window.pad(1).shape(), (6, 5));
    }
}
