use geo::{AffineTransform, Coord};
use serde::{Deserialize, Serialize};
use shrinkwraprs::Shrinkwrap;

use crate::errors::{MergeError, Result};

/// Rounding applied when a geographic coordinate is turned into a pixel index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOp {
    Floor,
    Ceil,
    Round,
}

impl RoundOp {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            RoundOp::Floor => value.floor(),
            RoundOp::Ceil => value.ceil(),
            RoundOp::Round => value.round(),
        }
    }
}

/// Pixel (col, row) to geographic (x, y) transform.
///
/// Serialized in gdal coefficient order
/// `[xoff, a, b, yoff, d, e]`.
#[derive(Shrinkwrap, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "[f64; 6]", into = "[f64; 6]")]
pub struct GeoTransform(AffineTransform);

/// Exact coefficient equality.
impl PartialEq for GeoTransform {
    fn eq(&self, other: &Self) -> bool {
        self.to_gdal() == other.to_gdal()
    }
}

impl From<[f64; 6]> for GeoTransform {
    fn from(gdal_transform: [f64; 6]) -> Self {
        Self::new(
            gdal_transform[1],
            gdal_transform[2],
            gdal_transform[0],
            gdal_transform[4],
            gdal_transform[5],
            gdal_transform[3],
        )
    }
}

impl From<GeoTransform> for [f64; 6] {
    fn from(transform: GeoTransform) -> Self {
        transform.to_gdal()
    }
}

impl GeoTransform {
    pub fn new(a: f64, b: f64, xoff: f64, d: f64, e: f64, yoff: f64) -> Self {
        Self(AffineTransform::new(a, b, xoff, d, e, yoff))
    }

    pub fn translation(xoff: f64, yoff: f64) -> Self {
        Self::new(1., 0., xoff, 0., 1., yoff)
    }

    pub fn scale(x: f64, y: f64) -> Self {
        Self::new(x, 0., 0., 0., y, 0.)
    }

    /// North-up grid with top left corner at `(west, north)`.
    pub fn from_origin(west: f64, north: f64, resolution: (f64, f64)) -> Self {
        Self::translation(west, north).compose(&Self::scale(resolution.0, -resolution.1))
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.0.xoff(),
            self.0.a(),
            self.0.b(),
            self.0.yoff(),
            self.0.d(),
            self.0.e(),
        ]
    }

    /// `self ∘ inner`: `inner` is applied first.
    pub fn compose(&self, inner: &GeoTransform) -> GeoTransform {
        let (s, i) = (&self.0, &inner.0);
        Self::new(
            s.a() * i.a() + s.b() * i.d(),
            s.a() * i.b() + s.b() * i.e(),
            s.a() * i.xoff() + s.b() * i.yoff() + s.xoff(),
            s.d() * i.a() + s.e() * i.d(),
            s.d() * i.b() + s.e() * i.e(),
            s.d() * i.xoff() + s.e() * i.yoff() + s.yoff(),
        )
    }

    /// Transform of the window starting at pixel `(col, row)`.
    pub fn offset(&self, col: isize, row: isize) -> GeoTransform {
        self.compose(&Self::translation(col as f64, row as f64))
    }

    pub fn inverse(&self) -> Result<GeoTransform> {
        self.0
            .inverse()
            .map(GeoTransform)
            .ok_or(MergeError::NonInvertibleTransform)
    }

    /// Geographic position of pixel corner `(col, row)`.
    pub fn xy(&self, col: f64, row: f64) -> (f64, f64) {
        self.0.apply(Coord { x: col, y: row }).x_y()
    }

    /// Pixel `(row, col)` holding geographic `(x, y)`.
    ///
    /// The point is nudged by `10^-precision` in the direction `op` rounds
    /// towards, so coordinates that land within float noise of a pixel edge
    /// resolve to the same index on every source.
    pub fn rowcol(&self, x: f64, y: f64, op: RoundOp, precision: u32) -> Result<(isize, isize)> {
        let eps = 10f64.powi(-(precision as i32)) * (1. - 2. * op.apply(0.1));
        let pixel = self.inverse()?.0.apply(Coord {
            x: x + eps,
            y: y - eps,
        });
        Ok((op.apply(pixel.y) as isize, op.apply(pixel.x) as isize))
    }

    /// Pixel size along x and y.
    pub fn resolution(&self) -> (f64, f64) {
        (
            self.0.a().hypot(self.0.d()),
            self.0.b().hypot(self.0.e()),
        )
    }

    /// Coefficient wise equality within half a unit of the `precision`-th decimal.
    pub fn almost_equals(&self, other: &GeoTransform, precision: u32) -> bool {
        let tolerance = 0.5 * 10f64.powi(-(precision as i32));
        self.to_gdal()
            .iter()
            .zip(other.to_gdal().iter())
            .all(|(lhs, rhs)| (lhs - rhs).abs() <= tolerance)
    }
}
