use geo::{CoordNum, Rect};

use crate::components::GeoBounds;

pub trait Intersection: Sized {
    /// Overlap of both extents, `None` when they share no area.
    fn intersection(&self, rhs: &Self) -> Option<Self>;
}

impl<T: CoordNum> Intersection for Rect<T> {
    fn intersection(&self, rhs: &Self) -> Option<Rect<T>> {
        let (lhs_min, lhs_max) = (self.min(), self.max());
        let (rhs_min, rhs_max) = (rhs.min(), rhs.max());
        if (lhs_max.x <= rhs_min.x) | (lhs_max.y <= rhs_min.y) {
            return None;
        }
        if (lhs_min.x >= rhs_max.x) | (lhs_min.y >= rhs_max.y) {
            return None;
        }

        let pick = |x: T, y: T, greater: bool| if (x > y) == greater { x } else { y };
        let min = (
            pick(lhs_min.x, rhs_min.x, true),
            pick(lhs_min.y, rhs_min.y, true),
        );
        let max = (
            pick(lhs_max.x, rhs_max.x, false),
            pick(lhs_max.y, rhs_max.y, false),
        );
        Some(Rect::new(min, max))
    }
}

impl Intersection for GeoBounds {
    fn intersection(&self, rhs: &Self) -> Option<Self> {
        let overlap = <Rect<f64> as Intersection>::intersection(self, rhs)?;
        Some(GeoBounds::new(
            overlap.min().x,
            overlap.min().y,
            overlap.max().x,
            overlap.max().y,
        ))
    }
}
