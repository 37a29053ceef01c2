//! Points and axis-aligned bounding boxes in document coordinates.
//!
//! The host reports `top` numerically greater than `bottom` (y grows upward),
//! but nothing here depends on that: a box remembers its vertical sense and
//! every operation stays consistent with it.

use crate::units;
use doc_model::HostBounds;
use serde::{Deserialize, Serialize};

/// A point in document coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(point: Point) -> Self {
        [point.x, point.y]
    }
}

/// Axis-aligned box `(left, top, right, bottom)` in document units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BoundingBox {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self { left, top, right, bottom }
    }

    /// `true` when `top >= bottom`, i.e. y grows toward the top edge.
    pub fn is_y_up(&self) -> bool {
        self.top >= self.bottom
    }

    /// `1.0` when moving toward `top` increases y, `-1.0` otherwise.
    pub fn vertical_sense(&self) -> f64 {
        if self.is_y_up() {
            1.0
        } else {
            -1.0
        }
    }

    pub fn width(&self) -> f64 {
        (self.right - self.left).abs()
    }

    pub fn height(&self) -> f64 {
        (self.top - self.bottom).abs()
    }

    pub fn is_finite(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() == 0.0 || self.height() == 0.0
    }

    pub fn center(&self) -> Point {
        Point::new((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }

    pub fn top_mid(&self) -> Point {
        Point::new((self.left + self.right) / 2.0, self.top)
    }

    pub fn bottom_mid(&self) -> Point {
        Point::new((self.left + self.right) / 2.0, self.bottom)
    }

    pub fn left_mid(&self) -> Point {
        Point::new(self.left, (self.top + self.bottom) / 2.0)
    }

    pub fn right_mid(&self) -> Point {
        Point::new(self.right, (self.top + self.bottom) / 2.0)
    }

    /// Area of this box in square meters.
    pub fn area_m2(&self) -> f64 {
        units::to_square_meters(self.width(), self.height())
    }

    /// Grow the box outward by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Self {
        let sense = self.vertical_sense();
        Self {
            left: self.left - margin,
            top: self.top + margin * sense,
            right: self.right + margin,
            bottom: self.bottom - margin * sense,
        }
    }

    /// Smallest box enclosing both `self` and `other`, in `self`'s vertical sense.
    pub fn union(&self, other: &BoundingBox) -> Self {
        let (top, bottom) = if self.is_y_up() {
            (self.top.max(other.top), self.bottom.min(other.bottom))
        } else {
            (self.top.min(other.top), self.bottom.max(other.bottom))
        };
        Self {
            left: self.left.min(other.left),
            top,
            right: self.right.max(other.right),
            bottom,
        }
    }

    /// Whether `other` lies entirely inside `self` (edges inclusive).
    pub fn contains(&self, other: &BoundingBox) -> bool {
        let (low, high) = self.vertical_range();
        let (other_low, other_high) = other.vertical_range();
        other.left >= self.left
            && other.right <= self.right
            && other_low >= low
            && other_high <= high
    }

    fn vertical_range(&self) -> (f64, f64) {
        (self.top.min(self.bottom), self.top.max(self.bottom))
    }
}

impl From<HostBounds> for BoundingBox {
    fn from(bounds: HostBounds) -> Self {
        Self::new(bounds.left, bounds.top, bounds.right, bounds.bottom)
    }
}

impl From<BoundingBox> for HostBounds {
    fn from(bbox: BoundingBox) -> Self {
        HostBounds { left: bbox.left, top: bbox.top, right: bbox.right, bottom: bbox.bottom }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        let bbox = BoundingBox::new(10.0, 50.0, 40.0, 10.0);
        assert_eq!(bbox.width(), 30.0);
        assert_eq!(bbox.height(), 40.0);
        assert_eq!(bbox.center(), Point::new(25.0, 30.0));
        assert!(bbox.is_y_up());
    }

    #[test]
    fn test_expand_grows_outward_in_both_senses() {
        let up = BoundingBox::new(0.0, 10.0, 10.0, 0.0).expand(2.0);
        assert_eq!(up, BoundingBox::new(-2.0, 12.0, 12.0, -2.0));

        let down = BoundingBox::new(0.0, 0.0, 10.0, 10.0).expand(2.0);
        assert_eq!(down, BoundingBox::new(-2.0, -2.0, 12.0, 12.0));
    }

    #[test]
    fn test_union_and_contains() {
        let a = BoundingBox::new(0.0, 10.0, 10.0, 0.0);
        let b = BoundingBox::new(20.0, 40.0, 30.0, 25.0);
        let merged = a.union(&b);

        assert_eq!(merged, BoundingBox::new(0.0, 40.0, 30.0, 0.0));
        assert!(merged.contains(&a));
        assert!(merged.contains(&b));
        assert!(!a.contains(&merged));
    }

    #[test]
    fn test_degenerate() {
        assert!(BoundingBox::new(5.0, 5.0, 5.0, 0.0).is_degenerate());
        assert!(!BoundingBox::new(0.0, 5.0, 5.0, 0.0).is_degenerate());
    }

    #[test]
    fn test_host_bounds_conversion() {
        let host = HostBounds::from([1.0, 9.0, 4.0, 2.0]);
        let bbox = BoundingBox::from(host);
        assert_eq!(bbox, BoundingBox::new(1.0, 9.0, 4.0, 2.0));
        assert_eq!(HostBounds::from(bbox), host);
    }
}
