//! Points, sizes and bounding boxes in canvas space.
//!
//! The canvas uses screen coordinates: origin at the top-left, x grows to
//! the right and y grows downward.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle defined by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Bounds {
    pub fn from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Smallest bounds containing both points, in any order.
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    pub fn min_x(self) -> f64 {
        self.min_x
    }

    pub fn min_y(self) -> f64 {
        self.min_y
    }

    pub fn max_x(self) -> f64 {
        self.max_x
    }

    pub fn max_y(self) -> f64 {
        self.max_y
    }

    pub fn width(self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Smallest bounds containing both `self` and `other`.
    pub fn merge(self, other: Bounds) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_from_top_left() {
        let bounds = Bounds::from_top_left(Point::new(100.0, 100.0), Size::new(200.0, 60.0));
        assert_eq!(bounds.max_x(), 300.0);
        assert_eq!(bounds.max_y(), 160.0);
        assert_eq!(bounds.center(), Point::new(200.0, 130.0));
    }

    #[test]
    fn test_bounds_from_points_normalizes_order() {
        let bounds = Bounds::from_points(Point::new(5.0, 9.0), Point::new(1.0, 2.0));
        assert_eq!(bounds.min_x(), 1.0);
        assert_eq!(bounds.min_y(), 2.0);
        assert_eq!(bounds.width(), 4.0);
        assert_eq!(bounds.height(), 7.0);
    }

    #[test]
    fn test_bounds_merge() {
        let a = Bounds::from_top_left(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        let b = Bounds::from_top_left(Point::new(20.0, -5.0), Size::new(5.0, 5.0));
        let merged = a.merge(b);
        assert_eq!(merged.min_y(), -5.0);
        assert_eq!(merged.max_x(), 25.0);
        assert_eq!(merged.max_y(), 10.0);
    }
}
