//! # Geometry
//!
//! Page coordinates have their origin at the bottom-left corner of the page,
//! so Y decreases as content flows down the page. Every element records where
//! it sits on the page as a [`Boundary`]: an ordered polygon of [`Point`]s whose
//! first point is the element's top-left corner.

pub mod boundary;

pub use boundary::Boundary;

use serde::{Deserialize, Serialize};

/// An immutable point in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Move the point by the vector `(dx, dy)`.
    ///
    /// The vertical component points down the page: a positive `dy` lowers
    /// the point, which in page coordinates means a smaller Y.
    pub fn translate(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y - dy)
    }

    pub fn to_tuple(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Midpoint of the segment between `a` and `b`.
    pub(crate) fn between(a: Point, b: Point) -> Point {
        Point::new(a.x + (b.x - a.x) / 2.0, b.y + (a.y - b.y) / 2.0)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

impl From<Point> for (f64, f64) {
    fn from(p: Point) -> Self {
        p.to_tuple()
    }
}

/// An axis-aligned rectangle, used when handing image placements to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Build a rectangle from a top-left and bottom-right corner.
    pub fn from_corners(top_left: Point, bottom_right: Point) -> Self {
        Rect {
            x: top_left.x(),
            y: bottom_right.y(),
            width: bottom_right.x() - top_left.x(),
            height: top_left.y() - bottom_right.y(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_moves_down_the_page() {
        let p = Point::new(10.0, 10.0).translate(5.0, 3.0);
        assert_eq!(p, Point::new(15.0, 7.0));
    }

    #[test]
    fn translate_is_reversible() {
        let p = Point::new(1.5, -2.0);
        assert_eq!(p.translate(3.0, 4.0).translate(-3.0, -4.0), p);
    }

    #[test]
    fn serializes_as_tuple() {
        let json = serde_json::to_string(&Point::new(1.0, 2.5)).unwrap();
        assert_eq!(json, "[1.0,2.5]");
        let back: Point = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Point::new(1.0, 2.5));
    }

    #[test]
    fn rect_from_corners() {
        let r = Rect::from_corners(Point::new(10.0, 100.0), Point::new(60.0, 40.0));
        assert_eq!(r.x, 10.0);
        assert_eq!(r.y, 40.0);
        assert_eq!(r.width, 50.0);
        assert_eq!(r.height, 60.0);
    }
}
