//! Boundary polygons.
//!
//! A boundary is an ordered, closable set of points describing the area an
//! element occupies. Besides the points themselves it tracks the *diagonal
//! point*: the point opposite the first one. For the rectangles the layout
//! engine produces, the first point is the top-left corner and the diagonal
//! point is the bottom-right corner, which is all the geometric queries below
//! need. Those queries are bounding-box approximations, exact for rectangles
//! and approximate for any other shape.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use super::Point;
use crate::error::{PlumeError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "BoundaryData", into = "BoundaryData")]
pub struct Boundary {
    points: Vec<Point>,
    closed: bool,
    diagonal_point_index: Option<usize>,
}

/// Serialized form: the points and the closed flag. The diagonal index is
/// derived data and is rebuilt on load.
#[derive(Serialize, Deserialize)]
struct BoundaryData {
    points: Vec<Point>,
    closed: bool,
}

impl Boundary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closed rectangle hanging down from `top_left`.
    pub fn rectangle(top_left: Point, width: f64, height: f64) -> Result<Boundary> {
        let (x, y) = top_left.to_tuple();
        let mut boundary = Boundary::new();
        boundary
            .set_next_xy(x, y)?
            .set_next_xy(x + width, y)?
            .set_next_xy(x + width, y - height)?
            .set_next_xy(x, y - height)?;
        boundary.close()?;
        Ok(boundary)
    }

    /// Append a point.
    ///
    /// Fails with a state error once the boundary is closed, and with an
    /// argument error when a coordinate is not a finite number.
    pub fn set_next(&mut self, point: Point) -> Result<&mut Self> {
        if self.closed {
            return Err(PlumeError::State(
                "boundary has already been closed".to_string(),
            ));
        }
        if !point.is_finite() {
            return Err(PlumeError::InvalidArgument(format!(
                "boundary point coordinates must be finite, got ({}, {})",
                point.x(),
                point.y()
            )));
        }

        self.push_point(point);
        Ok(self)
    }

    pub fn set_next_xy(&mut self, x: f64, y: f64) -> Result<&mut Self> {
        self.set_next(Point::new(x, y))
    }

    fn push_point(&mut self, point: Point) {
        let replaces_diagonal = match self.diagonal_point() {
            None => true,
            Some(diagonal) => {
                diagonal.y() > point.y() || (diagonal.y() == point.y() && diagonal.x() < point.x())
            }
        };
        if replaces_diagonal {
            self.diagonal_point_index = Some(self.points.len());
        }
        self.points.push(point);
    }

    /// Close the polygon by repeating the first point. Needs at least three points.
    pub fn close(&mut self) -> Result<()> {
        if self.points.len() < 3 {
            return Err(PlumeError::Usage(format!(
                "boundary must have at least three points to be closed, it has {}",
                self.points.len()
            )));
        }
        let first = self.points[0];
        self.set_next(first)?;
        self.closed = true;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    /// Bounds-checked access to the point at `index`.
    pub fn get(&self, index: usize) -> Result<Point> {
        self.points
            .get(index)
            .copied()
            .ok_or(PlumeError::OutOfBounds {
                index,
                len: self.points.len(),
            })
    }

    pub fn first_point(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn diagonal_point(&self) -> Option<Point> {
        self.diagonal_point_index.map(|i| self.points[i])
    }

    /// Translate every point by `(dx, dy)`. See [`Point::translate`].
    pub fn translate(&mut self, dx: f64, dy: f64) -> &mut Self {
        for point in self.points.iter_mut() {
            *point = point.translate(dx, dy);
        }
        self
    }

    /// Translate the single point at `index`.
    ///
    /// The diagonal index is left as it is, matching how callers use this to
    /// stretch one edge of a rectangle without changing which corner is which.
    pub fn point_translate(&mut self, index: usize, dx: f64, dy: f64) -> Result<&mut Self> {
        let point = self.get(index)?;
        self.points[index] = point.translate(dx, dy);
        Ok(self)
    }

    /// Drop all points and reopen the boundary.
    pub fn reset(&mut self) {
        self.points.clear();
        self.closed = false;
        self.diagonal_point_index = None;
    }

    /// Whether `point` lies strictly inside the box spanned by the first and
    /// diagonal points.
    pub fn contains(&self, point: Point) -> bool {
        let (Some(first), Some(diagonal)) = (self.first_point(), self.diagonal_point()) else {
            return false;
        };

        first.x() < point.x()
            && first.y() > point.y()
            && diagonal.x() > point.x()
            && diagonal.y() < point.y()
    }

    /// Whether the two boundaries overlap.
    pub fn intersects(&self, other: &Boundary) -> bool {
        let (Some(first), Some(diagonal)) = (self.first_point(), self.diagonal_point()) else {
            return false;
        };
        let (Some(other_first), Some(other_diagonal)) =
            (other.first_point(), other.diagonal_point())
        else {
            return false;
        };

        if other.iter().any(|p| self.contains(*p)) {
            return true;
        }

        if other.contains(Point::between(first, diagonal)) {
            return true;
        }

        if self.contains(Point::between(other_first, other_diagonal)) {
            return true;
        }

        let center = Point::between(first, other_diagonal);
        self.contains(center) && other.contains(center)
    }
}

impl PartialEq for Boundary {
    fn eq(&self, other: &Self) -> bool {
        self.closed == other.closed && self.points == other.points
    }
}

/// Panics when `index` is out of range. Use [`Boundary::get`] for checked access.
impl Index<usize> for Boundary {
    type Output = Point;

    fn index(&self, index: usize) -> &Point {
        &self.points[index]
    }
}

impl<'a> IntoIterator for &'a Boundary {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl TryFrom<BoundaryData> for Boundary {
    type Error = PlumeError;

    /// Replays the points through [`Boundary::set_next`]. A closed boundary
    /// must hold at least three points followed by a repeat of the first.
    fn try_from(data: BoundaryData) -> Result<Self> {
        let mut boundary = Boundary::new();
        for point in data.points {
            boundary.set_next(point)?;
        }
        if data.closed {
            let len = boundary.len();
            if len < 4 || boundary.points.first() != boundary.points.last() {
                return Err(PlumeError::Usage(format!(
                    "a closed boundary needs at least three points and a repeated first point, got {} points",
                    len
                )));
            }
            boundary.closed = true;
        }
        Ok(boundary)
    }
}

impl From<Boundary> for BoundaryData {
    fn from(boundary: Boundary) -> Self {
        BoundaryData {
            points: boundary.points,
            closed: boundary.closed,
        }
    }
}
