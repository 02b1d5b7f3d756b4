use crate::error::{CageError, Result};
use crate::math::Point3;

/// A Bezier curve segment.
///
/// Holds `degree + 1` control points; constructing from N points fixes the
/// degree at N - 1.
#[derive(Debug, Clone, PartialEq)]
pub struct BezierSegment {
    points: Vec<Point3>,
}

impl BezierSegment {
    /// Creates a segment from its control points.
    ///
    /// # Errors
    ///
    /// Returns an error if the control-point list is empty.
    pub fn new(points: Vec<Point3>) -> Result<Self> {
        if points.is_empty() {
            return Err(CageError::EmptyControlPoints.into());
        }
        Ok(Self { points })
    }

    /// Returns the polynomial degree of the segment.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.points.len() - 1
    }

    /// Returns the control points.
    #[must_use]
    pub fn control_points(&self) -> &[Point3] {
        &self.points
    }

    /// Returns the first control point (the curve at t = 0).
    #[must_use]
    pub fn start(&self) -> Point3 {
        self.points[0]
    }

    /// Returns the last control point (the curve at t = 1).
    #[must_use]
    pub fn end(&self) -> Point3 {
        self.points[self.points.len() - 1]
    }

    /// Replaces one control point in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    pub fn set_control_point(&mut self, index: usize, position: Point3) -> Result<()> {
        if index >= self.points.len() {
            return Err(CageError::PointIndexOutOfRange {
                index,
                count: self.points.len(),
            }
            .into());
        }
        self.points[index] = position;
        Ok(())
    }

    /// Evaluates the curve at parameter `t` via de Casteljau's algorithm.
    ///
    /// Each pass collapses neighbouring points by the convex combination
    /// `(1-t)·P[j] + t·P[j+1]`; after `degree` passes a single point
    /// remains. Pure in `(points, t)`; `t` is conventionally in `[0, 1]`.
    #[must_use]
    pub fn evaluate(&self, t: f64) -> Point3 {
        let mut tmp = self.points.clone();
        let n = tmp.len();
        for level in 1..n {
            for j in 0..n - level {
                tmp[j] = Point3::from(tmp[j].coords * (1.0 - t) + tmp[j + 1].coords * t);
            }
        }
        tmp[0]
    }
}
