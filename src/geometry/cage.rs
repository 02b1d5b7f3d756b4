//! Closed boundary cages of Bezier segments.

use crate::error::{CageError, Result};
use crate::math::{norm_2d, rotate_cw, signed_area_2d, Point3, Vector3, TOLERANCE};

use super::basis::{elevated, reduced};
use super::bezier::BezierSegment;

/// Segment degree of a cage.
///
/// Degrees 1-3 carry full weight-computation support; degree 7 exists as an
/// elevated evaluation basis for display and high-degree editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degree {
    Linear,
    Quadratic,
    Cubic,
    Septic,
}

impl Degree {
    /// The polynomial degree as a number.
    #[must_use]
    pub fn as_usize(self) -> usize {
        match self {
            Self::Linear => 1,
            Self::Quadratic => 2,
            Self::Cubic => 3,
            Self::Septic => 7,
        }
    }
}

/// Traversal orientation of the cage boundary.
///
/// Fixed when the cage is built and consulted by every weight computation;
/// flipping it flips the sign conventions of the rotated-derivative terms,
/// so it is recorded explicitly rather than assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    CounterClockwise,
    Clockwise,
}

impl Orientation {
    /// Maps a tangent direction onto the outward normal for this traversal.
    #[must_use]
    pub fn outward(self, v: &Vector3) -> Vector3 {
        match self {
            Self::CounterClockwise => rotate_cw(v),
            Self::Clockwise => -rotate_cw(v),
        }
    }
}

/// A closed, cyclic boundary of same-degree Bezier segments.
///
/// Built from a flat control-point list: `count / degree` segments of
/// `degree + 1` points each, with consecutive segments sharing an endpoint
/// and the last wrapping back to the first point. Control-point translation
/// mutates segments in place without touching the structural `version`;
/// degree changes produce a new cage with a bumped version so stale weight
/// tables can be detected by the caller.
#[derive(Debug, Clone)]
pub struct CurvedCage {
    segments: Vec<BezierSegment>,
    degree: Degree,
    orientation: Orientation,
    version: u64,
}

impl CurvedCage {
    /// Partitions a flat control-point list into a closed cage.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty, its length is not a multiple
    /// of the degree, fewer than two segments result, a segment chord has
    /// zero length, or the boundary encloses no area.
    pub fn from_control_points(points: &[Point3], degree: Degree) -> Result<Self> {
        let d = degree.as_usize();
        if points.is_empty() {
            return Err(CageError::EmptyControlPoints.into());
        }
        if points.len() % d != 0 {
            return Err(CageError::ControlPointCount {
                count: points.len(),
                degree: d,
            }
            .into());
        }
        let count = points.len() / d;
        if count < 2 {
            return Err(CageError::TooFewSegments { min: 2, got: count }.into());
        }

        let mut segments = Vec::with_capacity(count);
        for i in 0..count {
            let pts: Vec<Point3> = (0..=d).map(|j| points[(i * d + j) % points.len()]).collect();
            segments.push(BezierSegment::new(pts)?);
        }
        for (i, seg) in segments.iter().enumerate() {
            if norm_2d(&(seg.end() - seg.start())) < TOLERANCE {
                return Err(CageError::ZeroLengthChord { index: i }.into());
            }
        }

        let corners: Vec<Point3> = segments.iter().map(BezierSegment::start).collect();
        let area = signed_area_2d(&corners);
        if area.abs() < TOLERANCE {
            return Err(CageError::DegenerateBoundary.into());
        }
        let orientation = if area > 0.0 {
            Orientation::CounterClockwise
        } else {
            Orientation::Clockwise
        };

        Ok(Self {
            segments,
            degree,
            orientation,
            version: 0,
        })
    }

    /// Returns the segments in traversal order.
    #[must_use]
    pub fn segments(&self) -> &[BezierSegment] {
        &self.segments
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Returns the segment degree.
    #[must_use]
    pub fn degree(&self) -> Degree {
        self.degree
    }

    /// Returns the recorded boundary orientation.
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Returns the structural version; bumped by degree changes but not by
    /// control-point translation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the segment start points (the cage's corner polygon).
    #[must_use]
    pub fn polygon(&self) -> Vec<Point3> {
        self.segments.iter().map(BezierSegment::start).collect()
    }

    /// Returns the flat control-point list (degree points per segment, each
    /// shared endpoint listed once).
    #[must_use]
    pub fn flat_control_points(&self) -> Vec<Point3> {
        let d = self.degree.as_usize();
        let mut out = Vec::with_capacity(self.segments.len() * d);
        for seg in &self.segments {
            out.extend_from_slice(&seg.control_points()[..d]);
        }
        out
    }

    /// Moves one flat-indexed control point; a shared endpoint updates both
    /// segments that carry it. Does not bump the version; weight tables
    /// built against this cage topology stay valid.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    pub fn translate_control_point(&mut self, index: usize, position: Point3) -> Result<()> {
        let d = self.degree.as_usize();
        let count = self.segments.len();
        if index >= count * d {
            return Err(CageError::PointIndexOutOfRange {
                index,
                count: count * d,
            }
            .into());
        }
        let seg = index / d;
        let offset = index % d;
        self.segments[seg].set_control_point(offset, position)?;
        if offset == 0 {
            let prev = (seg + count - 1) % count;
            self.segments[prev].set_control_point(d, position)?;
        }
        Ok(())
    }

    /// Returns the cage re-expressed at `target` degree with a bumped
    /// version.
    ///
    /// Elevation is exact (same curve); reduction keeps endpoints (and the
    /// interior midpoint for cubic → quadratic) and is lossy. Any weight
    /// table bound to the old topology must be rebuilt before deforming
    /// against the result.
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported degree pairs or if the converted
    /// cage fails validation.
    pub fn with_degree(&self, target: Degree) -> Result<Self> {
        let from = self.degree.as_usize();
        let to = target.as_usize();
        let mut flat = Vec::with_capacity(self.segments.len() * to);
        for seg in &self.segments {
            let converted = if to >= from {
                elevated(seg.control_points(), to)?
            } else {
                reduced(seg.control_points(), to)?
            };
            flat.extend_from_slice(&converted[..to]);
        }
        let mut cage = Self::from_control_points(&flat, target)?;
        cage.version = self.version + 1;
        Ok(cage)
    }
}
