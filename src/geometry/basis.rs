//! Bezier ⇄ monomial conversion and degree elevation/reduction.

use crate::error::{CageError, NumericError, Result, WeightError};
use crate::math::{norm_2d, Point3, Vector3};

use super::bezier::BezierSegment;

/// Trailing monomial coefficients below this fraction of the largest
/// coefficient are treated as zero when classifying the effective degree.
const TRIM_RELATIVE_TOL: f64 = 1e-9;

/// Converts Bezier control points to monomial (power-basis) coefficients.
///
/// Explicit finite-difference expansions for degrees 1-3:
/// `a1 = d·(P1-P0)` for degree d = 1; `a1 = 2(P1-P0)`, `a2 = P2-2P1+P0` for
/// quadratics; `a1 = 3(P1-P0)`, `a2 = 3(P2-2P1+P0)`, `a3 = P3-3P2+3P1-P0`
/// for cubics. Higher degrees use the signed binomial expansion.
#[must_use]
pub fn monomial_coefficients(points: &[Point3]) -> Vec<Vector3> {
    match points {
        [p0, p1] => vec![p0.coords, p1 - p0],
        [p0, p1, p2] => vec![
            p0.coords,
            (p1 - p0) * 2.0,
            p2.coords - p1.coords * 2.0 + p0.coords,
        ],
        [p0, p1, p2, p3] => vec![
            p0.coords,
            (p1 - p0) * 3.0,
            (p2.coords - p1.coords * 2.0 + p0.coords) * 3.0,
            p3.coords - p2.coords * 3.0 + p1.coords * 3.0 - p0.coords,
        ],
        _ => binomial_monomial(points),
    }
}

/// Degree-generic conversion via the binomial-expansion identity
/// `aₖ = Σ_{i≤k} C(n,i)·C(n-i,k-i)·(-1)^(k-i)·Pᵢ`.
fn binomial_monomial(points: &[Point3]) -> Vec<Vector3> {
    let n = points.len() - 1;
    let binom = pascal(n);
    (0..=n)
        .map(|k| {
            let mut sum = Vector3::zeros();
            for (i, point) in points.iter().enumerate().take(k + 1) {
                let j = k - i;
                if j <= n - i {
                    let mut coeff = binom[n][i] * binom[n - i][j];
                    if j % 2 == 1 {
                        coeff = -coeff;
                    }
                    sum += point.coords * coeff;
                }
            }
            sum
        })
        .collect()
}

/// Pascal's triangle up to row `n`.
fn pascal(n: usize) -> Vec<Vec<f64>> {
    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    for i in 0..=n {
        let mut row = vec![1.0; i + 1];
        for k in 1..i {
            row[k] = rows[i - 1][k - 1] + rows[i - 1][k];
        }
        rows.push(row);
    }
    rows
}

/// One degree-elevation step: the same curve with one more control point.
///
/// Interior point i becomes `i/(n+1)·P[i-1] + (1 - i/(n+1))·P[i]`; the
/// endpoints are unchanged.
#[must_use]
pub fn elevate_once(points: &[Point3]) -> Vec<Point3> {
    let n = points.len() - 1;
    let mut out = Vec::with_capacity(points.len() + 1);
    out.push(points[0]);
    #[allow(clippy::cast_precision_loss)]
    let next = (n + 1) as f64;
    for i in 1..points.len() {
        #[allow(clippy::cast_precision_loss)]
        let ratio = i as f64 / next;
        out.push(Point3::from(
            points[i - 1].coords * ratio + points[i].coords * (1.0 - ratio),
        ));
    }
    out.push(points[points.len() - 1]);
    out
}

/// Elevates control points to exactly `target_degree` (shape-preserving).
///
/// # Errors
///
/// Returns an error if the target is below the current degree.
pub fn elevated(points: &[Point3], target_degree: usize) -> Result<Vec<Point3>> {
    let degree = points.len().saturating_sub(1);
    if target_degree < degree {
        return Err(CageError::UnsupportedDegreeChange {
            from: degree,
            to: target_degree,
        }
        .into());
    }
    let mut out = points.to_vec();
    for _ in degree..target_degree {
        out = elevate_once(&out);
    }
    Ok(out)
}

/// Lossy degree reduction for the interactive degree-change flow.
///
/// Keeps the endpoints, and for cubic → quadratic the midpoint of the two
/// interior controls. Only exact when the input already has the lower
/// degree's shape; never used for weight computation.
///
/// # Errors
///
/// Returns an error for unsupported degree pairs.
pub fn reduced(points: &[Point3], target_degree: usize) -> Result<Vec<Point3>> {
    let degree = points.len().saturating_sub(1);
    match (degree, target_degree) {
        (3, 2) => Ok(vec![
            points[0],
            Point3::from((points[1].coords + points[2].coords) * 0.5),
            points[3],
        ]),
        (3 | 2, 1) => Ok(vec![points[0], points[points.len() - 1]]),
        (from, to) => Err(CageError::UnsupportedDegreeChange { from, to }.into()),
    }
}

/// A segment re-expressed in the power basis, classified by *effective*
/// degree.
///
/// Trailing coefficients within tolerance of zero are dropped, so a
/// nominally cubic segment that is really a straight, linearly
/// parameterized edge dispatches to the linear kernel instead of feeding a
/// vanishing leading coefficient to the cubic solver.
#[derive(Debug, Clone)]
pub enum MonomialSegment {
    Linear { a: [Vector3; 2] },
    Quadratic { a: [Vector3; 3] },
    Cubic { a: [Vector3; 4] },
}

impl MonomialSegment {
    /// Re-expresses a Bezier segment in the power basis.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment collapses to a point, or if its
    /// degree is above cubic.
    pub fn from_segment(segment: &BezierSegment) -> Result<Self> {
        Self::from_coefficients(monomial_coefficients(segment.control_points()))
    }

    /// The straight chord of a segment as a linear monomial basis.
    ///
    /// # Errors
    ///
    /// Returns an error if the chord has zero length.
    pub fn chord_of(segment: &BezierSegment) -> Result<Self> {
        Self::from_coefficients(vec![
            segment.start().coords,
            segment.end() - segment.start(),
        ])
    }

    /// Classifies raw power-basis coefficients by effective degree.
    ///
    /// # Errors
    ///
    /// See [`MonomialSegment::from_segment`].
    pub fn from_coefficients(mut a: Vec<Vector3>) -> Result<Self> {
        let scale = a
            .iter()
            .map(norm_2d)
            .fold(1.0_f64, f64::max);
        while a.len() > 2 && norm_2d(&a[a.len() - 1]) <= scale * TRIM_RELATIVE_TOL {
            a.pop();
        }
        match a.len() {
            0 | 1 => Err(NumericError::DegenerateGeometry(
                "segment collapses to a point".into(),
            )
            .into()),
            2 => {
                if norm_2d(&a[1]) <= scale * TRIM_RELATIVE_TOL {
                    return Err(NumericError::DegenerateGeometry(
                        "segment collapses to a point".into(),
                    )
                    .into());
                }
                Ok(Self::Linear { a: [a[0], a[1]] })
            }
            3 => Ok(Self::Quadratic {
                a: [a[0], a[1], a[2]],
            }),
            4 => Ok(Self::Cubic {
                a: [a[0], a[1], a[2], a[3]],
            }),
            len => Err(WeightError::UnsupportedSourceDegree { got: len - 1 }.into()),
        }
    }

    /// The power-basis coefficients, lowest order first.
    #[must_use]
    pub fn coefficients(&self) -> &[Vector3] {
        match self {
            Self::Linear { a } => a,
            Self::Quadratic { a } => a,
            Self::Cubic { a } => a,
        }
    }

    /// The effective polynomial degree.
    #[must_use]
    pub fn effective_degree(&self) -> usize {
        self.coefficients().len() - 1
    }
}
