//! Green coordinates for curved cages.
//!
//! For a mesh vertex η and a boundary segment in power-basis form, the rows
//! built here make
//! `η = Σ_segments [Σ_j w_j·a_j + Σ_j w'_j·rot(a_j)]`
//! hold against the bind cage's own coefficients, where `rot` is the
//! orientation-aware 90° rotation. Both boundary positions and rotated
//! derivative coefficients contribute, so a deformed cage transfers stretch
//! and rotation to the interior, not just translation.
//!
//! Every row is substituted back against the bind basis as it is built; the
//! worst reconstruction error is part of the table diagnostics.

use std::f64::consts::PI;

use log::debug;
use rayon::prelude::*;

use crate::error::{Result, WeightError};
use crate::geometry::basis::MonomialSegment;
use crate::geometry::bezier::BezierSegment;
use crate::geometry::cage::{CurvedCage, Degree, Orientation};
use crate::math::complex::planar;
use crate::math::kernel::{cubic_kernel, linear_kernel, quadratic_kernel};
use crate::math::{dot_2d, Point3, Vector3, TOLERANCE};

use super::{BuildDiagnostics, WeightKind, WeightTable};

/// A segment readied for kernel evaluation.
struct PreparedSegment {
    basis: MonomialSegment,
    end: Point3,
}

impl PreparedSegment {
    fn exact(segment: &BezierSegment) -> Result<Self> {
        Ok(Self {
            basis: MonomialSegment::from_segment(segment)?,
            end: segment.end(),
        })
    }

    fn chordal(segment: &BezierSegment) -> Result<Self> {
        Ok(Self {
            basis: MonomialSegment::chord_of(segment)?,
            end: segment.end(),
        })
    }
}

/// Builds the Green weight table for a cage and a set of mesh vertices.
///
/// `target` selects the evaluation basis degree: equal to the cage degree
/// for plain deformation, higher (typically 7) when the cage will be
/// elevated for display editing, lower for coarse preview. Rows hold
/// `2·target + 1` scalars per segment.
///
/// # Errors
///
/// Returns an error for a degree-7 source cage or a degenerate segment.
pub fn weight_table(
    cage: &CurvedCage,
    vertices: &[Point3],
    target: Degree,
) -> Result<WeightTable> {
    if cage.degree() == Degree::Septic {
        return Err(WeightError::UnsupportedSourceDegree { got: 7 }.into());
    }
    let prepared = cage
        .segments()
        .iter()
        .map(PreparedSegment::exact)
        .collect::<Result<Vec<_>>>()?;
    build(cage, vertices, &prepared, target)
}

/// Builds a mixed table for a cubic cage where only flagged segments keep
/// their full curved basis; the rest are straightened to their chords.
///
/// Trades accuracy for speed on cages where few edges genuinely curve:
/// straightened segments use the linear kernel, flagged ones the cubic one.
///
/// # Errors
///
/// Returns an error if the cage is not cubic or the flag list length does
/// not match the segment count.
pub fn weight_table_mixed(
    cage: &CurvedCage,
    vertices: &[Point3],
    curved: &[bool],
) -> Result<WeightTable> {
    if cage.degree() != Degree::Cubic {
        return Err(WeightError::DegreeMismatch {
            expected: 3,
            got: cage.degree().as_usize(),
        }
        .into());
    }
    if curved.len() != cage.segment_count() {
        return Err(WeightError::FlagCountMismatch {
            flags: curved.len(),
            segments: cage.segment_count(),
        }
        .into());
    }
    let prepared = cage
        .segments()
        .iter()
        .zip(curved)
        .map(|(seg, &keep)| {
            if keep {
                PreparedSegment::exact(seg)
            } else {
                PreparedSegment::chordal(seg)
            }
        })
        .collect::<Result<Vec<_>>>()?;
    build(cage, vertices, &prepared, Degree::Cubic)
}

fn build(
    cage: &CurvedCage,
    vertices: &[Point3],
    prepared: &[PreparedSegment],
    target: Degree,
) -> Result<WeightTable> {
    let k = target.as_usize();
    let stride = 2 * k + 1;
    let orientation = cage.orientation();

    let per_vertex: Vec<(Vec<f64>, f64, bool)> = vertices
        .par_iter()
        .map(|eta| vertex_row(prepared, eta, k, orientation))
        .collect();

    // The reconstruction identity only applies when no segment's basis is
    // truncated by the target degree.
    let exact_basis = prepared
        .iter()
        .all(|seg| seg.basis.effective_degree() <= k);

    let mut max_err = 0.0_f64;
    let mut degraded_rows = 0;
    let mut rows = Vec::with_capacity(per_vertex.len());
    for (row, err, degraded) in per_vertex {
        max_err = max_err.max(err);
        if degraded {
            degraded_rows += 1;
        }
        rows.push(row);
    }
    let diagnostics = BuildDiagnostics {
        max_reproduction_error: exact_basis.then_some(max_err),
        degraded_rows,
    };
    debug!(
        "green weights: {} rows x {} scalars, max reproduction error {:?}, {} degraded rows",
        rows.len(),
        prepared.len() * stride,
        diagnostics.max_reproduction_error,
        degraded_rows
    );

    Ok(WeightTable::new(
        rows,
        prepared.len() * stride,
        prepared.len(),
        WeightKind::Green {
            source: cage.degree(),
            target,
        },
        cage.version(),
        diagnostics,
    ))
}

fn vertex_row(
    prepared: &[PreparedSegment],
    eta: &Point3,
    target: usize,
    orientation: Orientation,
) -> (Vec<f64>, f64, bool) {
    let stride = 2 * target + 1;
    let mut row = vec![0.0; prepared.len() * stride];
    let mut rec = Vector3::zeros();
    let mut degraded = false;

    for (s, seg) in prepared.iter().enumerate() {
        let slot = &mut row[s * stride..(s + 1) * stride];
        degraded |= segment_weights(seg, eta, target, orientation, slot);

        let a = seg.basis.coefficients();
        let avail = a.len().min(target + 1);
        for (j, aj) in a.iter().enumerate().take(avail) {
            rec += aj * slot[j];
        }
        for (j, aj) in a.iter().enumerate().take(avail).skip(1) {
            rec += orientation.outward(aj) * slot[target + j];
        }
    }

    let err = (rec.x - eta.x).hypot(rec.y - eta.y);
    (row, err, degraded)
}

/// Fills one segment's `2·target + 1` weights; returns the degraded flag.
fn segment_weights(
    seg: &PreparedSegment,
    eta: &Point3,
    target: usize,
    orientation: Orientation,
    out: &mut [f64],
) -> bool {
    let e0 = seg.basis.coefficients()[0] - eta.coords;
    let z0 = planar(&e0);
    let d = seg.basis.effective_degree();
    #[allow(clippy::cast_possible_truncation)]
    let max_order = (target + 2 * d - 1) as u32;

    let mut degraded = false;
    let mut f = Vec::with_capacity(max_order as usize + 1);
    match &seg.basis {
        MonomialSegment::Linear { a } => {
            let z1 = planar(&a[1]);
            for m in 0..=max_order {
                let k = linear_kernel(z0, z1, m);
                degraded |= k.degraded;
                f.push(k.value);
            }
        }
        MonomialSegment::Quadratic { a } => {
            let z1 = planar(&a[1]);
            let z2 = planar(&a[2]);
            for m in 0..=max_order {
                let k = quadratic_kernel(z0, z1, z2, m);
                degraded |= k.degraded;
                f.push(k.value);
            }
        }
        MonomialSegment::Cubic { a } => {
            let z1 = planar(&a[1]);
            let z2 = planar(&a[2]);
            let z3 = planar(&a[3]);
            for m in 0..=max_order {
                let k = cubic_kernel(z0, z1, z2, z3, m);
                degraded |= k.degraded;
                f.push(k.value);
            }
        }
    }

    // Log-singular residue at the segment's far endpoint, once per
    // derivative weight. Clamped away from the corner itself.
    let mut r = (seg.end.x - eta.x).hypot(seg.end.y - eta.y);
    if r < TOLERANCE {
        r = TOLERANCE;
        degraded = true;
    }
    let log_term = r.ln() / (2.0 * PI);

    let rot = |v: &Vector3| orientation.outward(v);
    match &seg.basis {
        MonomialSegment::Linear { a } => {
            let c1 = &a[1];
            let p0 = dot_2d(&e0, &rot(c1));
            for j in 0..=target {
                out[j] = p0 * f[j];
            }
            let q0 = dot_2d(&e0, c1);
            let q1 = dot_2d(c1, c1);
            for j in 1..=target {
                out[target + j] = q0 * f[j] + q1 * f[j + 1] - log_term;
            }
        }
        MonomialSegment::Quadratic { a } => {
            let (c1, c2) = (&a[1], &a[2]);
            let p0 = dot_2d(&e0, &rot(c1));
            let p1 = 2.0 * dot_2d(&e0, &rot(c2));
            let p2 = dot_2d(c1, &rot(c2));
            for j in 0..=target {
                out[j] = p0 * f[j] + p1 * f[j + 1] + p2 * f[j + 2];
            }
            let q0 = dot_2d(&e0, c1);
            let q1 = dot_2d(c1, c1) + 2.0 * dot_2d(&e0, c2);
            let q2 = 3.0 * dot_2d(c1, c2);
            let q3 = 2.0 * dot_2d(c2, c2);
            for j in 1..=target {
                out[target + j] =
                    q0 * f[j] + q1 * f[j + 1] + q2 * f[j + 2] + q3 * f[j + 3] - log_term;
            }
        }
        MonomialSegment::Cubic { a } => {
            let (c1, c2, c3) = (&a[1], &a[2], &a[3]);
            let p0 = dot_2d(&e0, &rot(c1));
            let p1 = 2.0 * dot_2d(&e0, &rot(c2));
            // t² coefficient of (x-η)·rot(x'): the two c1/c2 cross terms
            // collapse to a single c1·rot(c2).
            let p2 = 3.0 * dot_2d(&e0, &rot(c3)) + dot_2d(c1, &rot(c2));
            let p3 = 2.0 * dot_2d(c1, &rot(c3));
            let p4 = dot_2d(c2, &rot(c3));
            for j in 0..=target {
                out[j] =
                    p0 * f[j] + p1 * f[j + 1] + p2 * f[j + 2] + p3 * f[j + 3] + p4 * f[j + 4];
            }
            let q0 = dot_2d(&e0, c1);
            let q1 = dot_2d(c1, c1) + 2.0 * dot_2d(&e0, c2);
            let q2 = 3.0 * dot_2d(c1, c2) + 3.0 * dot_2d(&e0, c3);
            let q3 = 2.0 * dot_2d(c2, c2) + 4.0 * dot_2d(c1, c3);
            let q4 = 5.0 * dot_2d(c2, c3);
            let q5 = 3.0 * dot_2d(c3, c3);
            for j in 1..=target {
                out[target + j] = q0 * f[j]
                    + q1 * f[j + 1]
                    + q2 * f[j + 2]
                    + q3 * f[j + 3]
                    + q4 * f[j + 4]
                    + q5 * f[j + 5]
                    - log_term;
            }
        }
    }
    degraded
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::rotate_cw;

    fn square_cage(degree: Degree) -> CurvedCage {
        let corners = [
            Point3::new(2.0, -2.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(-2.0, 2.0, 0.0),
            Point3::new(-2.0, -2.0, 0.0),
        ];
        let d = degree.as_usize();
        let mut pts = Vec::new();
        for i in 0..4 {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            #[allow(clippy::cast_precision_loss)]
            for j in 0..d {
                let t = j as f64 / d as f64;
                pts.push(Point3::from(a.coords * (1.0 - t) + b.coords * t));
            }
        }
        CurvedCage::from_control_points(&pts, degree).unwrap()
    }

    /// Quadratic square with the edge midpoints pushed outward.
    fn bulged_quadratic_cage() -> CurvedCage {
        let corners = [
            Point3::new(2.0, -2.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(-2.0, 2.0, 0.0),
            Point3::new(-2.0, -2.0, 0.0),
        ];
        let mut pts = Vec::new();
        for i in 0..4 {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            let chord = b - a;
            let outward = rotate_cw(&chord) / chord.norm();
            pts.push(a);
            pts.push(Point3::from(a.coords + chord * 0.5 + outward * 0.5));
        }
        CurvedCage::from_control_points(&pts, Degree::Quadratic).unwrap()
    }

    /// Cubic diamond with asymmetric outward bulges (genuinely cubic
    /// monomial content on every edge).
    fn curved_cubic_cage() -> CurvedCage {
        let corners = [
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
            Point3::new(-3.0, 0.0, 0.0),
            Point3::new(0.0, -3.0, 0.0),
        ];
        let mut pts = Vec::new();
        for i in 0..4 {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            let chord = b - a;
            let outward = rotate_cw(&chord) / chord.norm();
            pts.push(a);
            pts.push(Point3::from(a.coords + chord / 3.0 + outward * 0.6));
            pts.push(Point3::from(a.coords + chord * (2.0 / 3.0) + outward * 0.2));
        }
        CurvedCage::from_control_points(&pts, Degree::Cubic).unwrap()
    }

    fn interior_probes() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.7, -0.4, 0.0),
            Point3::new(-1.1, 0.9, 0.0),
        ]
    }

    #[test]
    fn square_cubic_cage_reproduces_origin() {
        let cage = square_cage(Degree::Cubic);
        let table = weight_table(&cage, &[Point3::new(0.0, 0.0, 0.0)], Degree::Cubic).unwrap();
        let err = table.diagnostics().max_reproduction_error.unwrap();
        assert!(err < 1e-6, "reproduction error {err}");
        assert_eq!(table.row_len(), 4 * 7);
    }

    #[test]
    fn linear_cage_reproduces_interior_points() {
        let cage = square_cage(Degree::Linear);
        let table = weight_table(&cage, &interior_probes(), Degree::Linear).unwrap();
        assert!(table.diagnostics().max_reproduction_error.unwrap() < 1e-6);
        assert_eq!(table.row_len(), 4 * 3);
    }

    #[test]
    fn curved_quadratic_cage_reproduces_interior_points() {
        let cage = bulged_quadratic_cage();
        let table = weight_table(&cage, &interior_probes(), Degree::Quadratic).unwrap();
        assert!(table.diagnostics().max_reproduction_error.unwrap() < 1e-6);
    }

    #[test]
    fn curved_cubic_cage_reproduces_interior_points() {
        let cage = curved_cubic_cage();
        let table = weight_table(&cage, &interior_probes(), Degree::Cubic).unwrap();
        assert!(table.diagnostics().max_reproduction_error.unwrap() < 1e-6);
    }

    #[test]
    fn elevated_target_keeps_reproduction() {
        let cage = curved_cubic_cage();
        let table = weight_table(&cage, &interior_probes(), Degree::Septic).unwrap();
        assert!(table.diagnostics().max_reproduction_error.unwrap() < 1e-6);
        assert_eq!(table.row_len(), 4 * 15);
    }

    #[test]
    fn truncating_target_skips_reproduction_check() {
        let cage = curved_cubic_cage();
        let table = weight_table(&cage, &interior_probes(), Degree::Linear).unwrap();
        assert!(table.diagnostics().max_reproduction_error.is_none());
        assert_eq!(table.row_len(), 4 * 3);
    }

    #[test]
    fn cyclic_segment_relabeling_permutes_rows() {
        let cage = curved_cubic_cage();
        let mut shifted_pts = cage.flat_control_points();
        shifted_pts.rotate_left(3);
        let shifted = CurvedCage::from_control_points(&shifted_pts, Degree::Cubic).unwrap();

        let probes = interior_probes();
        let table = weight_table(&cage, &probes, Degree::Cubic).unwrap();
        let table_shifted = weight_table(&shifted, &probes, Degree::Cubic).unwrap();

        let stride = 7;
        for v in 0..probes.len() {
            let row = table.row(v);
            let row_shifted = table_shifted.row(v);
            for s in 0..4 {
                let orig = &row[((s + 1) % 4) * stride..((s + 1) % 4) * stride + stride];
                let shif = &row_shifted[s * stride..s * stride + stride];
                for (a, b) in orig.iter().zip(shif) {
                    assert!((a - b).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn reversed_cage_still_reproduces() {
        let cage = curved_cubic_cage();
        let mut reversed_pts = cage.flat_control_points();
        reversed_pts.reverse();
        let reversed = CurvedCage::from_control_points(&reversed_pts, Degree::Cubic).unwrap();
        assert_eq!(reversed.orientation(), Orientation::Clockwise);

        let table = weight_table(&reversed, &interior_probes(), Degree::Cubic).unwrap();
        assert!(table.diagnostics().max_reproduction_error.unwrap() < 1e-6);
    }

    #[test]
    fn orientation_flag_flips_point_weights_only() {
        let cage = curved_cubic_cage();
        let seg = PreparedSegment::exact(&cage.segments()[0]).unwrap();
        let eta = Point3::new(0.0, 0.0, 0.0);
        let mut ccw = vec![0.0; 7];
        let mut cw = vec![0.0; 7];
        segment_weights(&seg, &eta, 3, Orientation::CounterClockwise, &mut ccw);
        segment_weights(&seg, &eta, 3, Orientation::Clockwise, &mut cw);
        for j in 0..=3 {
            assert!((ccw[j] + cw[j]).abs() < 1e-12, "point weight {j}");
        }
        for j in 4..7 {
            assert!((ccw[j] - cw[j]).abs() < 1e-12, "derivative weight {j}");
        }
    }

    #[test]
    fn mixed_table_reproduces_with_single_curved_segment() {
        // One genuinely curved edge, three straight ones.
        let corners = [
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
            Point3::new(-3.0, 0.0, 0.0),
            Point3::new(0.0, -3.0, 0.0),
        ];
        let mut pts = Vec::new();
        for i in 0..4 {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            let chord = b - a;
            pts.push(a);
            if i == 0 {
                let outward = rotate_cw(&chord) / chord.norm();
                pts.push(Point3::from(a.coords + chord / 3.0 + outward * 0.7));
                pts.push(Point3::from(a.coords + chord * (2.0 / 3.0) + outward * 0.3));
            } else {
                pts.push(Point3::from(a.coords + chord / 3.0));
                pts.push(Point3::from(a.coords + chord * (2.0 / 3.0)));
            }
        }
        let cage = CurvedCage::from_control_points(&pts, Degree::Cubic).unwrap();
        let table =
            weight_table_mixed(&cage, &interior_probes(), &[true, false, false, false]).unwrap();
        assert!(table.diagnostics().max_reproduction_error.unwrap() < 1e-6);
    }

    #[test]
    fn mixed_table_checks_flag_count() {
        let cage = curved_cubic_cage();
        assert!(weight_table_mixed(&cage, &interior_probes(), &[true, false]).is_err());
    }

    #[test]
    fn septic_source_rejected() {
        let cage = curved_cubic_cage().with_degree(Degree::Septic).unwrap();
        assert!(weight_table(&cage, &interior_probes(), Degree::Septic).is_err());
    }

    #[test]
    fn sightline_through_nonconvex_cage_degrades_but_reproduces() {
        // L-shaped degree-1 cage; the probe sits on the supporting line of
        // the edge from (2,1) to (1,1) without touching the segment.
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let cage = CurvedCage::from_control_points(&pts, Degree::Linear).unwrap();
        let table =
            weight_table(&cage, &[Point3::new(0.5, 1.0, 0.0)], Degree::Linear).unwrap();
        assert_eq!(table.diagnostics().degraded_rows, 1);
        assert!(table.diagnostics().max_reproduction_error.unwrap() < 1e-6);
    }
}
