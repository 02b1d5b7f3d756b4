//! Deformation evaluation against a bound weight table.
//!
//! The only routine that runs on every interactive cage edit: it re-derives
//! the current cage's basis vectors once (O(segments)) and then applies each
//! vertex's fixed linear combination. Weights are never recomputed here;
//! that is what makes dragging cage points interactive.

use rayon::prelude::*;

use crate::coords::mvc::gradient_basis;
use crate::coords::{WeightKind, WeightTable};
use crate::error::{Result, WeightError};
use crate::geometry::basis::monomial_coefficients;
use crate::geometry::cage::{CurvedCage, Degree};
use crate::math::{Point3, Vector3};

/// Reconstructs every mesh vertex from the weight table and the *current*
/// cage geometry.
///
/// The cage must match the table's topology: same segment count, and its
/// degree must equal the table's target degree (elevate or reduce the cage
/// first, rebuilding the table, for any other combination). Each output
/// keeps the corresponding rest position's z coordinate. Calling twice with
/// an unchanged cage yields identical output.
///
/// # Errors
///
/// Returns an error on any table/cage/mesh size mismatch, and for MVC
/// tables when the edited cage degenerates (collapsed chord, parallel
/// incident edges).
pub fn deform(
    table: &WeightTable,
    cage: &CurvedCage,
    rest_positions: &[Point3],
) -> Result<Vec<Point3>> {
    if table.vertex_count() != rest_positions.len() {
        return Err(WeightError::VertexCountMismatch {
            rows: table.vertex_count(),
            vertices: rest_positions.len(),
        }
        .into());
    }
    if table.segment_count() != cage.segment_count() {
        return Err(WeightError::SegmentCountMismatch {
            expected: table.segment_count(),
            got: cage.segment_count(),
        }
        .into());
    }

    match table.kind() {
        WeightKind::Green { target, .. } => deform_green(table, cage, rest_positions, *target),
        WeightKind::CubicMvc { chord_lengths } => {
            deform_mvc(table, cage, rest_positions, chord_lengths)
        }
    }
}

fn deform_green(
    table: &WeightTable,
    cage: &CurvedCage,
    rest_positions: &[Point3],
    target: Degree,
) -> Result<Vec<Point3>> {
    if cage.degree() != target {
        return Err(WeightError::DegreeMismatch {
            expected: target.as_usize(),
            got: cage.degree().as_usize(),
        }
        .into());
    }

    let k = target.as_usize();
    let orientation = cage.orientation();
    let mut basis: Vec<Vector3> = Vec::with_capacity(table.row_len());
    for seg in cage.segments() {
        let a = monomial_coefficients(seg.control_points());
        basis.extend_from_slice(&a);
        for aj in &a[1..] {
            basis.push(orientation.outward(aj));
        }
    }
    debug_assert_eq!(basis.len(), table.row_len());
    debug_assert_eq!(basis.len(), cage.segment_count() * (2 * k + 1));

    Ok(rest_positions
        .par_iter()
        .enumerate()
        .map(|(v, rest)| {
            let mut sum = Vector3::zeros();
            for (w, b) in table.row(v).iter().zip(&basis) {
                sum += b * *w;
            }
            Point3::new(sum.x, sum.y, rest.z)
        })
        .collect())
}

fn deform_mvc(
    table: &WeightTable,
    cage: &CurvedCage,
    rest_positions: &[Point3],
    chord_lengths: &[f64],
) -> Result<Vec<Point3>> {
    let basis = gradient_basis(cage, chord_lengths)?;
    let starts = cage.polygon();
    let n = cage.segment_count();

    Ok(rest_positions
        .par_iter()
        .enumerate()
        .map(|(v, rest)| {
            let row = table.row(v);
            let mut sum = Vector3::zeros();
            for i in 0..n {
                sum += starts[i].coords * row[5 * i];
                sum += basis.tangential[2 * i] * row[5 * i + 1];
                sum += basis.tangential[2 * i + 1] * row[5 * i + 2];
                sum += basis.normal[2 * i] * row[5 * i + 3];
                sum += basis.normal[2 * i + 1] * row[5 * i + 4];
            }
            Point3::new(sum.x, sum.y, rest.z)
        })
        .collect())
}
