//! Cubic mean-value coordinates for polygonal cages.
//!
//! The cage polygon carries, per edge, a pair of tangential derivative
//! vectors `Gt` read directly off the cubic control points and a pair of
//! normal derivative vectors `Gn` solved from per-vertex 2×2 systems that
//! force the gradient to be single-valued where two edges meet. A mesh
//! vertex is then
//! `p = Σ_i vc_i·V_i + Σ gt·Gt + Σ gn·Gn`,
//! with `vc` the classical tan-half-angle mean-value weights and the
//! gradient-correction coefficients collected from a first-order expansion
//! around each polygon vertex. The expansion is exact for affine boundary
//! data, so reconstruction holds to machine precision for any interior
//! point of any simple polygon.

use log::debug;
use rayon::prelude::*;

use crate::error::{CageError, NumericError, Result, WeightError};
use crate::geometry::cage::{CurvedCage, Degree};
use crate::math::{cross_2d, dot_2d, norm_2d, rotate_cw, Matrix2, Point3, Vector3, TOLERANCE};

use super::{BuildDiagnostics, WeightKind, WeightTable};

/// Classical tan-half-angle mean-value weights of `p` inside a polygon.
///
/// `w_i = (tan(α_{i-1}/2) + tan(α_i/2)) / |V_i - p|`, normalized to sum to
/// one; angles are signed so non-convex polygons work as long as `p` stays
/// interior.
///
/// # Errors
///
/// Returns an error for fewer than three vertices or when `p` lies on a
/// vertex or an edge.
pub fn mean_value_weights(polygon: &[Point3], p: &Point3) -> Result<Vec<f64>> {
    let n = polygon.len();
    if n < 3 {
        return Err(CageError::TooFewSegments { min: 3, got: n }.into());
    }

    let spokes: Vec<Vector3> = polygon.iter().map(|v| v - p).collect();
    let radii: Vec<f64> = spokes.iter().map(norm_2d).collect();
    for r in &radii {
        if *r < TOLERANCE {
            return Err(NumericError::DegenerateGeometry(
                "evaluation point on a cage vertex".into(),
            )
            .into());
        }
    }

    let mut half_tangents = Vec::with_capacity(n);
    for i in 0..n {
        let j = (i + 1) % n;
        let angle = cross_2d(&spokes[i], &spokes[j]).atan2(dot_2d(&spokes[i], &spokes[j]));
        if angle.abs() > std::f64::consts::PI - 1e-9 {
            return Err(NumericError::DegenerateGeometry(
                "evaluation point on a cage edge".into(),
            )
            .into());
        }
        half_tangents.push((angle / 2.0).tan());
    }

    let mut weights = Vec::with_capacity(n);
    let mut sum = 0.0;
    for i in 0..n {
        let prev = (i + n - 1) % n;
        let w = (half_tangents[prev] + half_tangents[i]) / radii[i];
        weights.push(w);
        sum += w;
    }
    for w in &mut weights {
        *w /= sum;
    }
    Ok(weights)
}

/// The full cubic mean-value coordinates of one evaluation point.
#[derive(Debug, Clone)]
pub struct CubicMvcCoordinates {
    /// One mean-value weight per polygon vertex.
    pub vertex: Vec<f64>,
    /// Two tangential gradient-correction coefficients per edge.
    pub tangential: Vec<f64>,
    /// Two normal gradient-correction coefficients per edge.
    pub normal: Vec<f64>,
}

/// Computes vertex weights plus gradient-correction coefficients.
///
/// Each polygon vertex contributes its first-order estimate
/// `f_i + g_i·(p - V_i)` of the boundary data at `p`, with the vertex
/// gradient `g_i` split evenly between the (tangent, normal) frames of its
/// two incident edges. Collecting the frame projections of `p - V_i` as
/// coefficients of the `Gt`/`Gn` basis gives the correction coordinates.
///
/// # Errors
///
/// See [`mean_value_weights`].
pub fn cubic_mvc_coordinates(polygon: &[Point3], p: &Point3) -> Result<CubicMvcCoordinates> {
    let vertex = mean_value_weights(polygon, p)?;
    let n = polygon.len();
    let mut tangential = vec![0.0; 2 * n];
    let mut normal = vec![0.0; 2 * n];

    for i in 0..n {
        let j = (i + 1) % n;
        let edge = polygon[j] - polygon[i];
        let len = norm_2d(&edge);
        if len < TOLERANCE {
            return Err(NumericError::DegenerateGeometry(
                "zero-length polygon edge".into(),
            )
            .into());
        }
        let tangent = Vector3::new(edge.x / len, edge.y / len, 0.0);
        let normal_dir = rotate_cw(&tangent);
        let from_start = p - polygon[i];
        let from_end = p - polygon[j];

        tangential[2 * i] = 0.5 * vertex[i] * dot_2d(&tangent, &from_start);
        normal[2 * i] = 0.5 * vertex[i] * dot_2d(&normal_dir, &from_start);
        tangential[2 * i + 1] = -0.5 * vertex[j] * dot_2d(&tangent, &from_end);
        normal[2 * i + 1] = 0.5 * vertex[j] * dot_2d(&normal_dir, &from_end);
    }

    Ok(CubicMvcCoordinates {
        vertex,
        tangential,
        normal,
    })
}

/// Per-edge derivative basis vectors of a cubic cage.
///
/// `tangential[2i]`/`tangential[2i+1]` are the Bezier end-tangents
/// `3(P1-P0)/L` and `3(P2-P3)/L` of edge i, normalized by the bind-time
/// chord length; `normal` holds the per-vertex-end normal derivatives
/// solved from the gradient-continuity systems.
#[derive(Debug, Clone)]
pub struct GradientBasis {
    pub tangential: Vec<Vector3>,
    pub normal: Vec<Vector3>,
}

/// Derives the gradient basis of a cubic cage.
///
/// For every shared vertex, the 2×2 system
/// `[n_i | -n_{i-1}]·X = B` equates the gradient reconstructed from edge i
/// with the one from edge i-1, yielding the two unknown normal derivatives.
///
/// # Errors
///
/// Returns an error if the cage is not cubic, the chord-length list does
/// not match, a current chord vanishes, or two incident edges are parallel
/// (singular system).
pub fn gradient_basis(cage: &CurvedCage, chord_lengths: &[f64]) -> Result<GradientBasis> {
    if cage.degree() != Degree::Cubic {
        return Err(WeightError::DegreeMismatch {
            expected: 3,
            got: cage.degree().as_usize(),
        }
        .into());
    }
    let n = cage.segment_count();
    if chord_lengths.len() != n {
        return Err(WeightError::ChordCountMismatch {
            lengths: chord_lengths.len(),
            segments: n,
        }
        .into());
    }

    let mut tangential = vec![Vector3::zeros(); 2 * n];
    let mut normal = vec![Vector3::zeros(); 2 * n];
    let mut edge_tangents = Vec::with_capacity(n);
    let mut edge_normals = Vec::with_capacity(n);

    for (i, seg) in cage.segments().iter().enumerate() {
        let pts = seg.control_points();
        let chord = pts[3] - pts[0];
        let len = norm_2d(&chord);
        if len < TOLERANCE {
            return Err(NumericError::DegenerateGeometry(format!(
                "segment {i} chord collapsed during editing"
            ))
            .into());
        }
        tangential[2 * i] = (pts[1] - pts[0]) * (3.0 / chord_lengths[i]);
        tangential[2 * i + 1] = (pts[2] - pts[3]) * (3.0 / chord_lengths[i]);
        let tangent = Vector3::new(chord.x / len, chord.y / len, 0.0);
        edge_normals.push(rotate_cw(&tangent));
        edge_tangents.push(tangent);
    }

    for i in 0..n {
        let prev = (i + n - 1) % n;
        let a = Matrix2::new(
            edge_normals[i].x,
            -edge_normals[prev].x,
            edge_normals[i].y,
            -edge_normals[prev].y,
        );
        if a.determinant().abs() < TOLERANCE {
            return Err(NumericError::SingularSystem { vertex: i }.into());
        }
        let bx = -tangential[2 * prev + 1].x * edge_tangents[prev]
            - tangential[2 * i].x * edge_tangents[i];
        let by = -tangential[2 * prev + 1].y * edge_tangents[prev]
            - tangential[2 * i].y * edge_tangents[i];
        let b = Matrix2::new(bx.x, by.x, bx.y, by.y);
        let x = a
            .try_inverse()
            .ok_or(NumericError::SingularSystem { vertex: i })?
            * b;
        normal[2 * i] = Vector3::new(x[(0, 0)], x[(0, 1)], 0.0);
        normal[2 * prev + 1] = Vector3::new(x[(1, 0)], x[(1, 1)], 0.0);
    }

    Ok(GradientBasis {
        tangential,
        normal,
    })
}

/// Builds the cubic-MVC weight table for a cubic cage and mesh vertices.
///
/// Rows hold 5 scalars per segment: the vertex weight followed by the two
/// tangential and two normal gradient corrections. The bind cage's chord
/// lengths are recorded in the table so deformation can renormalize the
/// edited cage's tangents consistently. Reconstruction is exact when the
/// bind cage's edges are straight; the diagnostic reports the actual error
/// against the bind basis either way.
///
/// # Errors
///
/// Returns an error for a non-cubic cage, a degenerate polygon, or an
/// evaluation point on the cage boundary.
pub fn weight_table(cage: &CurvedCage, vertices: &[Point3]) -> Result<WeightTable> {
    let polygon = cage.polygon();
    let n = cage.segment_count();
    let chord_lengths: Vec<f64> = cage
        .segments()
        .iter()
        .map(|seg| norm_2d(&(seg.end() - seg.start())))
        .collect();
    let basis = gradient_basis(cage, &chord_lengths)?;

    let per_vertex: Vec<(Vec<f64>, f64)> = vertices
        .par_iter()
        .map(|p| {
            let coords = cubic_mvc_coordinates(&polygon, p)?;
            let mut row = Vec::with_capacity(5 * n);
            let mut rec = Vector3::zeros();
            for i in 0..n {
                row.push(coords.vertex[i]);
                row.push(coords.tangential[2 * i]);
                row.push(coords.tangential[2 * i + 1]);
                row.push(coords.normal[2 * i]);
                row.push(coords.normal[2 * i + 1]);

                rec += polygon[i].coords * coords.vertex[i];
                rec += basis.tangential[2 * i] * coords.tangential[2 * i];
                rec += basis.tangential[2 * i + 1] * coords.tangential[2 * i + 1];
                rec += basis.normal[2 * i] * coords.normal[2 * i];
                rec += basis.normal[2 * i + 1] * coords.normal[2 * i + 1];
            }
            let err = (rec.x - p.x).hypot(rec.y - p.y);
            Ok((row, err))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut max_err = 0.0_f64;
    let mut rows = Vec::with_capacity(per_vertex.len());
    for (row, err) in per_vertex {
        max_err = max_err.max(err);
        rows.push(row);
    }
    let diagnostics = BuildDiagnostics {
        max_reproduction_error: Some(max_err),
        degraded_rows: 0,
    };
    debug!(
        "cubic-mvc weights: {} rows x {} scalars, max reproduction error {:?}",
        rows.len(),
        5 * n,
        diagnostics.max_reproduction_error
    );

    Ok(WeightTable::new(
        rows,
        5 * n,
        n,
        WeightKind::CubicMvc { chord_lengths },
        cage.version(),
        diagnostics,
    ))
}
