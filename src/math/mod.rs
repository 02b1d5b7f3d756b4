pub mod cardano;
pub mod complex;
pub mod kernel;

/// 3D point type. Planar math reads the XY components; z is carried through.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 2x2 matrix for the per-vertex gradient solves.
pub type Matrix2 = nalgebra::Matrix2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Planar dot product (XY components only).
#[must_use]
pub fn dot_2d(a: &Vector3, b: &Vector3) -> f64 {
    a.x * b.x + a.y * b.y
}

/// Planar cross product (z component of `a × b`).
#[must_use]
pub fn cross_2d(a: &Vector3, b: &Vector3) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Planar length (XY components only).
#[must_use]
pub fn norm_2d(v: &Vector3) -> f64 {
    v.x.hypot(v.y)
}

/// Rotates a vector 90 degrees clockwise in the XY plane; z passes through.
///
/// For a counter-clockwise boundary this maps a tangent onto the outward
/// normal.
#[must_use]
pub fn rotate_cw(v: &Vector3) -> Vector3 {
    Vector3::new(v.y, -v.x, v.z)
}

/// Computes the signed area of a polygon in the XY plane (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point3]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn signed_area_ccw_square() {
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let area = signed_area_2d(&pts);
        assert!((area - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_cw_square() {
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let area = signed_area_2d(&pts);
        assert!((area + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_degenerate() {
        assert!(signed_area_2d(&[Point3::new(0.0, 0.0, 0.0)]).abs() < TOLERANCE);
        assert!(signed_area_2d(&[]).abs() < TOLERANCE);
    }

    #[test]
    fn rotate_cw_maps_tangent_to_right_normal() {
        let v = Vector3::new(1.0, 0.0, 0.5);
        let r = rotate_cw(&v);
        assert!(r.x.abs() < TOLERANCE);
        assert!((r.y + 1.0).abs() < TOLERANCE);
        assert!((r.z - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn rotate_cw_is_planar_isometry() {
        let v = Vector3::new(3.0, 4.0, 0.0);
        let r = rotate_cw(&v);
        assert!((norm_2d(&r) - 5.0).abs() < TOLERANCE);
        assert!(dot_2d(&v, &r).abs() < TOLERANCE);
    }

    #[test]
    fn cross_2d_orientation_sign() {
        let x = Vector3::new(1.0, 0.0, 0.0);
        let y = Vector3::new(0.0, 1.0, 0.0);
        assert!((cross_2d(&x, &y) - 1.0).abs() < TOLERANCE);
        assert!((cross_2d(&y, &x) + 1.0).abs() < TOLERANCE);
    }
}
