use num_complex::Complex64;

use super::Vector3;

/// Builds a complex number from the XY components of a vector.
#[must_use]
pub fn planar(v: &Vector3) -> Complex64 {
    Complex64::new(v.x, v.y)
}

/// Mirrors a root into the closed upper half-plane.
///
/// The contour-integral kernels pair every root with its conjugate. Forcing
/// a non-negative imaginary part keeps all roots on one side of the
/// principal-log branch cut, so the pairing stays consistent across
/// segments regardless of which sign the root finder happened to return.
#[must_use]
pub fn upper_half(z: Complex64) -> Complex64 {
    Complex64::new(z.re, z.im.abs())
}

/// Principal complex cube root.
#[must_use]
pub fn cube_root(z: Complex64) -> Complex64 {
    z.powf(1.0 / 3.0)
}
