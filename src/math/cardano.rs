use num_complex::Complex64;

use super::complex::cube_root;

/// Closed-form roots of the cubic `a·x³ + b·x² + c·x + d = 0` with complex
/// coefficients.
///
/// Uses the depressed-cubic substitution. Of the two radicand candidates
/// `u + v` and `u - v`, the larger-magnitude one feeds the principal cube
/// root; picking the smaller one cancels catastrophically when the two are
/// close. The remaining roots follow from the complex cube roots of unity,
/// which fixes one consistent ordering of the three roots for the kernels
/// built on top.
///
/// The leading coefficient must be non-zero; callers classify degenerate
/// cubics down to quadratics or lines before reaching this solver.
#[must_use]
pub fn solve_cubic(
    a: Complex64,
    b: Complex64,
    c: Complex64,
    d: Complex64,
) -> [Complex64; 3] {
    debug_assert!(a.norm_sqr() > 0.0, "cubic leading coefficient is zero");

    let u = (9.0 * a * b * c - 27.0 * a * a * d - 2.0 * b * b * b) / (54.0 * a * a * a);
    let v = (3.0
        * (4.0 * a * c * c * c - b * b * c * c - 18.0 * a * b * c * d
            + 27.0 * a * a * d * d
            + 4.0 * b * b * b * d))
        .sqrt()
        / (18.0 * a * a);

    let m = if (u + v).norm_sqr() >= (u - v).norm_sqr() {
        cube_root(u + v)
    } else {
        cube_root(u - v)
    };

    let n = if m.norm_sqr() > 0.0 {
        (b * b - 3.0 * a * c) / (9.0 * a * a * m)
    } else {
        Complex64::new(0.0, 0.0)
    };

    let omega1 = Complex64::new(-0.5, 3.0_f64.sqrt() / 2.0);
    let omega2 = Complex64::new(-0.5, -(3.0_f64.sqrt()) / 2.0);
    let shift = b / (3.0 * a);

    [
        m + n - shift,
        omega1 * m + omega2 * n - shift,
        omega2 * m + omega1 * n - shift,
    ]
}
