//! Closed-form contour-integral kernels.
//!
//! Each kernel evaluates `1/(2π) · ∫₀¹ tᵐ / |x(t)|² dt` where `x(t)` is a
//! boundary segment's monomial polynomial, translated so the evaluation
//! point sits at the origin. Writing `x(t)` as a complex polynomial factors
//! `|x(t)|²` over the polynomial's roots and their conjugates, which yields
//! closed forms built from principal logarithms and finite correction sums.
//!
//! Roots are mirrored into the upper half-plane before use (see
//! [`upper_half`]); the closed forms divide by root imaginary parts and
//! pairwise root distances, so configurations where those vanish fall back
//! to direct quadrature and flag the result as degraded.

use std::f64::consts::PI;

use num_complex::Complex64;

use super::cardano::solve_cubic;
use super::complex::upper_half;

/// A kernel evaluation together with its accuracy flag.
///
/// `degraded` marks values computed by the quadrature fallback instead of
/// the closed form (near-real or clustered roots). Evaluation points on the
/// segment itself are outside the domain of either path.
#[derive(Debug, Clone, Copy)]
pub struct KernelValue {
    pub value: f64,
    pub degraded: bool,
}

/// Roots closer than this to the real axis make the closed form divide by a
/// vanishing imaginary part.
const NEAR_REAL: f64 = 1e-10;

/// Roots closer than this to each other blow up the pairwise-difference
/// denominators faster than the numerators compensate.
const NEAR_EQUAL: f64 = 1e-7;

/// Subdivisions for the composite-Simpson fallback (must be even).
const FALLBACK_STEPS: u32 = 512;

/// Kernel over a linear segment `x(t) = c0 + c1·t`.
///
/// The single root `w = -c0/c1` gives
/// `Im[wᵐ·(log(1-w) - log(-w)) + U_m(w)] / (Im w · 2π·|c1|²)` with the
/// finite sum `U_m(w) = Σ_{k=1}^{m-1} wᵏ/(m-k)`.
#[must_use]
pub fn linear_kernel(c0: Complex64, c1: Complex64, m: u32) -> KernelValue {
    let w = -c0 / c1;
    if w.im.abs() < NEAR_REAL {
        return KernelValue {
            value: quadrature(&[c0, c1], m),
            degraded: true,
        };
    }

    let mut tail = Complex64::new(0.0, 0.0);
    for k in 1..m {
        tail += w.powu(k) / f64::from(m - k);
    }
    let one = Complex64::new(1.0, 0.0);
    let z = w.powu(m) * ((one - w).ln() - (-w).ln()) + tail;
    KernelValue {
        value: z.im / w.im / (2.0 * PI * c1.norm_sqr()),
        degraded: false,
    }
}

/// Kernel over a quadratic segment `x(t) = c0 + c1·t + c2·t²`.
///
/// The two quadratic-formula roots, mirrored into the upper half-plane,
/// combine two `Hyper` sums evaluated at the conjugate reciprocals of the
/// roots, weighted by the roots' real/imaginary parts and pairwise
/// distances.
#[must_use]
pub fn quadratic_kernel(c0: Complex64, c1: Complex64, c2: Complex64, m: u32) -> KernelValue {
    let disc = (c1 * c1 - 4.0 * c0 * c2).sqrt();
    let w1 = upper_half((-c1 - disc) / (2.0 * c2));
    let w2 = upper_half((-c1 + disc) / (2.0 * c2));

    if w1.im < NEAR_REAL || w2.im < NEAR_REAL || (w1 - w2).norm() < NEAR_EQUAL {
        return KernelValue {
            value: quadrature(&[c0, c1, c2], m),
            degraded: true,
        };
    }

    let (a, b) = (w1.re, w1.im);
    let (c, d) = (w2.re, w2.im);
    let w1c = w1.conj();
    let w2c = w2.conj();

    let numer = (w1 * (d * w2.norm_sqr()) * (w1 * w1 - 2.0 * c * w1 + (c * c + d * d))
        * hyper(w1c.inv(), m)
        + w2 * (b * w1.norm_sqr()) * (w2 * w2 - 2.0 * a * w2 + (a * a + b * b))
            * hyper(w2c.inv(), m))
    .im;
    let denom = b
        * w1.norm_sqr()
        * ((b - d).powi(2) + (a - c).powi(2))
        * w2.norm_sqr()
        * d
        * ((b + d).powi(2) + (a - c).powi(2))
        * f64::from(m + 1);

    KernelValue {
        value: numer / denom / (2.0 * PI * c2.norm_sqr()),
        degraded: false,
    }
}

/// Kernel over a cubic segment `x(t) = c0 + c1·t + c2·t² + c3·t³`.
///
/// The three Cardano roots, mirrored into the upper half-plane, each
/// contribute `(-w̄ᵐ·log(1 - 1/w̄) - A_m(w̄))` over a denominator of the
/// root's imaginary part and its pairwise differences with the other roots
/// and their conjugates, with `A_m(w) = Σ_{k=1}^{m} w^{m-k}/k`.
#[must_use]
pub fn cubic_kernel(
    c0: Complex64,
    c1: Complex64,
    c2: Complex64,
    c3: Complex64,
    m: u32,
) -> KernelValue {
    let [w1, w2, w3] = solve_cubic(c3, c2, c1, c0);
    let w1 = upper_half(w1);
    let w2 = upper_half(w2);
    let w3 = upper_half(w3);

    let near_real = w1.im < NEAR_REAL || w2.im < NEAR_REAL || w3.im < NEAR_REAL;
    let clustered = (w1 - w2).norm() < NEAR_EQUAL
        || (w1 - w3).norm() < NEAR_EQUAL
        || (w2 - w3).norm() < NEAR_EQUAL;
    if near_real || clustered {
        return KernelValue {
            value: quadrature(&[c0, c1, c2, c3], m),
            degraded: true,
        };
    }

    let total = cubic_term(w1, w2, w3, m) + cubic_term(w2, w1, w3, m) + cubic_term(w3, w1, w2, m);
    KernelValue {
        value: total / (2.0 * PI * c3.norm_sqr()),
        degraded: false,
    }
}

/// One root's contribution to the cubic kernel.
fn cubic_term(wi: Complex64, wj: Complex64, wk: Complex64, m: u32) -> f64 {
    let one = Complex64::new(1.0, 0.0);
    let wc = wi.conj();
    let numer = -wc.powu(m) * (one - wc.inv()).ln() - accumulated_sum(wc, m);
    let denom = wi.im * (wc - wj.conj()) * (wc - wj) * (wc - wk.conj()) * (wc - wk);
    (numer / denom).im
}

/// `Hyper(x, n) = (n+1)/xⁿ⁺¹ · (-log(1-x) - Σ_{k=1}^{n} xᵏ/k)`.
fn hyper(x: Complex64, n: u32) -> Complex64 {
    let one = Complex64::new(1.0, 0.0);
    let mut sum = Complex64::new(0.0, 0.0);
    for k in 1..=n {
        sum += x.powu(k) / f64::from(k);
    }
    f64::from(n + 1) / x.powu(n + 1) * (-(one - x).ln() - sum)
}

/// `A_m(w) = Σ_{k=1}^{m} w^{m-k}/k`.
fn accumulated_sum(w: Complex64, m: u32) -> Complex64 {
    let mut sum = Complex64::new(0.0, 0.0);
    for k in 1..=m {
        sum += w.powu(m - k) / f64::from(k);
    }
    sum
}

/// Composite-Simpson fallback for near-degenerate root configurations.
///
/// Integrates `tᵐ / |x(t)|²` directly; valid whenever the evaluation point
/// is not on the segment itself, which is exactly the regime where the
/// closed form loses digits but the integrand stays smooth.
fn quadrature(coeffs: &[Complex64], m: u32) -> f64 {
    let exponent = f64::from(m);
    let integrand = |t: f64| -> f64 {
        let mut x = Complex64::new(0.0, 0.0);
        for &c in coeffs.iter().rev() {
            x = x * t + c;
        }
        t.powf(exponent) / x.norm_sqr()
    };

    let h = 1.0 / f64::from(FALLBACK_STEPS);
    let mut sum = integrand(0.0) + integrand(1.0);
    for i in 1..FALLBACK_STEPS {
        let weight = if i % 2 == 0 { 2.0 } else { 4.0 };
        sum += weight * integrand(f64::from(i) * h);
    }
    sum * h / 3.0 / (2.0 * PI)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    /// Brute-force Simpson reference with its own (denser) step count, so the
    /// closed forms are checked against an independent evaluation.
    fn reference(coeffs: &[Complex64], m: u32) -> f64 {
        let steps = 4096_u32;
        let exponent = f64::from(m);
        let f = |t: f64| -> f64 {
            let mut x = Complex64::new(0.0, 0.0);
            for &c in coeffs.iter().rev() {
                x = x * t + c;
            }
            t.powf(exponent) / x.norm_sqr()
        };
        let h = 1.0 / f64::from(steps);
        let mut sum = f(0.0) + f(1.0);
        for i in 1..steps {
            let weight = if i % 2 == 0 { 2.0 } else { 4.0 };
            sum += weight * f(f64::from(i) * h);
        }
        sum * h / 3.0 / (2.0 * PI)
    }

    #[test]
    fn linear_kernel_matches_quadrature() {
        let c0 = Complex64::new(1.0, -0.7);
        let c1 = Complex64::new(-0.3, 1.4);
        for m in 0..9 {
            let k = linear_kernel(c0, c1, m);
            assert!(!k.degraded);
            assert!(
                (k.value - reference(&[c0, c1], m)).abs() < 1e-8,
                "order {m}"
            );
        }
    }

    #[test]
    fn quadratic_kernel_matches_quadrature() {
        let c0 = Complex64::new(1.0, 0.0);
        let c1 = Complex64::new(0.0, 1.0);
        let c2 = Complex64::new(-0.5, 1.0);
        for m in 0..11 {
            let k = quadratic_kernel(c0, c1, c2, m);
            assert!(!k.degraded);
            assert!(
                (k.value - reference(&[c0, c1, c2], m)).abs() < 1e-8,
                "order {m}"
            );
        }
    }

    #[test]
    fn cubic_kernel_matches_quadrature() {
        let c0 = Complex64::new(0.8, -1.1);
        let c1 = Complex64::new(1.9, 0.4);
        let c2 = Complex64::new(-0.6, 0.9);
        let c3 = Complex64::new(0.5, -0.3);
        for m in 0..13 {
            let k = cubic_kernel(c0, c1, c2, c3, m);
            assert!(
                (k.value - reference(&[c0, c1, c2, c3], m)).abs() < 1e-7,
                "order {m}: {} vs {}",
                k.value,
                reference(&[c0, c1, c2, c3], m)
            );
        }
    }

    #[test]
    fn collinear_configuration_degrades_gracefully() {
        // Root of c0 + c1 t is real: the evaluation point lies on the
        // segment's supporting line (outside the segment itself).
        let c0 = Complex64::new(2.0, 0.0);
        let c1 = Complex64::new(1.0, 0.0);
        let k = linear_kernel(c0, c1, 0);
        assert!(k.degraded);
        // Exact value of 1/(2π) ∫ dt/(2+t)^2 = 1/(2π) · (1/2 - 1/3).
        let exact = (0.5 - 1.0 / 3.0) / (2.0 * PI);
        assert_relative_eq!(k.value, exact, max_relative = 1e-8);
    }

    #[test]
    fn repeated_quadratic_roots_degrade_gracefully() {
        // (1 + t)^2: a double real root at -1.
        let c0 = Complex64::new(1.0, 0.0);
        let c1 = Complex64::new(2.0, 0.0);
        let c2 = Complex64::new(1.0, 0.0);
        let k = quadratic_kernel(c0, c1, c2, 0);
        assert!(k.degraded);
        // 1/(2π) ∫ dt/(1+t)^4 = (7/24)/(2π).
        let exact = (7.0 / 24.0) / (2.0 * PI);
        assert_relative_eq!(k.value, exact, max_relative = 1e-8);
    }
}
