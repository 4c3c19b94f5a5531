//! Hann tapering windows applied before Fourier transforms to reduce
//! spectral leakage.

use ndarray::{Array1, Array2};

/// Hann window of length `n`: `0.5 - 0.5 cos(2 pi i / (n - 1))`.
///
/// `n = 1` yields `[1.0]` and `n = 0` an empty window, matching the
/// conventional definition.
pub fn hann(n: usize) -> Array1<f32> {
    match n {
        0 => Array1::zeros(0),
        1 => Array1::ones(1),
        _ => Array1::from_iter((0..n).map(|i| {
            let x = 2.0 * std::f64::consts::PI * i as f64 / (n - 1) as f64;
            (0.5 - 0.5 * x.cos()) as f32
        })),
    }
}

/// Two-dimensional Hann window for a `(nt, nx)` plane: the square root of
/// the outer product of the two 1-D windows.
pub fn hann2d(nt: usize, nx: usize) -> Array2<f32> {
    let wt = hann(nt);
    let wx = hann(nx);
    Array2::from_shape_fn((nt, nx), |(i, j)| (wt[i] * wx[j]).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_endpoints_are_zero() {
        let w = hann(64);
        assert_eq!(w.len(), 64);
        assert!(w[0].abs() < 1e-7);
        assert!(w[63].abs() < 1e-7);
    }

    #[test]
    fn hann_center_is_one() {
        let w = hann(65);
        assert!((w[32] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn hann_is_symmetric() {
        let w = hann(32);
        for i in 0..16 {
            assert!(
                (w[i] - w[31 - i]).abs() < 1e-6,
                "window not symmetric at {i}"
            );
        }
    }

    #[test]
    fn hann_degenerate_lengths() {
        assert_eq!(hann(0).len(), 0);
        let w = hann(1);
        assert_eq!(w.len(), 1);
        assert_eq!(w[0], 1.0);
    }

    #[test]
    fn hann2d_is_sqrt_of_outer_product() {
        let w2 = hann2d(16, 8);
        let wt = hann(16);
        let wx = hann(8);
        assert_eq!(w2.shape(), &[16, 8]);
        for i in 0..16 {
            for j in 0..8 {
                let expected = (wt[i] * wx[j]).sqrt();
                assert!((w2[[i, j]] - expected).abs() < 1e-6);
            }
        }
    }
}
