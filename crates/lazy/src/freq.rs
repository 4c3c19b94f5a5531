//! Frequency and wavevector grids for FFT outputs.

/// Sample frequencies of a real FFT of `n` samples with spacing `d`:
/// `i / (n d)` for `i = 0..=n/2`.
pub fn rfftfreq(n: usize, d: f64) -> Vec<f64> {
    let denom = n as f64 * d;
    (0..=n / 2).map(|i| i as f64 / denom).collect()
}

/// Sample frequencies of a full FFT of `n` samples with spacing `d`:
/// non-negative bins first, then the negative bins.
pub fn fftfreq(n: usize, d: f64) -> Vec<f64> {
    let denom = n as f64 * d;
    let positive = n.div_ceil(2);
    (0..n)
        .map(|i| {
            if i < positive {
                i as f64 / denom
            } else {
                -((n - i) as f64) / denom
            }
        })
        .collect()
}

/// Rolls a frequency grid by `n/2` so zero frequency sits in the middle,
/// the companion of the array-level `fftshift` operation.
pub fn fftshift_vec(v: Vec<f64>) -> Vec<f64> {
    let n = v.len();
    if n < 2 {
        return v;
    }
    let shift = n / 2;
    let mut out = vec![0.0; n];
    for (i, val) in v.into_iter().enumerate() {
        out[(i + shift) % n] = val;
    }
    out
}
