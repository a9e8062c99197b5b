//! Discrete Fourier transform of real sequences

use std::f64::consts::PI;

/// `(cos, sin)` of `-2πj/n` for every `j < n`
fn twiddles(n: usize) -> Vec<(f64, f64)> {
    (0..n)
        .map(|j| {
            let angle = -2.0 * PI * j as f64 / n as f64;
            (angle.cos(), angle.sin())
        })
        .collect()
}

/// Coefficient `k` against a precomputed twiddle table
fn coefficient(series: &[f64], twiddles: &[(f64, f64)], k: usize) -> (f64, f64) {
    let n = series.len();
    let mut index = 0;
    let mut re = 0.0;
    let mut im = 0.0;
    for &x in series {
        let (cos, sin) = twiddles[index];
        re += x * cos;
        im += x * sin;
        // index tracks (k * t) % n without the multiplication
        index += k;
        if index >= n {
            index -= n;
        }
    }
    (re, im)
}

/// DFT of a real sequence as `(re, im)` pairs
///
/// Direct O(n²) evaluation over a twiddle table, so the inner loop is
/// multiply-add only.
pub fn dft(series: &[f64]) -> Vec<(f64, f64)> {
    let table = twiddles(series.len());
    (0..series.len())
        .map(|k| coefficient(series, &table, k))
        .collect()
}

/// Magnitudes `|X[k]|` of the DFT coefficients
///
/// Real input has `|X[k]| == |X[n - k]|`, so only the lower half is
/// evaluated and mirrored.
pub fn magnitude_spectrum(series: &[f64]) -> Vec<f64> {
    let n = series.len();
    if n == 0 {
        return Vec::new();
    }
    let table = twiddles(n);
    let mut magnitudes = vec![0.0; n];
    for k in 0..=n / 2 {
        let (re, im) = coefficient(series, &table, k);
        let magnitude = re.hypot(im);
        magnitudes[k] = magnitude;
        if k > 0 {
            magnitudes[n - k] = magnitude;
        }
    }
    magnitudes
}
