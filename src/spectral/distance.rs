//! Frequency-domain similarity between two numeric series

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::dft::magnitude_spectrum;
use super::error::SpectralError;

/// Padding strategy for series of unequal length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Zero-pad the shorter series to the length of the longer one
    #[default]
    PadShorter,

    /// Zero-pad both series to `len_a + len_b - 1`
    FullLinear,
}

impl Alignment {
    /// Common length both series are padded to; equal lengths are kept as-is
    pub fn target_len(self, len_a: usize, len_b: usize) -> usize {
        if len_a == len_b {
            return len_a;
        }
        match self {
            Alignment::PadShorter => len_a.max(len_b),
            Alignment::FullLinear => len_a + len_b - 1,
        }
    }
}

fn zero_padded(series: &[f64], len: usize) -> Vec<f64> {
    let mut padded = series.to_vec();
    padded.resize(len, 0.0);
    padded
}

/// Euclidean distance between the magnitude spectra of `a` and `b`
pub fn spectral_distance(a: &[f64], b: &[f64], alignment: Alignment) -> Result<f64, SpectralError> {
    if a.is_empty() || b.is_empty() {
        return Err(SpectralError::EmptySeries);
    }

    let len = alignment.target_len(a.len(), b.len());
    let spectrum_a = magnitude_spectrum(&zero_padded(a, len));
    let spectrum_b = magnitude_spectrum(&zero_padded(b, len));

    let energy_diff: f64 = spectrum_a
        .iter()
        .zip(&spectrum_b)
        .map(|(x, y)| (x - y).powi(2))
        .sum();

    if !energy_diff.is_finite() {
        return Err(SpectralError::NonFinite);
    }

    let distance = energy_diff.sqrt();
    trace!(len, distance, "spectral distance");
    Ok(distance)
}

/// Similarity `1 / (1 + distance)` using [`Alignment::PadShorter`]
pub fn similarity(a: &[f64], b: &[f64]) -> Result<f64, SpectralError> {
    similarity_with(a, b, Alignment::default())
}

/// Similarity `1 / (1 + distance)` in `(0, 1]`, 1 for identical spectra
pub fn similarity_with(a: &[f64], b: &[f64], alignment: Alignment) -> Result<f64, SpectralError> {
    spectral_distance(a, b, alignment).map(|distance| 1.0 / (1.0 + distance))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_len() {
        assert_eq!(Alignment::PadShorter.target_len(4, 4), 4);
        assert_eq!(Alignment::FullLinear.target_len(4, 4), 4);
        assert_eq!(Alignment::PadShorter.target_len(3, 5), 5);
        assert_eq!(Alignment::FullLinear.target_len(3, 5), 7);
    }

    #[test]
    fn test_similarity_reflexive() {
        let series = vec![1.0, 2.0, 3.0, -3.0, -2.0, 4.0, -4.0, -1.0];
        assert_eq!(similarity(&series, &series).unwrap(), 1.0);
    }

    #[test]
    fn test_similarity_symmetric() {
        let a = vec![1.0, 2.0, -2.0, -1.0];
        let b = vec![1.0, 3.0, 4.0, -4.0, -3.0, -1.0];
        for alignment in [Alignment::PadShorter, Alignment::FullLinear] {
            let ab = similarity_with(&a, &b, alignment).unwrap();
            let ba = similarity_with(&b, &a, alignment).unwrap();
            assert!((ab - ba).abs() < 1e-12);
            assert!(ab > 0.0 && ab < 1.0);
        }
    }

    #[test]
    fn test_similarity_known_value() {
        // Spectra of [1, 0] and [0, 0] are [1, 1] and [0, 0]: distance sqrt(2)
        let score = similarity(&[1.0, 0.0], &[0.0, 0.0]).unwrap();
        assert!((score - 1.0 / (1.0 + 2f64.sqrt())).abs() < 1e-12);
    }

    #[test]
    fn test_similarity_decreases_with_difference() {
        let base = vec![1.0, 2.0, -2.0, -1.0];
        let near = vec![1.0, 2.0, -2.0, -1.0, 3.0, -3.0];
        let far = vec![5.0, 6.0, 7.0, -7.0, -6.0, -5.0, 8.0, -8.0, 9.0, -9.0];
        let near_score = similarity(&base, &near).unwrap();
        let far_score = similarity(&base, &far).unwrap();
        assert!(far_score < near_score);
    }

    #[test]
    fn test_empty_series_is_an_error() {
        assert_eq!(similarity(&[], &[1.0]), Err(SpectralError::EmptySeries));
        assert_eq!(similarity(&[1.0], &[]), Err(SpectralError::EmptySeries));
    }

    #[test]
    fn test_non_finite_is_an_error() {
        let result = similarity(&[f64::NAN, 1.0], &[1.0, 1.0]);
        assert_eq!(result, Err(SpectralError::NonFinite));
    }
}
