//! # Spectral Comparison
//!
//! Compares numeric tag-structure series in the frequency domain. Each series
//! is zero-padded to a common length, transformed with a DFT, and the
//! Euclidean distance between the two magnitude spectra is mapped to a
//! similarity in `(0, 1]`:
//!
//! ```text
//! similarity = 1 / (1 + sqrt(Σ (|A[k]| - |B[k]|)²))
//! ```
//!
//! The measure is symmetric and reflexive but not a metric.

mod dft;
mod distance;
mod error;
mod threshold;

pub use dft::{dft, magnitude_spectrum};
pub use distance::{Alignment, similarity, similarity_with, spectral_distance};
pub use error::SpectralError;
pub use threshold::estimate_threshold;

use threshold::mean_pairwise;

use crate::fingerprint::{Fingerprint, SimilarityOptions};

/// Threshold over sample documents, re-encoding each pair with its own
/// union vocabulary
pub fn estimate_threshold_from(
    samples: &[Fingerprint],
    options: &SimilarityOptions,
) -> Result<f64, SpectralError> {
    mean_pairwise(samples.len(), |i, j| samples[i].similarity(&samples[j], options))
}
