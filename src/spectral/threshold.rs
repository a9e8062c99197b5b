//! Classification cutoff from known-good samples

use tracing::debug;

use super::distance::{Alignment, similarity_with};
use super::error::SpectralError;

/// Mean similarity over every unordered pair of `samples`
///
/// Self-pairs are excluded. Fewer than two samples is
/// [`SpectralError::InsufficientSamples`].
pub fn estimate_threshold<S>(samples: &[S], alignment: Alignment) -> Result<f64, SpectralError>
where
    S: AsRef<[f64]>,
{
    mean_pairwise(samples.len(), |i, j| {
        similarity_with(samples[i].as_ref(), samples[j].as_ref(), alignment)
    })
}

/// Mean of `score(i, j)` over all `i < j < count`
pub(crate) fn mean_pairwise<F>(count: usize, mut score: F) -> Result<f64, SpectralError>
where
    F: FnMut(usize, usize) -> Result<f64, SpectralError>,
{
    if count < 2 {
        return Err(SpectralError::InsufficientSamples { found: count });
    }

    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..count {
        for j in (i + 1)..count {
            total += score(i, j)?;
            pairs += 1;
        }
    }

    let threshold = total / pairs as f64;
    debug!(samples = count, pairs, threshold, "estimated threshold");
    Ok(threshold)
}
