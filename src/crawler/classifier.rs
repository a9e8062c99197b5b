//! Page-of-interest classification against sample fingerprints

use tracing::{debug, info, warn};

use crate::fingerprint::{Fingerprint, SimilarityOptions};
use crate::spectral::{SpectralError, estimate_threshold_from};

/// Classifier trained on known pages of interest
#[derive(Debug, Clone)]
pub struct PageClassifier {
    samples: Vec<Fingerprint>,
    threshold: f64,
    options: SimilarityOptions,
}

impl PageClassifier {
    /// Fingerprint the sample pages and estimate the cutoff from their
    /// pairwise similarity, unless `threshold` fixes it
    ///
    /// Samples without any markup are dropped; `InsufficientSamples` counts
    /// only the usable ones.
    pub fn train<S>(
        samples: &[S],
        threshold: Option<f64>,
        options: SimilarityOptions,
    ) -> Result<Self, SpectralError>
    where
        S: AsRef<str>,
    {
        let total = samples.len();
        let samples: Vec<Fingerprint> = samples
            .iter()
            .map(|html| Fingerprint::from_html(html.as_ref()))
            .filter(|fingerprint| !fingerprint.is_empty())
            .collect();
        if samples.len() < total {
            warn!(
                dropped = total - samples.len(),
                "sample pages without markup ignored"
            );
        }

        let threshold = match threshold {
            Some(threshold) => threshold,
            None => estimate_threshold_from(&samples, &options)?,
        };
        info!(samples = samples.len(), threshold, "classifier trained");

        Ok(Self {
            samples,
            threshold,
            options,
        })
    }

    /// Mean similarity of `html` to every sample
    pub fn score(&self, html: &str) -> Result<f64, SpectralError> {
        if self.samples.is_empty() {
            return Err(SpectralError::InsufficientSamples { found: 0 });
        }

        let page = Fingerprint::from_html(html);
        let mut total = 0.0;
        for sample in &self.samples {
            total += page.similarity(sample, &self.options)?;
        }
        let score = total / self.samples.len() as f64;
        debug!(score, threshold = self.threshold, "page scored");
        Ok(score)
    }

    /// Whether a score clears the threshold
    pub fn accepts(&self, score: f64) -> bool {
        score >= self.threshold
    }

    /// Score `html` and compare against the threshold
    pub fn is_of_interest(&self, html: &str) -> Result<bool, SpectralError> {
        self.score(html).map(|score| self.accepts(score))
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}
