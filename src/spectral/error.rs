//! Error types for the spectral module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for spectral comparison
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpectralError {
    /// One of the compared series has no samples
    #[error("cannot compare an empty series")]
    EmptySeries,

    /// Threshold estimation needs at least one pair of samples
    #[error("threshold estimation needs at least 2 samples, got {found}")]
    InsufficientSamples {
        /// Number of samples supplied
        found: usize,
    },

    /// The spectra produced a non-finite energy difference
    #[error("spectral distance is not finite")]
    NonFinite,
}

impl From<SpectralError> for CrateError {
    fn from(err: SpectralError) -> Self {
        CrateError::Spectral(err.to_string())
    }
}
