//! Error types for the kast crate

use thiserror::Error;

/// Result type for kast operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for kast operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Spectral comparison error
    #[error("Spectral error: {0}")]
    Spectral(String),

    /// Web crawling error
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
