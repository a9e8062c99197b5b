//! Error types for the crawler module

use std::path::PathBuf;

use crate::config::ConfigError;
use crate::crawler::storage::StorageError;
use crate::error::Error as CrateError;
use crate::spectral::SpectralError;
use thiserror::Error;

/// Error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP status {status} for {url}")]
    Status {
        /// Requested URL
        url: String,
        /// Response status code
        status: u16,
    },

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid crawl configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Classifier training or scoring failed
    #[error("Classification error: {0}")]
    Spectral(#[from] SpectralError),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Another crawl of the same site holds the lock
    #[error("crawl already in progress, lock file exists: {}", path.display())]
    Locked {
        /// Path of the existing lock file
        path: PathBuf,
    },

    /// A blocking scoring task panicked or was cancelled
    #[error("Scoring task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<CrawlError> for CrateError {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::Http(e) => CrateError::Http(e),
            CrawlError::Io(e) => CrateError::Io(e),
            CrawlError::Config(e) => e.into(),
            CrawlError::Spectral(e) => e.into(),
            CrawlError::Storage(e) => e.into(),
            CrawlError::UrlParse(e) => CrateError::Other(format!("URL parse error: {}", e)),
            _ => CrateError::Crawl(err.to_string()),
        }
    }
}
