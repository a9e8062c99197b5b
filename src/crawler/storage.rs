use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use quick_xml::{de::from_str, se::to_string};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use url::Url;
use xxhash_rust::xxh3::xxh3_64;

use super::extraction::ExtractedRecord;
use crate::error::Error as CrateError;

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base path for storage
    pub base_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(".kast"),
        }
    }
}

/// XML representation of records for storage
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename = "records")]
pub struct Records {
    #[serde(rename = "record")]
    pub records: Vec<ExtractedRecord>,
}

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("XML serialization error: {0}")]
    SerializeError(#[from] quick_xml::errors::serialize::SeError),

    #[error("XML deserialization error: {0}")]
    DeserializeError(#[from] quick_xml::errors::serialize::DeError),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid URL for storage: {0}")]
    InvalidUrl(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for CrateError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => CrateError::Io(e),
            _ => CrateError::Storage(err.to_string()),
        }
    }
}

type Result<T> = std::result::Result<T, StorageError>;

/// Storage for extracted records, archived pages and crawl locks
///
/// Layout under the base path:
///
/// ```text
/// <base>/<domain>/records/<path>.xml
/// <base>/<domain>/pages/<domain>-<unix millis>.html.gz
/// <base>/locks/<domain>.lock
/// ```
#[derive(Debug, Clone)]
pub struct Storage {
    config: StorageConfig,
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage {
    /// Create a new storage with default configuration
    pub fn new() -> Self {
        Self {
            config: StorageConfig::default(),
        }
    }

    /// Create a new storage with custom configuration
    pub fn with_config(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn base_path(&self) -> &Path {
        &self.config.base_path
    }

    /// Directory holding crawl lock files
    pub fn lock_dir(&self) -> PathBuf {
        self.config.base_path.join("locks")
    }

    /// Extracts the site directory name from a URL
    ///
    /// The host, plus `_<port>` when the URL names a non-default port, so two
    /// servers on one host never share records or a lock.
    pub fn extract_domain(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url)?;
        let host = parsed
            .host_str()
            .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?;
        Ok(match parsed.port() {
            Some(port) => format!("{}_{}", host, port),
            None => host.to_string(),
        })
    }

    /// Gets the record path for a given URL
    ///
    /// The readable stem is lossy (`/a-b` and `/a/b` both give `a_b`), so it
    /// is suffixed with an xxh3 hash of the fragment-free URL.
    pub fn record_path(&self, url: &str) -> Result<PathBuf> {
        let domain = self.extract_domain(url)?;
        let mut parsed = Url::parse(url)?;
        parsed.set_fragment(None);

        // Create a filename from the URL path and query
        let mut path = parsed.path().to_string();
        if let Some(query) = parsed.query() {
            path.push('_');
            path.push_str(query);
        }

        let stem = if path.is_empty() || path == "/" {
            "index".to_string()
        } else {
            // Replace non-alphanumeric characters with underscores
            let safe_path = path
                .chars()
                .map(|c| {
                    if c.is_alphanumeric() || c == '/' {
                        c
                    } else {
                        '_'
                    }
                })
                .collect::<String>();

            // Remove leading and trailing slashes
            safe_path.trim_matches('/').replace('/', "_")
        };
        let filename = format!("{}-{:016x}.xml", stem, xxh3_64(parsed.as_str().as_bytes()));

        Ok(self
            .config
            .base_path
            .join(domain)
            .join("records")
            .join(filename))
    }

    /// Path of the gzip archive for a page fetched at `fetched_at`
    pub fn archive_path(
        &self,
        url: &str,
        fetched_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<PathBuf> {
        let domain = self.extract_domain(url)?;
        let filename = format!("{}-{}.html.gz", domain, fetched_at.timestamp_millis());
        Ok(self.config.base_path.join(&domain).join("pages").join(filename))
    }

    /// Creates necessary directories for storage
    async fn ensure_directories(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Stores a single record to its XML file, replacing any previous one
    pub async fn store(&self, record: &ExtractedRecord) -> Result<PathBuf> {
        let record_path = self.record_path(&record.url)?;
        self.ensure_directories(&record_path).await?;

        let records = Records {
            records: vec![record.clone()],
        };
        let xml = to_string(&records)?;

        fs::write(
            &record_path,
            format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml),
        )
        .await?;
        debug!(path = %record_path.display(), "stored record");
        Ok(record_path)
    }

    /// Loads the record stored for `url`
    pub async fn load(&self, url: &str) -> Result<ExtractedRecord> {
        let record_path = self.record_path(url)?;
        self.load_file(&record_path).await
    }

    async fn load_file(&self, path: &Path) -> Result<ExtractedRecord> {
        let xml_content = fs::read_to_string(path).await?;
        let records: Records = from_str(&xml_content)?;

        // Since we store one record per file, take the first one
        records.records.into_iter().next().ok_or_else(|| {
            StorageError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "XML file contains no records",
            ))
        })
    }

    /// Loads all records for a given domain
    ///
    /// The domain parameter can be either a domain name (e.g., "example.com") or a full URL.
    pub async fn load_domain(&self, domain_or_url: &str) -> Result<Vec<ExtractedRecord>> {
        let domain = if domain_or_url.contains("://") {
            self.extract_domain(domain_or_url)?
        } else {
            domain_or_url.to_string()
        };

        let base_path = self.config.base_path.join(&domain).join("records");

        if !fs::try_exists(&base_path).await? {
            return Err(StorageError::NotFound(format!(
                "No records found for domain {}",
                domain
            )));
        }

        let mut records = Vec::new();
        let mut dir_entries = fs::read_dir(base_path).await?;

        while let Some(entry) = dir_entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "xml") {
                match self.load_file(&path).await {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        warn!("Failed to load record {}: {}", path.display(), e);
                        continue;
                    }
                }
            }
        }

        records.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(records)
    }

    /// Gzip `html` into the page archive
    pub async fn archive_page(
        &self,
        url: &str,
        html: &str,
        fetched_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<PathBuf> {
        let archive_path = self.archive_path(url, fetched_at)?;
        self.ensure_directories(&archive_path).await?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(html.as_bytes())?;
        let compressed = encoder.finish()?;

        fs::write(&archive_path, compressed).await?;
        debug!(path = %archive_path.display(), "archived page");
        Ok(archive_path)
    }

    /// Read back an archived page
    pub async fn read_archive(&self, path: &Path) -> Result<String> {
        let compressed = fs::read(path).await?;
        let mut decoder = GzDecoder::new(compressed.as_slice());
        let mut html = String::new();
        decoder.read_to_string(&mut html)?;
        Ok(html)
    }
}
