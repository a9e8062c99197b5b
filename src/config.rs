//! # Crawl Configuration
//!
//! Typed configuration for a focused crawl, loaded from a JSON file or built
//! in code with [`KastConfigBuilder`]. A configuration names:
//!
//! - the sample pages that define what a "page of interest" looks like
//! - the extraction rules (CSS selectors) applied to matching pages
//! - optional predicates naming each extracted field
//! - crawl limits and politeness settings
//! - the fingerprint comparison options
//!
//! Every loaded configuration is validated before use.
//!
//! ```json
//! {
//!   "sample_urls": ["https://shop.example/p/1", "https://shop.example/p/2"],
//!   "extraction_rules": [
//!     { "field": "title", "selector": "h1" },
//!     { "field": "image", "selector": "img.main", "attribute": "src" }
//!   ],
//!   "max_pages": 50
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use scraper::Selector;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::error::Error as CrateError;
use crate::fingerprint::{CloseEncoding, SimilarityOptions};
use crate::spectral::Alignment;

/// Error type for configuration loading and validation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("at least 2 sample URLs are required, got {found}")]
    MissingSamples { found: usize },

    #[error("invalid URL in {field}: {value} ({reason})")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid selector for field '{field}': {selector} ({reason})")]
    InvalidSelector {
        field: String,
        selector: String,
        reason: String,
    },

    #[error("{predicates} predicates given for {rules} extraction rules")]
    PredicateMismatch { rules: usize, predicates: usize },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl From<ConfigError> for CrateError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(e) => CrateError::Io(e),
            _ => CrateError::Config(err.to_string()),
        }
    }
}

/// A single content-extraction rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRule {
    /// Name of the extracted field
    pub field: String,

    /// CSS selector locating the field
    pub selector: String,

    /// Attribute to read instead of the element text
    #[serde(default)]
    pub attribute: Option<String>,
}

impl ExtractionRule {
    pub fn new(field: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            selector: selector.into(),
            attribute: None,
        }
    }

    /// Read `attribute` from matched elements
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }
}

fn default_crawler_copies() -> usize {
    4
}

fn default_max_pages() -> u32 {
    100
}

fn default_max_depth() -> u32 {
    3
}

fn default_rate_limit_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    format!("kast-crawler/{}", env!("CARGO_PKG_VERSION"))
}

fn default_true() -> bool {
    true
}

/// Configuration for a focused crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KastConfig {
    /// Known pages of interest used to train the classifier
    pub sample_urls: Vec<String>,

    /// Number of concurrent fetches while downloading samples
    #[serde(default = "default_crawler_copies")]
    pub crawler_copies: usize,

    /// Rules applied to pages of interest
    #[serde(default)]
    pub extraction_rules: Vec<ExtractionRule>,

    /// Predicate per extraction rule, same order
    #[serde(default)]
    pub predicates: Vec<String>,

    /// Maximum number of pages fetched
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Maximum link depth from the seed
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Minimum delay in milliseconds between requests
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Fixed classification cutoff; estimated from the samples when absent
    #[serde(default)]
    pub threshold: Option<f64>,

    /// Encoding used for closing tags
    #[serde(default)]
    pub close_encoding: CloseEncoding,

    /// Padding strategy for fingerprints of unequal length
    #[serde(default)]
    pub alignment: Alignment,

    /// Only follow links on the seed host
    #[serde(default = "default_true")]
    pub same_host_only: bool,
}

impl Default for KastConfig {
    fn default() -> Self {
        Self {
            sample_urls: Vec::new(),
            crawler_copies: default_crawler_copies(),
            extraction_rules: Vec::new(),
            predicates: Vec::new(),
            max_pages: default_max_pages(),
            max_depth: default_max_depth(),
            rate_limit_ms: default_rate_limit_ms(),
            user_agent: default_user_agent(),
            threshold: None,
            close_encoding: CloseEncoding::default(),
            alignment: Alignment::default(),
            same_host_only: true,
        }
    }
}

impl KastConfig {
    /// Create a new builder
    pub fn builder() -> KastConfigBuilder {
        KastConfigBuilder::new()
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: KastConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path).await?;
        Self::from_json(&contents)
    }

    /// Check every field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_urls.len() < 2 {
            return Err(ConfigError::MissingSamples {
                found: self.sample_urls.len(),
            });
        }
        for url in &self.sample_urls {
            parse_http_url("sample_urls", url)?;
        }

        if self.crawler_copies == 0 {
            return Err(ConfigError::InvalidValue {
                field: "crawler_copies",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_pages == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_pages",
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(threshold) = self.threshold {
            if !(threshold > 0.0 && threshold <= 1.0) {
                return Err(ConfigError::InvalidValue {
                    field: "threshold",
                    reason: format!("{} is outside (0, 1]", threshold),
                });
            }
        }

        for rule in &self.extraction_rules {
            Selector::parse(&rule.selector).map_err(|e| ConfigError::InvalidSelector {
                field: rule.field.clone(),
                selector: rule.selector.clone(),
                reason: e.to_string(),
            })?;
        }
        if !self.predicates.is_empty() && self.predicates.len() != self.extraction_rules.len() {
            return Err(ConfigError::PredicateMismatch {
                rules: self.extraction_rules.len(),
                predicates: self.predicates.len(),
            });
        }

        Ok(())
    }

    /// Sample URLs parsed
    pub fn sample_urls(&self) -> Result<Vec<Url>, ConfigError> {
        self.sample_urls
            .iter()
            .map(|url| parse_http_url("sample_urls", url))
            .collect()
    }

    /// Comparison options for fingerprints
    pub fn similarity_options(&self) -> SimilarityOptions {
        SimilarityOptions {
            close_encoding: self.close_encoding,
            alignment: self.alignment,
        }
    }

    /// Get the rate limit as a Duration
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}

/// Parse `value` as an absolute http(s) URL
pub fn parse_http_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: format!("unsupported scheme '{}'", scheme),
        }),
    }
}

/// Builder for KastConfig
#[derive(Debug, Default)]
pub struct KastConfigBuilder {
    config: KastConfig,
}

impl KastConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: KastConfig::default(),
        }
    }

    /// Set the sample URLs
    pub fn sample_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.sample_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Set the number of concurrent sample fetches
    pub fn crawler_copies(mut self, crawler_copies: usize) -> Self {
        self.config.crawler_copies = crawler_copies;
        self
    }

    /// Add an extraction rule
    pub fn extraction_rule(mut self, rule: ExtractionRule) -> Self {
        self.config.extraction_rules.push(rule);
        self
    }

    /// Set the predicate list
    pub fn predicates(mut self, predicates: Vec<String>) -> Self {
        self.config.predicates = predicates;
        self
    }

    /// Set the maximum number of pages to crawl
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    /// Set the maximum depth to crawl
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Set the rate limit in milliseconds between requests
    pub fn rate_limit_ms(mut self, rate_limit_ms: u64) -> Self {
        self.config.rate_limit_ms = rate_limit_ms;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Use a fixed classification threshold
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.config.threshold = Some(threshold);
        self
    }

    /// Set the close-tag encoding
    pub fn close_encoding(mut self, close_encoding: CloseEncoding) -> Self {
        self.config.close_encoding = close_encoding;
        self
    }

    /// Set the alignment strategy
    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.config.alignment = alignment;
        self
    }

    /// Restrict link following to the seed host
    pub fn same_host_only(mut self, same_host_only: bool) -> Self {
        self.config.same_host_only = same_host_only;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<KastConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "sample_urls": ["https://shop.example/p/1", "https://shop.example/p/2"],
        "extraction_rules": [
            { "field": "title", "selector": "h1" },
            { "field": "image", "selector": "img.main", "attribute": "src" }
        ],
        "predicates": ["http://purl.org/dc/terms/title", "http://xmlns.com/foaf/0.1/img"],
        "max_pages": 50,
        "close_encoding": "zero",
        "alignment": "full_linear"
    }"#;

    #[test]
    fn test_parse_full_config() {
        let config = KastConfig::from_json(SAMPLE).unwrap();
        assert_eq!(config.sample_urls.len(), 2);
        assert_eq!(config.extraction_rules.len(), 2);
        assert_eq!(config.extraction_rules[1].attribute.as_deref(), Some("src"));
        assert_eq!(config.max_pages, 50);
        assert_eq!(config.close_encoding, CloseEncoding::Zero);
        assert_eq!(config.alignment, Alignment::FullLinear);
        assert_eq!(config.predicates[0], "http://purl.org/dc/terms/title");
    }

    #[test]
    fn test_defaults_applied() {
        let config = KastConfig::from_json(
            r#"{ "sample_urls": ["http://a.example/1", "http://a.example/2"] }"#,
        )
        .unwrap();
        assert_eq!(config.crawler_copies, 4);
        assert_eq!(config.max_pages, 100);
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.rate_limit(), Duration::from_millis(500));
        assert!(config.user_agent.starts_with("kast-crawler/"));
        assert!(config.threshold.is_none());
        assert!(config.same_host_only);
        assert_eq!(config.similarity_options(), SimilarityOptions::default());
    }

    #[test]
    fn test_requires_two_samples() {
        let result = KastConfig::from_json(r#"{ "sample_urls": ["http://a.example/1"] }"#);
        assert!(matches!(result, Err(ConfigError::MissingSamples { found: 1 })));
    }

    #[test]
    fn test_rejects_non_http_sample() {
        let result = KastConfig::builder()
            .sample_urls(["http://a.example/1", "ftp://a.example/2"])
            .build();
        match result {
            Err(ConfigError::InvalidUrl { field, value, .. }) => {
                assert_eq!(field, "sample_urls");
                assert_eq!(value, "ftp://a.example/2");
            }
            other => panic!("Expected InvalidUrl error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_selector() {
        let result = KastConfig::builder()
            .sample_urls(["http://a.example/1", "http://a.example/2"])
            .extraction_rule(ExtractionRule::new("price", "span[[["))
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidSelector { .. })));
    }

    #[test]
    fn test_rejects_predicate_mismatch() {
        let result = KastConfig::builder()
            .sample_urls(["http://a.example/1", "http://a.example/2"])
            .extraction_rule(ExtractionRule::new("title", "h1"))
            .predicates(vec!["p1".to_string(), "p2".to_string()])
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::PredicateMismatch {
                rules: 1,
                predicates: 2
            })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let result = KastConfig::builder()
            .sample_urls(["http://a.example/1", "http://a.example/2"])
            .threshold(1.5)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                field: "threshold",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_zero_copies() {
        let result = KastConfig::builder()
            .sample_urls(["http://a.example/1", "http://a.example/2"])
            .crawler_copies(0)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                field: "crawler_copies",
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_json() {
        let result = KastConfig::from_json("{ 'SampleURLS': [] }");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.json");
        tokio::fs::write(&path, SAMPLE).await.unwrap();

        let config = KastConfig::load(&path).await.unwrap();
        assert_eq!(config.sample_urls().unwrap()[0].host_str(), Some("shop.example"));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = KastConfig::load("/nonexistent/kast/config.json").await;
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
