//! Page fetching and link discovery

use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client as ReqwestClient;
use scraper::{Html, Selector};
use tracing::{Instrument, debug, debug_span, instrument};
use url::Url;

use crate::config::KastConfig;
use crate::crawler::error::CrawlError;

/// Default timeout for page requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Rate-limited HTTP client for crawl requests
#[derive(Clone)]
pub struct PageFetcher {
    client: ReqwestClient,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl PageFetcher {
    /// Build a fetcher using the configured user agent and rate limit
    pub fn new(config: &KastConfig) -> Result<Self, CrawlError> {
        let client = ReqwestClient::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        let limiter = Quota::with_period(config.rate_limit())
            .map(|quota| Arc::new(RateLimiter::direct(quota)));

        Ok(Self { client, limiter })
    }

    /// GET `url` and return the body text
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> Result<String, CrawlError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().instrument(debug_span!("limiter")).await;
        }

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!(bytes = body.len(), "fetched page");
        Ok(body)
    }
}

/// Absolute http(s) links of a page, resolved against `base`
///
/// With `same_host_only` links to other hosts are dropped.
pub fn extract_links(base: &Url, html: &str, same_host_only: bool) -> Vec<Url> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .filter(|url| !same_host_only || url.host_str() == base.host_str())
        .collect()
}
