//! # Focused Crawler
//!
//! Crawls a site breadth-first and keeps only pages whose tag structure
//! resembles a set of sample pages. It is the collaborator around the
//! fingerprinting core: it fetches, classifies, extracts and stores.
//!
//! ## Key Components
//!
//! - `Frontier`: owned queue and seen-set of URLs, passed to the crawl loop
//! - `PageFetcher`: rate-limited HTTP client plus link discovery
//! - `PageClassifier`: sample fingerprints and the similarity threshold
//! - `extract_fields`: CSS-selector extraction for pages of interest
//! - `Storage`: XML records, gzip page archive and per-site lock files
//! - `crawl_site`: the whole run, returning a `CrawlReport`
//!
//! ## Flow
//!
//! 1. Take the per-site lock so two crawls of one host never overlap
//! 2. Fetch the sample pages and train the classifier
//! 3. Pop URLs breadth-first, fetch, queue discovered links
//! 4. Score each page; archive and extract the ones that clear the threshold

mod classifier;
mod error;
mod extraction;
mod fetcher;
mod frontier;
mod lock;
pub mod storage;

pub use classifier::PageClassifier;
pub use error::CrawlError;
pub use extraction::{ExtractedField, ExtractedRecord, extract_fields};
pub use fetcher::{PageFetcher, extract_links};
pub use frontier::{Frontier, FrontierEntry};
pub use lock::CrawlLock;
pub use storage::{Storage, StorageConfig, StorageError};

use std::sync::Arc;

use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info, info_span, instrument, warn};

use crate::config::{KastConfig, parse_http_url};

/// What happened to a single frontier URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VisitOutcome {
    /// Cleared the threshold; archived and extracted
    OfInterest { score: f64 },

    /// Fetched but below the threshold or without markup
    Skipped { score: Option<f64> },

    /// Could not be fetched
    Failed { reason: String },
}

/// Progress event emitted for every frontier URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageVisit {
    pub url: String,
    pub depth: u32,
    #[serde(flatten)]
    pub outcome: VisitOutcome,
}

/// Summary of a finished crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlReport {
    /// Seed URL
    pub seed: String,

    /// Threshold the classifier used
    pub threshold: f64,

    /// Sample pages fetched and usable for training
    pub samples: usize,

    /// Pages fetched from the frontier
    pub pages_fetched: usize,

    /// Pages that cleared the threshold
    pub pages_of_interest: usize,

    /// Frontier URLs that failed to fetch
    pub failures: usize,

    /// Records extracted from pages of interest
    pub records: Vec<ExtractedRecord>,
}

/// Crawl `seed` for pages resembling the configured samples
///
/// # Arguments
///
/// * `seed` - The URL to start from
/// * `config` - The crawl configuration
/// * `storage` - Where records, archives and the lock file live
/// * `progress` - Optional channel receiving one [`PageVisit`] per URL
#[instrument(skip(config, storage, progress))]
pub async fn crawl_site(
    seed: &str,
    config: &KastConfig,
    storage: &Storage,
    progress: Option<mpsc::Sender<PageVisit>>,
) -> Result<CrawlReport, CrawlError> {
    config.validate()?;
    let seed_url = parse_http_url("seed", seed)?;
    let site = storage.extract_domain(seed_url.as_str())?;

    let _lock = CrawlLock::acquire(&storage.lock_dir(), &site)?;
    info!("Starting crawl for {}", seed_url);

    let fetcher = PageFetcher::new(config)?;
    let samples = fetch_samples(&fetcher, config).await?;
    let classifier = Arc::new(PageClassifier::train(
        &samples,
        config.threshold,
        config.similarity_options(),
    )?);

    let mut frontier = Frontier::new(seed_url.clone());
    let mut report = CrawlReport {
        seed: seed_url.to_string(),
        threshold: classifier.threshold(),
        samples: classifier.sample_count(),
        pages_fetched: 0,
        pages_of_interest: 0,
        failures: 0,
        records: Vec::new(),
    };

    run_crawl(
        &mut frontier,
        &fetcher,
        &classifier,
        config,
        storage,
        progress.as_ref(),
        &mut report,
    )
    .await?;

    info!(
        fetched = report.pages_fetched,
        of_interest = report.pages_of_interest,
        failures = report.failures,
        "Crawl finished"
    );
    Ok(report)
}

/// Fetch the sample pages, `crawler_copies` at a time, keeping config order
async fn fetch_samples(
    fetcher: &PageFetcher,
    config: &KastConfig,
) -> Result<Vec<String>, CrawlError> {
    let urls = config.sample_urls()?;

    let pages: Vec<String> = stream::iter(urls)
        .map(|url| async move {
            let result = fetcher.fetch(&url).await;
            (url, result)
        })
        .buffered(config.crawler_copies)
        .filter_map(|(url, result)| async move {
            match result {
                Ok(html) => Some(html),
                Err(e) => {
                    warn!("Failed to fetch sample {}: {}", url, e);
                    None
                }
            }
        })
        .collect()
        .await;

    info!("Fetched {} of {} samples", pages.len(), config.sample_urls.len());
    Ok(pages)
}

/// Breadth-first loop over `frontier` until it empties or `max_pages` is hit
async fn run_crawl(
    frontier: &mut Frontier,
    fetcher: &PageFetcher,
    classifier: &Arc<PageClassifier>,
    config: &KastConfig,
    storage: &Storage,
    progress: Option<&mpsc::Sender<PageVisit>>,
    report: &mut CrawlReport,
) -> Result<(), CrawlError> {
    while frontier.visited_count() < config.max_pages as usize {
        let Some(entry) = frontier.pop() else {
            break;
        };

        let span = info_span!("process_page", url = %entry.url, depth = entry.depth);
        let outcome = visit(&entry, frontier, fetcher, classifier, config, storage, report)
            .instrument(span)
            .await?;

        if let Some(sender) = progress {
            let _ = sender
                .send(PageVisit {
                    url: entry.url.to_string(),
                    depth: entry.depth,
                    outcome,
                })
                .await;
        }
    }

    Ok(())
}

/// Fetch one frontier entry, queue its links and classify it
async fn visit(
    entry: &FrontierEntry,
    frontier: &mut Frontier,
    fetcher: &PageFetcher,
    classifier: &Arc<PageClassifier>,
    config: &KastConfig,
    storage: &Storage,
    report: &mut CrawlReport,
) -> Result<VisitOutcome, CrawlError> {
    let html = match fetcher.fetch(&entry.url).await {
        Ok(html) => html,
        Err(e) => {
            warn!("Failed to fetch {}: {}", entry.url, e);
            report.failures += 1;
            return Ok(VisitOutcome::Failed {
                reason: e.to_string(),
            });
        }
    };
    frontier.mark_visited();
    report.pages_fetched = frontier.visited_count();

    if entry.depth < config.max_depth {
        let links = extract_links(&entry.url, &html, config.same_host_only);
        let added = frontier.extend(links, entry.depth + 1);
        debug!(added, queued = frontier.len(), "links queued");
    }

    process_page(entry, &html, classifier, config, storage, report).await
}

/// Classify a fetched page and, when it is of interest, archive it and
/// persist its extracted record
async fn process_page(
    entry: &FrontierEntry,
    html: &str,
    classifier: &Arc<PageClassifier>,
    config: &KastConfig,
    storage: &Storage,
    report: &mut CrawlReport,
) -> Result<VisitOutcome, CrawlError> {
    // Scoring is quadratic in the page's event count; keep it off the runtime
    let scorer = Arc::clone(classifier);
    let page = html.to_string();
    let score = match tokio::task::spawn_blocking(move || scorer.score(&page)).await? {
        Ok(score) => score,
        Err(e) => {
            debug!("Page not scored: {}", e);
            return Ok(VisitOutcome::Skipped { score: None });
        }
    };

    if !classifier.accepts(score) {
        return Ok(VisitOutcome::Skipped { score: Some(score) });
    }

    let url = entry.url.as_str();
    let fetched_at = chrono::Utc::now();
    storage.archive_page(url, html, fetched_at).await?;

    let record = ExtractedRecord {
        url: url.to_string(),
        fetched_at,
        score,
        fields: extract_fields(html, &config.extraction_rules, &config.predicates),
    };
    storage.store(&record).await?;
    info!(score, "Page of interest");

    report.pages_of_interest += 1;
    report.records.push(record);
    Ok(VisitOutcome::OfInterest { score })
}
