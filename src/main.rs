//! # Kast CLI Application
//!
//! Command-line front end for the kast crate.
//!
//! ## Subcommands
//!
//! - `crawl`: focused crawl of a site against configured sample pages
//! - `fingerprint`: print the tag events or numeric series of a page
//! - `compare`: structural similarity of two pages
//! - `threshold`: mean pairwise similarity of a set of sample pages
//! - `records`: list records stored for a domain

mod telemetry;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use kast::config::KastConfig;
use kast::crawler::{PageVisit, Storage, StorageConfig, VisitOutcome, crawl_site};
use kast::fingerprint::{CloseEncoding, Fingerprint, SimilarityOptions};
use kast::spectral::{Alignment, estimate_threshold_from};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::instrument;

#[derive(Parser)]
#[command(author, version, about = "Focused crawling by HTML tag structure", long_about = None)]
struct Cli {
    /// Export spans and metrics over OTLP/HTTP
    #[arg(long, global = true)]
    otel: bool,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl a site for pages structured like the configured samples
    Crawl(CrawlArgs),

    /// Print the structural fingerprint of an HTML file
    Fingerprint(FingerprintArgs),

    /// Compare the structure of two HTML files
    Compare(CompareArgs),

    /// Estimate a similarity threshold from sample HTML files
    Threshold(ThresholdArgs),

    /// List records stored for a domain
    Records(RecordsArgs),
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// URL to start crawling from
    #[arg(required = true)]
    seed: String,

    /// JSON crawl configuration
    #[arg(required = true)]
    config: PathBuf,

    /// Directory for records, archives and locks
    #[arg(short, long, default_value = ".kast")]
    output: PathBuf,

    /// Override the configured page limit
    #[arg(long)]
    max_pages: Option<u32>,

    /// Override the configured link depth
    #[arg(long)]
    max_depth: Option<u32>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: String,
}

#[derive(Args, Debug)]
struct FingerprintArgs {
    /// HTML file to read
    #[arg(required = true)]
    file: PathBuf,

    /// Print tag events instead of the numeric series
    #[arg(long)]
    events: bool,
}

#[derive(Args, Debug)]
struct SimilarityArgs {
    /// How closing tags are numbered
    #[arg(long, value_enum, default_value_t = CloseArg::Negated)]
    close_encoding: CloseArg,

    /// How series of different lengths are aligned
    #[arg(long, value_enum, default_value_t = AlignArg::PadShorter)]
    alignment: AlignArg,
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// First HTML file
    #[arg(required = true)]
    a: PathBuf,

    /// Second HTML file
    #[arg(required = true)]
    b: PathBuf,

    #[command(flatten)]
    similarity: SimilarityArgs,
}

#[derive(Args, Debug)]
struct ThresholdArgs {
    /// Sample HTML files (at least two)
    #[arg(required = true, num_args = 2..)]
    files: Vec<PathBuf>,

    #[command(flatten)]
    similarity: SimilarityArgs,
}

#[derive(Args, Debug)]
struct RecordsArgs {
    /// Domain name or URL
    #[arg(required = true)]
    domain: String,

    /// Directory the crawl wrote to
    #[arg(short, long, default_value = ".kast")]
    output: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CloseArg {
    Negated,
    Zero,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AlignArg {
    PadShorter,
    FullLinear,
}

impl SimilarityArgs {
    fn options(&self) -> SimilarityOptions {
        SimilarityOptions {
            close_encoding: match self.close_encoding {
                CloseArg::Negated => CloseEncoding::Negated,
                CloseArg::Zero => CloseEncoding::Zero,
            },
            alignment: match self.alignment {
                AlignArg::PadShorter => Alignment::PadShorter,
                AlignArg::FullLinear => Alignment::FullLinear,
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _telemetry = telemetry::init_tracing_subscriber(cli.log_dir.as_deref(), cli.otel)?;

    match cli.command {
        Commands::Crawl(args) => crawl_command(args).await?,
        Commands::Fingerprint(args) => fingerprint_command(args).await?,
        Commands::Compare(args) => compare_command(args).await?,
        Commands::Threshold(args) => threshold_command(args).await?,
        Commands::Records(args) => records_command(args).await?,
    }

    Ok(())
}

async fn read_html(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

#[instrument]
async fn crawl_command(args: CrawlArgs) -> anyhow::Result<()> {
    let mut config = KastConfig::load(&args.config)
        .await
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    if let Some(max_pages) = args.max_pages {
        config.max_pages = max_pages;
    }
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }

    let storage = Storage::with_config(StorageConfig {
        base_path: args.output.clone(),
    });

    let pb = ProgressBar::new(u64::from(config.max_pages));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")?
            .progress_chars("##-"),
    );

    let (tx, mut rx) = mpsc::channel::<PageVisit>(100);
    let progress_pb = pb.clone();
    let progress_handle = tokio::spawn(async move {
        while let Some(visit) = rx.recv().await {
            progress_pb.inc(1);
            let label = match &visit.outcome {
                VisitOutcome::OfInterest { score } => format!("match {:.3} {}", score, visit.url),
                VisitOutcome::Skipped { .. } => format!("skip {}", visit.url),
                VisitOutcome::Failed { .. } => format!("failed {}", visit.url),
            };
            progress_pb.set_message(label);
        }
    });

    let result = crawl_site(&args.seed, &config, &storage, Some(tx)).await;
    progress_handle.await?;
    pb.finish_and_clear();
    let report = result?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Crawled {} from {}", report.seed, args.config.display());
        println!("Threshold: {:.4} ({} samples)", report.threshold, report.samples);
        println!(
            "Fetched {} pages, {} of interest, {} failed",
            report.pages_fetched, report.pages_of_interest, report.failures
        );
        for record in &report.records {
            println!("  {:.3}  {}", record.score, record.url);
        }
        println!("Records written under {}", storage.base_path().display());
    }

    Ok(())
}

#[instrument]
async fn fingerprint_command(args: FingerprintArgs) -> anyhow::Result<()> {
    let html = read_html(&args.file).await?;
    let fingerprint = Fingerprint::from_html(&html);

    let json = if args.events {
        serde_json::to_string_pretty(fingerprint.events())?
    } else {
        serde_json::to_string(&fingerprint.encode_alone(CloseEncoding::default()))?
    };
    println!("{}", json);
    Ok(())
}

#[instrument]
async fn compare_command(args: CompareArgs) -> anyhow::Result<()> {
    let a = Fingerprint::from_html(&read_html(&args.a).await?);
    let b = Fingerprint::from_html(&read_html(&args.b).await?);

    let score = a.similarity(&b, &args.similarity.options())?;
    println!("{:.6}", score);
    Ok(())
}

#[instrument]
async fn threshold_command(args: ThresholdArgs) -> anyhow::Result<()> {
    let mut samples = Vec::with_capacity(args.files.len());
    for file in &args.files {
        samples.push(Fingerprint::from_html(&read_html(file).await?));
    }

    let threshold = estimate_threshold_from(&samples, &args.similarity.options())?;
    println!("{:.6}", threshold);
    Ok(())
}

#[instrument]
async fn records_command(args: RecordsArgs) -> anyhow::Result<()> {
    let storage = Storage::with_config(StorageConfig {
        base_path: args.output,
    });

    let records = storage.load_domain(&args.domain).await?;
    if records.is_empty() {
        println!("No records stored for {}", args.domain);
        return Ok(());
    }

    for record in records {
        println!(
            "{}  {:.3}  {}",
            record.fetched_at.to_rfc3339(),
            record.score,
            record.url
        );
        for field in &record.fields {
            println!("    {}: {}", field.name, field.values.join(" | "));
        }
    }
    Ok(())
}
