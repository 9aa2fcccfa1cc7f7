//! Review-Trawl main entry point
//!
//! This is the command-line interface for the Review-Trawl pagination crawler.

use anyhow::Context;
use clap::Parser;
use review_trawl::config::{load_config_with_hash, validate, Config};
use review_trawl::crawler::{Controller, CrawlTarget, HttpFetcher, RetryPolicy};
use review_trawl::output::{print_checkpoint, print_report, FileSink, RecordWriter};
use review_trawl::storage::{open_storage, CheckpointStore};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Review-Trawl: a resumable pagination crawler for review listings
///
/// Review-Trawl follows "next page" links from each seed URL, writes one JSON
/// line per extracted review record, and checkpoints its progress so an
/// interrupted crawl can be resumed without duplicate output.
#[derive(Parser, Debug)]
#[command(name = "review-trawl")]
#[command(version)]
#[command(about = "A resumable pagination crawler for review listings", long_about = None)]
struct Cli {
    /// Seed URLs (override the seeds in the config file)
    #[arg(value_name = "SEED")]
    seeds: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of pages to fetch
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Maximum number of records to write (0 for unbounded)
    #[arg(long, value_name = "N")]
    max_records: Option<u64>,

    /// JSON-lines output file
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Checkpoint database file
    #[arg(long, value_name = "FILE")]
    checkpoint: Option<String>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start a fresh crawl, discarding any checkpoint for these seeds
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "status")]
    dry_run: bool,

    /// Show the stored checkpoint for these seeds and exit
    #[arg(long, conflicts_with = "dry_run")]
    status: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG` takes precedence when set.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("review_trawl=info,warn"),
                1 => EnvFilter::new("review_trawl=debug,info"),
                _ => EnvFilter::new("review_trawl=trace,debug"),
            }
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = resolve_config(&cli)?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
        return Ok(ExitCode::SUCCESS);
    }

    if cli.status {
        handle_status(&config)?;
        return Ok(ExitCode::SUCCESS);
    }

    handle_crawl(config, cli.fresh).await
}

/// Loads the config file (if any) and applies command-line overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if !cli.seeds.is_empty() {
        config.crawl.seeds = cli.seeds.clone();
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawl.max_pages = max_pages;
    }
    if let Some(max_records) = cli.max_records {
        config.crawl.max_records = max_records;
    }
    if let Some(output) = &cli.output {
        config.output.records_path = output.clone();
    }
    if let Some(checkpoint) = &cli.checkpoint {
        config.output.checkpoint_path = checkpoint.clone();
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let target = CrawlTarget::from_config(&config.crawl)?;

    println!("=== Review-Trawl Dry Run ===\n");

    println!("Crawl:");
    println!("  Target key: {}", target.identity());
    println!("  Max pages: {}", config.crawl.max_pages);
    if config.crawl.max_records == 0 {
        println!("  Max records: unbounded");
    } else {
        println!("  Max records: {}", config.crawl.max_records);
    }
    println!(
        "  Fetch attempts: {} ({}ms apart)",
        config.crawl.fetch_attempts, config.crawl.retry_delay_ms
    );
    println!("  Request timeout: {}s", config.crawl.request_timeout_secs);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_path);
    println!("  Checkpoints: {}", config.output.checkpoint_path);

    println!("\nFields:");
    println!("  Grouping: {:?}", config.fields.grouping);
    if let Some(review) = &config.fields.review_selector {
        println!("  Review: {}", review);
    }
    println!("  Author: {}", config.fields.author_selector);
    println!("  Company size: {}", config.fields.company_size_selector);
    println!("  Role: {}", config.fields.role_selector);
    println!("  Date: {}", config.fields.date_selector);
    println!("  Question: {}", config.fields.question_selector);
    println!("  Answer: {}", config.fields.answer_selector);
    println!(
        "  Next link: {} (label: {})",
        config.fields.next_link_selector,
        config.fields.next_link_label.as_deref().unwrap_or("any")
    );

    println!("\nSeeds ({}):", target.seeds.len());
    for seed in &target.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --status mode: shows the stored checkpoint
fn handle_status(config: &Config) -> anyhow::Result<()> {
    let target = CrawlTarget::from_config(&config.crawl)?;
    let key = target.identity();
    let path = Path::new(&config.output.checkpoint_path);

    println!("Database: {}\n", path.display());

    let storage = open_storage(path)
        .with_context(|| format!("Failed to open checkpoint database {}", path.display()))?;

    match storage.load(&key)? {
        Some(checkpoint) => print_checkpoint(&key, &checkpoint),
        None => println!("No checkpoint for target {}", key),
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<ExitCode> {
    let target = CrawlTarget::from_config(&config.crawl)?;

    if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
    } else {
        tracing::info!("Starting crawl (will resume if a checkpoint exists)");
    }

    let records_path = Path::new(&config.output.records_path);
    let sink = FileSink::open(records_path)
        .with_context(|| format!("Failed to open output {}", records_path.display()))?;

    let checkpoint_path = Path::new(&config.output.checkpoint_path);
    let storage = open_storage(checkpoint_path).with_context(|| {
        format!(
            "Failed to open checkpoint database {}",
            checkpoint_path.display()
        )
    })?;

    let fetcher = HttpFetcher::from_config(&config).context("Failed to build HTTP client")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current step");
            on_interrupt.cancel();
        }
    });

    let controller = Controller::new(
        target,
        fetcher,
        RecordWriter::new(sink),
        storage,
        config.fields.clone(),
    )?
    .with_retry_policy(RetryPolicy::from_config(&config.crawl))
    .with_cancellation(cancel)
    .with_fresh_start(fresh);

    let report = controller.run().await?;
    print_report(&report);

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}
