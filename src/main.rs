//! Listing-Harvest main entry point
//!
//! This is the command-line interface for the Listing-Harvest job-listing crawler.

use anyhow::Context;
use clap::Parser;
use listing_harvest::checkpoint::{now_epoch, JsonCheckpointStore};
use listing_harvest::config::{apply_overrides, load_config_with_hash, Config, ConfigOverrides};
use listing_harvest::crawler::crawl;
use listing_harvest::output::{export_sink, print_status, print_summary, summarize};
use listing_harvest::state::CrawlPlan;
use listing_harvest::storage::{open_sink, Sink};
use listing_harvest::StopReason;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Listing-Harvest: a resumable job-listing crawler
///
/// Listing-Harvest walks every search keyword across a fixed number of result
/// pages, deduplicates listings by their link, and saves its progress after
/// every page so an interrupted crawl picks up where it left off.
#[derive(Parser, Debug)]
#[command(name = "listing-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resumable, deduplicating job-listing crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start a fresh crawl, ignoring the saved checkpoint
    #[arg(long)]
    fresh: bool,

    /// Validate config and show the crawl plan without crawling
    #[arg(long, conflicts_with_all = ["status", "export_csv", "summary"])]
    dry_run: bool,

    /// Show the saved checkpoint progress and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_csv", "summary"])]
    status: bool,

    /// Export the collected listings to CSV and exit
    #[arg(long, conflicts_with_all = ["dry_run", "status", "summary"])]
    export_csv: bool,

    /// Summarize the collected listings and exit
    #[arg(long, conflicts_with_all = ["dry_run", "status", "export_csv"])]
    summary: bool,

    /// Override the number of unique listings to collect
    #[arg(long, value_name = "N")]
    target: Option<u64>,

    /// Override the number of pages visited per keyword
    #[arg(long, value_name = "N")]
    pages: Option<u32>,

    /// Override the keyword list (comma-separated)
    #[arg(long, value_delimiter = ',', value_name = "LIST")]
    keywords: Option<Vec<String>>,

    /// Override the checkpoint file location
    #[arg(long, value_name = "PATH")]
    checkpoint: Option<String>,

    /// Override the number of keywords crawled in parallel
    #[arg(long, value_name = "N")]
    workers: Option<u32>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            target_items: self.target,
            pages_per_keyword: self.pages,
            keywords: self.keywords.clone(),
            checkpoint_path: self.checkpoint.clone(),
            workers: self.workers,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    let config = apply_overrides(config, &cli.overrides()).context("invalid override")?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.status {
        handle_status(&config)?;
    } else if cli.export_csv {
        handle_export_csv(&config)?;
    } else if cli.summary {
        handle_summary(&config)?;
    } else {
        handle_crawl(&config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_harvest=info,warn"),
            1 => EnvFilter::new("listing_harvest=debug,info"),
            2 => EnvFilter::new("listing_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the plan that would be crawled
fn handle_dry_run(config: &Config) {
    let plan = CrawlPlan::from_config(&config.crawler);

    println!("=== Listing-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Target items: {}", config.crawler.target_items);
    println!("  Pages per keyword: {}", plan.pages_per_keyword());
    println!("  Workers: {}", config.crawler.workers);
    println!("  Fetch details: {}", config.crawler.fetch_details);

    println!("\nFetch:");
    println!("  Timeout: {}s", config.fetch.request_timeout);
    println!("  Attempts per page: {}", config.fetch.max_attempts);
    println!(
        "  Listing delay: {}-{}ms",
        config.fetch.listing_delay_min, config.fetch.listing_delay_max
    );
    println!(
        "  Detail delay: {}-{}ms",
        config.fetch.detail_delay_min, config.fetch.detail_delay_max
    );
    println!("  User agent: {}", config.user_agent.header_value());

    println!("\nSite:");
    println!("  Listing URL: {}", config.site.listing_url);
    println!("  Detail URL: {}", config.site.detail_url);

    println!("\nOutput:");
    println!("  Checkpoint: {}", config.output.checkpoint_path);
    println!("  Database: {}", config.output.database_path);
    println!("  CSV: {}", config.output.csv_path);

    println!("\nKeywords ({}):", plan.keyword_count());
    for keyword in plan.keywords() {
        println!("  - {}", keyword);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would visit at most {} listing pages", plan.total_cells());
}

/// Handles the --status mode: reports the saved checkpoint
fn handle_status(config: &Config) -> anyhow::Result<()> {
    let store = JsonCheckpointStore::new(&config.output.checkpoint_path);
    let plan = CrawlPlan::from_config(&config.crawler);

    println!("Checkpoint: {}\n", store.path().display());

    match store.load_checked()? {
        Some(checkpoint) => {
            print_status(&checkpoint, &plan, config.crawler.target_items, now_epoch())
        }
        None => println!("No checkpoint found; the next crawl starts from the beginning."),
    }

    Ok(())
}

/// Handles the --export-csv mode
fn handle_export_csv(config: &Config) -> anyhow::Result<()> {
    let written = export_database(config)?;
    println!("✓ Exported {} listings to: {}", written, config.output.csv_path);
    Ok(())
}

/// Handles the --summary mode
fn handle_summary(config: &Config) -> anyhow::Result<()> {
    let sink = open_sink(Path::new(&config.output.database_path))?;
    println!("Database: {}\n", config.output.database_path);

    let items = sink.all_items()?;
    print_summary(&summarize(&items));
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring saved checkpoint)");
    } else {
        tracing::info!("Starting crawl (will resume from checkpoint if one exists)");
    }
    tracing::info!(
        "Keywords: {}, pages per keyword: {}, target: {}",
        config.crawler.keywords.len(),
        config.crawler.pages_per_keyword,
        config.crawler.target_items
    );

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            ctrl_c.cancel();
        }
    });

    let outcome = match crawl(config, fresh, token).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_fatal() => {
            return Err(anyhow::Error::new(e).context("crawl could not start"));
        }
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context("crawl stopped early; rerun to resume from the saved checkpoint"));
        }
    };

    match outcome.stop_reason {
        StopReason::TargetReached => tracing::info!("Target reached"),
        StopReason::PlanExhausted => tracing::info!("Crawl plan exhausted"),
        StopReason::Cancelled => tracing::info!("Crawl interrupted; progress saved"),
    }
    tracing::info!(
        "{} pages processed this run. {}",
        outcome.cells_processed,
        outcome.stats
    );

    let written = export_database(config)?;
    println!("✓ Exported {} listings to: {}", written, config.output.csv_path);

    Ok(())
}

fn export_database(config: &Config) -> anyhow::Result<usize> {
    let sink = open_sink(Path::new(&config.output.database_path))?;
    let written = export_sink(&sink, Path::new(&config.output.csv_path))?;
    Ok(written)
}
