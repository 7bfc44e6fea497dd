//! Gleaner main entry point
//!
//! Command-line interface for the crawl-and-curate pipeline.

use anyhow::Context;
use clap::Parser;
use gleaner::classify::LlmClassifier;
use gleaner::config::{load_config_with_hash, Config, SinkKind};
use gleaner::fetch::HttpFetcher;
use gleaner::pipeline::{discover, run_pipeline, RunSummary, Stages};
use gleaner::sink::{LocalDirSink, ObjectStoreSink};
use gleaner::url::parse_seed;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Gleaner: crawl one site, keep the pages worth keeping
///
/// Gleaner discovers the internal links of a site, extracts a text body per
/// page, asks an LLM which pages carry real content, and writes the
/// survivors to a local folder or an object-storage container named after
/// the site.
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(version)]
#[command(about = "Single-site crawl-and-curate pipeline", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Seed URL to crawl (absolute, with scheme and host)
    #[arg(value_name = "SEED_URL")]
    seed: String,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discover and print the internal link set, nothing else
    #[arg(long, conflicts_with = "dry_run")]
    links_only: bool,

    /// Skip the curation stage (keep every harvested page)
    #[arg(long)]
    no_curate: bool,

    /// Skip the persist stage (run the pipeline without writing anywhere)
    #[arg(long)]
    no_persist: bool,

    /// Validate config, show what would run, and exit
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &cli.seed)?;
        return Ok(());
    }

    let fetcher = HttpFetcher::new(&config.fetch).context("failed to build HTTP client")?;

    if cli.links_only {
        handle_links_only(&fetcher, &cli.seed).await?;
        return Ok(());
    }

    let stages = Stages {
        curate: !cli.no_curate,
        persist: !cli.no_persist,
    };

    let classifier = if stages.curate {
        Some(
            LlmClassifier::from_config(&config.classifier)
                .context("failed to build classifier")?,
        )
    } else {
        None
    };

    let summary = match config.sink.kind {
        SinkKind::Local => {
            let folder = config.sink.folder_path.clone().unwrap_or_default();
            let sink = LocalDirSink::new(folder);
            run_pipeline(
                &fetcher,
                classifier.as_ref(),
                &sink,
                &cli.seed,
                &config,
                stages,
            )
            .await?
        }
        SinkKind::ObjectStorage => {
            let sink = ObjectStoreSink::from_config(&config.sink)
                .context("failed to build object-storage sink")?;
            run_pipeline(
                &fetcher,
                classifier.as_ref(),
                &sink,
                &cli.seed,
                &config,
                stages,
            )
            .await?
        }
    };

    print_summary(&summary);
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gleaner=info,warn"),
            1 => EnvFilter::new("gleaner=debug,info"),
            2 => EnvFilter::new("gleaner=trace,debug"),
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

/// Handles --dry-run: validates config and shows what would run
fn handle_dry_run(config: &Config, seed: &str) -> anyhow::Result<()> {
    let seed_url = parse_seed(seed)?;
    let site = gleaner::site_name(&seed_url)?;

    println!("=== Gleaner Dry Run ===\n");

    println!("Seed: {}", seed_url);
    println!("Site identity: {}", site);

    println!("\nFetch:");
    println!("  User agent: {}", config.fetch.user_agent);
    println!("  Timeout: {}s", config.fetch.request_timeout_secs);
    println!(
        "  Concurrency: {}",
        config.fetch.max_concurrent_fetches
    );
    println!("  On fetch error: {:?}", config.fetch.on_fetch_error);
    println!("  Excluded tags: {:?}", config.fetch.excluded_tags);

    println!("\nClassifier:");
    println!("  Endpoint: {}", config.classifier.endpoint);
    println!("  Model: {}", config.classifier.model);
    println!("  API key from: ${}", config.classifier.api_key_env);
    println!("  Fail open: {}", config.classifier.fail_open);

    println!("\nSink:");
    match config.sink.kind {
        SinkKind::Local => {
            println!("  Local folder: {}", config.sink.folder_path.as_deref().unwrap_or(""));
        }
        SinkKind::ObjectStorage => {
            println!(
                "  Object storage: {} (container '{}')",
                config.sink.account_url.as_deref().unwrap_or(""),
                site
            );
            println!("  SAS token from: ${}", config.sink.sas_token_env);
        }
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles --links-only: discovers and prints the link set
async fn handle_links_only(fetcher: &HttpFetcher, seed: &str) -> anyhow::Result<()> {
    let seed_url = parse_seed(seed)?;
    let links = discover(fetcher, &seed_url).await?;

    for link in &links {
        println!("{}", link);
    }
    tracing::info!("{} internal links discovered", links.len());
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("=== Run Summary ===");
    println!("Site: {}", summary.site);
    println!("Links discovered: {}", summary.links_discovered);
    println!("Pages harvested: {}", summary.pages_harvested);
    println!(
        "Pages kept: {} (removed {})",
        summary.pages_kept, summary.pages_removed
    );
    println!(
        "Duration: {:.2}s",
        summary.duration().num_milliseconds() as f64 / 1000.0
    );
}
