//! Lemma-Crawl main entry point
//!
//! This is the command-line interface for the Lemma-Crawl site indexer.

use clap::{Parser, Subcommand};
use lemma_crawl::config::{load_config_with_hash, Config};
use lemma_crawl::output::{load_statistics, print_statistics};
use lemma_crawl::storage::SqliteStorage;
use lemma_crawl::IndexingService;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Lemma-Crawl: a site crawler that builds an inverted lemma index
///
/// Lemma-Crawl fetches each configured site's root page and the pages it
/// links to, and records how often every lemma occurs on each page.
#[derive(Parser, Debug)]
#[command(name = "lemma-crawl")]
#[command(version = "1.0.0")]
#[command(about = "Crawls sites into an inverted lemma index", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Validate config and show what would be indexed without indexing
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index every configured site (Ctrl-C stops the run)
    Start,

    /// Re-index a single page of an already indexed site
    Page {
        /// Absolute URL of the page
        url: String,
    },

    /// Show per-site statistics from the database and exit
    Stats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    match cli.command.unwrap_or(Command::Start) {
        Command::Start => handle_start(&config).await?,
        Command::Page { url } => handle_page(&config, &url).await?,
        Command::Stats => handle_stats(&config)?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lemma_crawl=info,warn"),
            1 => EnvFilter::new("lemma_crawl=debug,info"),
            2 => EnvFilter::new("lemma_crawl=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be indexed
fn handle_dry_run(config: &Config) {
    println!("=== Lemma-Crawl Dry Run ===\n");

    println!("Indexing Configuration:");
    println!(
        "  Max concurrent sites: {}",
        config.indexing.max_concurrent_sites
    );
    println!("  Fetch delay: {}ms", config.indexing.fetch_delay_ms);
    println!("  Stop timeout: {}ms", config.indexing.stop_timeout_ms);
    println!(
        "  Request timeout: {}s",
        config.indexing.request_timeout_secs
    );

    println!("\nUser Agent:");
    println!("  User-Agent: {}", config.user_agent.user_agent);
    println!("  Referer: {}", config.user_agent.referer);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        println!("  - {} ({})", site.name, site.url);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would index {} sites", config.sites.len());
}

/// Runs a full indexing pass until it finishes or Ctrl-C is pressed
async fn handle_start(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let service = IndexingService::from_config(config)?;

    let response = service.start_indexing_response();
    println!("{}", response.to_json());
    if !response.result {
        return Ok(());
    }

    tokio::select! {
        _ = service.wait_for_idle() => {
            tracing::info!("Indexing completed");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received, stopping indexing");
            println!("{}", service.stop_indexing_response().await.to_json());
            service.wait_for_idle().await;
        }
    }

    handle_stats(config)
}

/// Re-indexes one page
async fn handle_page(config: &Config, url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let service = IndexingService::from_config(config)?;
    println!("{}", service.index_page_response(url).await.to_json());
    Ok(())
}

/// Handles the stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = SqliteStorage::new(Path::new(&config.storage.database_path))?;
    let summaries = load_statistics(&storage)?;
    print_statistics(&summaries);

    Ok(())
}
