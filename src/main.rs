//! Wayback-Mirror main entry point
//!
//! This is the command-line interface for mirroring a site's archived
//! history.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wayback_mirror::config::{resolve_config, Config, ConfigOverrides};
use wayback_mirror::crawler::run_mirror;
use wayback_mirror::output::print_statistics;

/// Wayback-Mirror: download every archived version of a site
///
/// Wayback-Mirror looks up each page of the given domains in the Wayback
/// Machine index, downloads every distinct capture inside the time range,
/// and follows the links found in them.
#[derive(Parser, Debug)]
#[command(name = "wayback-mirror")]
#[command(version)]
#[command(about = "Mirror the archived history of websites", long_about = None)]
struct Cli {
    /// Domains or URLs to mirror
    #[arg(value_name = "DOMAIN")]
    domains: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory to store snapshots in
    #[arg(short, long, value_name = "DIR")]
    output: Option<String>,

    /// Earliest capture to mirror (YYYYmmddHHMMSS prefix or Unix time)
    #[arg(short, long, value_name = "TIMESTAMP")]
    from: Option<String>,

    /// Latest capture to mirror (YYYYmmddHHMMSS prefix or Unix time)
    #[arg(short, long, value_name = "TIMESTAMP")]
    to: Option<String>,

    /// Only follow URLs matching this regex (repeatable)
    #[arg(short, long, value_name = "REGEX")]
    allow: Vec<String>,

    /// Never follow URLs matching this regex (repeatable)
    #[arg(short, long, value_name = "REGEX")]
    deny: Vec<String>,

    /// Maximum number of requests in flight
    #[arg(long, value_name = "N")]
    concurrency: Option<u32>,

    /// Name snapshot files by Unix timestamp
    #[arg(short, long)]
    unix: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be mirrored without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Some(path) = &cli.config {
        tracing::info!("Loading configuration from: {}", path.display());
    }

    let overrides = ConfigOverrides {
        domains: cli.domains,
        output: cli.output,
        from: cli.from,
        to: cli.to,
        allow: cli.allow,
        deny: cli.deny,
        concurrency: cli.concurrency,
        unix_filenames: cli.unix,
    };

    let (config, config_hash) =
        resolve_config(cli.config.as_deref(), overrides).context("Invalid configuration")?;
    if let Some(hash) = config_hash {
        tracing::info!("Configuration loaded successfully (hash: {})", hash);
    }

    if cli.dry_run {
        handle_dry_run(&config)
    } else {
        handle_mirror(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wayback_mirror=info,warn"),
            1 => EnvFilter::new("wayback_mirror=debug,info"),
            2 => EnvFilter::new("wayback_mirror=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be mirrored
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let window = config.time_window()?;
    let endpoints = config.endpoints()?;
    let seeds = config.seed_urls()?;

    println!("=== Wayback-Mirror Dry Run ===\n");

    println!("Archive:");
    println!("  Base URL: {}", config.archive.base_url);
    println!("  Index path: {}", config.archive.index_path);
    println!("  Robots: {}", endpoints.robots_url());
    println!("  Time window: {}", window);
    println!("  Max attempts: {}", config.archive.max_attempts);

    println!("\nCrawler:");
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Download delay: {}ms", config.crawler.download_delay);
    println!("  Retry delay: {}ms (doubling)", config.crawler.retry_delay);
    match config.mirror.max_depth {
        Some(depth) => println!("  Max depth: {}", depth),
        None => println!("  Max depth: unlimited"),
    }
    println!("  User agent: {}", config.user_agent_string());

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!(
        "  File names: {}",
        if config.output.unix_filenames {
            "Unix timestamp"
        } else {
            "YYYYmmddHHMMSS"
        }
    );

    println!("\nStart URLs ({}):", seeds.len());
    for seed in &seeds {
        println!("  - {}", seed);
    }

    if !config.mirror.allow.is_empty() {
        println!("\nAllow patterns:");
        for pattern in &config.mirror.allow {
            println!("  - {}", pattern);
        }
    }
    if !config.mirror.deny.is_empty() {
        println!("\nDeny patterns:");
        for pattern in &config.mirror.deny {
            println!("  - {}", pattern);
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start mirroring with {} start URLs", seeds.len());

    Ok(())
}

/// Handles the main mirror operation
async fn handle_mirror(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Domains: {}, output directory: {}",
        config.mirror.domains.len(),
        config.output.directory
    );

    let stats = run_mirror(config).await.context("Mirror failed")?;
    tracing::info!("Mirror completed successfully");

    print_statistics(&stats);
    Ok(())
}
