//! Bulletin-Watch main entry point
//!
//! This is the command-line interface for the Bulletin-Watch announcement poller.

use anyhow::Context;
use bulletin_watch::config::{resolve_config, Config, Overrides};
use bulletin_watch::poller::{Controller, CycleOutcome};
use bulletin_watch::storage::{open_store, Store};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Bulletin-Watch: an announcement board tail
///
/// Polls the announcements listing, and appends every entry that is newer
/// than the last one written to a CSV file. Runs until interrupted.
#[derive(Parser, Debug)]
#[command(name = "bulletin-watch")]
#[command(version = "1.0.0")]
#[command(about = "Append new announcements to a CSV file", long_about = None)]
struct Cli {
    /// CSV file to append to [default: news.csv]
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Category filter (empty for all categories)
    #[arg(short, long)]
    category: Option<String>,

    /// Listing page to watch
    #[arg(short, long)]
    page: Option<u32>,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Seed the watermark saved next to FILE instead of starting empty
    #[arg(long)]
    resume: bool,

    /// Run a single poll cycle and exit
    #[arg(long, conflicts_with = "dry_run")]
    once: bool,

    /// Validate configuration and show what would be polled, then exit
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let overrides = Overrides {
        output: cli.file.clone(),
        category: cli.category.clone(),
        page: cli.page,
    };

    let (config, config_hash) = match resolve_config(cli.config.as_deref(), overrides) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return Err(e).context("failed to load configuration");
        }
    };

    if let (Some(path), Some(hash)) = (&cli.config, &config_hash) {
        tracing::info!("Configuration loaded from {} (hash: {})", path.display(), hash);
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.once {
        handle_once(&config, cli.resume).await?;
    } else {
        handle_watch(config, cli.resume).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bulletin_watch=info,warn"),
            1 => EnvFilter::new("bulletin_watch=debug,info"),
            2 => EnvFilter::new("bulletin_watch=trace,debug"),
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

/// Handles the --dry-run mode: prints the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Bulletin-Watch Dry Run ===\n");

    println!("Source:");
    println!("  Base URL: {}", config.source.base_url);
    println!("  Locale: {}", config.source.locale);
    println!("  User agent: {}", config.source.user_agent);
    println!(
        "  Timeout: {}s (connect {}s)",
        config.source.timeout_secs, config.source.connect_timeout_secs
    );

    println!("\nTarget:");
    if config.target.category.is_empty() {
        println!("  Category: (all)");
    } else {
        println!("  Category: {}", config.target.category);
    }
    println!("  Page: {}", config.target.page);

    println!("\nPolling:");
    println!("  Interval: {}ms", config.poll.interval_ms);
    println!("  Max backoff: {}ms", config.poll.max_backoff_ms);
    println!("  Jitter: {:.0}%", config.poll.jitter * 100.0);
    println!("  Parse alert after: {} failures", config.poll.parse_alert_threshold);

    println!("\nOutput:");
    println!("  File: {}", config.output.path.display());

    println!("\n✓ Configuration is valid");
}

/// Handles the --once mode: a single cycle, failures become the exit status
async fn handle_once(config: &Config, resume: bool) -> anyhow::Result<()> {
    let store = open_store(&config.output.path).context("failed to open output file")?;
    let mut controller = Controller::new(config, store).context("failed to set up poller")?;
    controller
        .prepare(resume)
        .context("failed to restore watermark")?;

    let outcome = match controller.run_cycle().await {
        Ok(outcome) => outcome,
        Err(e) => {
            let stage = e.stage();
            return Err(
                anyhow::Error::new(e).context(format!("poll cycle failed at {} stage", stage))
            );
        }
    };

    match outcome {
        CycleOutcome::Appended { count, watermark }
        | CycleOutcome::Recovered { count, watermark } => {
            println!("Appended {} announcements (watermark {})", count, watermark);
        }
        CycleOutcome::NoNewItems => println!("No new announcements"),
    }

    let total = controller
        .store()
        .count_records()
        .context("failed to count rows")?;
    println!("{} now holds {} announcements", controller.store().location(), total);

    Ok(())
}

/// Handles the main watch operation until Ctrl+C
async fn handle_watch(config: Config, resume: bool) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();

    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received shutdown signal");
                signal.cancel();
            }
            Err(e) => tracing::warn!("Cannot listen for Ctrl+C, running until killed: {}", e),
        }
    });

    bulletin_watch::poller::watch(config, resume, shutdown)
        .await
        .context("poller failed to start")?;

    Ok(())
}
