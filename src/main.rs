//! Exhibitor-Harvest main entry point
//!
//! This is the command-line interface for the Exhibitor-Harvest scraper.

use anyhow::{Context, Result};
use clap::Parser;
use exhibitor_harvest::browser::ChromeDriver;
use exhibitor_harvest::config::{load_config_with_hash, Config};
use exhibitor_harvest::harvest::HarvestSettings;
use exhibitor_harvest::storage::{open_workbook, Snapshots, TabularStore};
use exhibitor_harvest::translate::{translate_workbook, GoogleTranslator};
use exhibitor_harvest::{Harvester, RunOutcome};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Exhibitor-Harvest: a resumable exhibitor-list scraper
///
/// Walks the paginated exhibitor listing with a headless browser and
/// checkpoints every exhibitor into a workbook. An interrupted run resumes
/// from the records already marked done.
#[derive(Parser, Debug)]
#[command(name = "exhibitor-harvest")]
#[command(version)]
#[command(about = "A resumable exhibitor-list scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// First listing page to scrape (overrides run.start-page)
    #[arg(long, value_name = "N")]
    start_page: Option<u32>,

    /// Last listing page to scrape (overrides run.end-page)
    #[arg(long, value_name = "N")]
    end_page: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Translate the scraped workbook instead of scraping
    #[arg(long, conflicts_with_all = ["stats", "dry_run"])]
    translate: bool,

    /// Show statistics from the workbook and exit
    #[arg(long, conflicts_with_all = ["translate", "dry_run"])]
    stats: bool,

    /// Validate config and show what would be scraped without scraping
    #[arg(long, conflicts_with_all = ["translate", "stats"])]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(page) = cli.start_page {
        config.run.start_page = page;
    }
    if let Some(page) = cli.end_page {
        config.run.end_page = page;
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.translate {
        handle_translate(&config, &config_hash).await?;
    } else {
        handle_scrape(&config, &config_hash).await?;
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
            0 => EnvFilter::new("exhibitor_harvest=info,warn"),
            1 => EnvFilter::new("exhibitor_harvest=debug,info"),
            2 => EnvFilter::new("exhibitor_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Exhibitor-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    match config.site.listing_url() {
        Ok(url) => println!("  Listing: {}", url),
        Err(e) => println!("  Listing: invalid ({})", e),
    }

    println!("\nBrowser:");
    println!("  Headless: {}", config.browser.headless);
    if let Some(path) = &config.browser.chrome_executable {
        println!("  Executable: {}", path.display());
    }
    if !config.browser.args.is_empty() {
        println!("  Args: {}", config.browser.args.join(" "));
    }
    println!("  Settle: {}s", config.browser.settle_seconds);
    println!("  Selector timeout: {}s", config.browser.selector_timeout_seconds);

    println!("\nRun:");
    println!(
        "  Pages: {} to {}",
        config.run.start_page, config.run.end_page
    );
    println!("  Attempts per record: {}", config.run.max_attempts);
    println!("  Error budget: {}", config.run.error_budget);
    println!(
        "  Navigation retries: {} ({}s back-off)",
        config.run.navigation_retries, config.run.navigation_backoff_seconds
    );

    let snapshots = Snapshots::for_workbook(&config.output.workbook_path);
    println!("\nOutput:");
    println!("  Workbook: {}", snapshots.primary().display());
    println!("  Copy: {}", snapshots.copy().display());
    println!("  Backup: {}", snapshots.backup().display());

    println!("\nTranslate:");
    println!("  API: {}", config.translate.api_url);
    println!(
        "  Languages: {} -> {}",
        config.translate.source, config.translate.target
    );

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the workbook
fn handle_stats(config: &Config) -> Result<()> {
    use exhibitor_harvest::output::{load_statistics, print_statistics};

    println!("Workbook: {}\n", config.output.workbook_path.display());

    let workbook = open_workbook(&config.output.workbook_path)?;
    let stats = load_statistics(&workbook)?;
    print_statistics(&stats);
    workbook.close()?;

    Ok(())
}

/// Handles the --translate mode
async fn handle_translate(config: &Config, config_hash: &str) -> Result<()> {
    let translator = GoogleTranslator::from_env(&config.translate)
        .context("Failed to set up the translation client")?;

    let snapshots = Snapshots::for_workbook(&config.output.workbook_path);
    let mut workbook = open_workbook(&config.output.workbook_path)?;

    let result = translate_workbook(&mut workbook, &snapshots, &translator, config_hash).await;
    workbook.close()?;

    let report = result.context("Translation failed")?;
    tracing::info!(
        "Translation completed: {} rows translated, {} already translated",
        report.translated,
        report.skipped
    );
    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(config: &Config, config_hash: &str) -> Result<()> {
    let settings = HarvestSettings::from_config(config)?;
    let snapshots = Snapshots::for_workbook(&config.output.workbook_path);
    let workbook = open_workbook(&config.output.workbook_path)?;
    let browser = ChromeDriver::launch(&config.browser)
        .await
        .context("Failed to start the browser")?;

    let mut harvester = Harvester::new(browser, workbook, snapshots, settings, config_hash);
    let result = harvester
        .run(config.run.start_page, config.run.end_page)
        .await;

    if let Err(e) = harvester.shutdown().await {
        tracing::warn!("Shutdown was not clean: {}", e);
    }

    match result {
        Ok(report) => {
            tracing::info!(
                "{} records extracted, {} already done, {} failed, {} empty pages",
                report.tally.extracted,
                report.tally.skipped,
                report.tally.failed,
                report.tally.empty_pages
            );
            if report.tally.overflow_cards > 0 {
                tracing::warn!(
                    "{} cards were beyond their page's capacity and not recorded",
                    report.tally.overflow_cards
                );
            }
            match report.outcome {
                RunOutcome::Completed => println!("Execution completed"),
                RunOutcome::StoppedDueToErrors => println!(
                    "Execution stopped due to errors ({} failed attempts)",
                    report.failures
                ),
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            Err(e.into())
        }
    }
}
