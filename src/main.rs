//! journal-harvest - bulk OpenAlex downloads per journal
//!
//! ## Usage
//!
//! ### Batch Mode
//! ```bash
//! journal-harvest batch journals.txt --output-dir output --start 1 --end 500
//! ```
//!
//! ### Single Journal Mode
//! ```bash
//! journal-harvest journal "Nature" --output nature --format both
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use journal_harvest::batch::read_journal_list;
use journal_harvest::job::download_journal;
use journal_harvest::output::{save_csv, save_json};
use journal_harvest::{BatchConfig, BatchRunner, BatchSummary, HarvestConfig, JobRunner, OpenAlexClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Download every work of one or many journals from OpenAlex
#[derive(Parser)]
#[command(name = "journal-harvest")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every journal listed in a text file, one JSON file per line
    Batch {
        /// Text file with one journal name per line
        input_file: PathBuf,

        /// Output directory for JSON files
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Start from line number (1-indexed)
        #[arg(short, long, default_value_t = 1)]
        start: usize,

        /// End at line number (1-indexed, inclusive)
        #[arg(short, long)]
        end: Option<usize>,

        /// Progress log file
        #[arg(short, long, default_value = "batch_log.json")]
        log: PathBuf,

        /// Contact email for the OpenAlex polite pool
        #[arg(long, env = "OPENALEX_MAILTO")]
        email: Option<String>,

        /// Concurrent page requests per journal
        #[arg(long, default_value_t = 2)]
        workers: usize,
    },

    /// Download every work of a single journal
    Journal {
        /// Journal name to search for
        journal_name: String,

        /// Output filename without extension
        #[arg(short, long, default_value = "journal_articles")]
        output: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Both)]
        format: OutputFormat,

        /// Contact email for the OpenAlex polite pool
        #[arg(short, long, env = "OPENALEX_MAILTO")]
        email: Option<String>,

        /// Concurrent page requests
        #[arg(long, default_value_t = 5)]
        workers: usize,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
    Both,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Batch {
            input_file,
            output_dir,
            start,
            end,
            log,
            email,
            workers,
        } => {
            let batch = BatchConfig {
                output_dir,
                log_path: log,
                start,
                end,
                workers,
                ..Default::default()
            };
            run_batch(input_file, batch, email).await
        }
        Commands::Journal {
            journal_name,
            output,
            format,
            email,
            workers,
        } => run_single(journal_name, output, format, email, workers).await,
    }
}

fn build_client(mut config: HarvestConfig, email: Option<String>) -> Result<OpenAlexClient> {
    if let Some(email) = email {
        config = config.with_contact_email(email);
    }
    OpenAlexClient::new(Arc::new(config)).context("Invalid OpenAlex client configuration")
}

// ============================================================================
// Batch Mode
// ============================================================================

async fn run_batch(input_file: PathBuf, batch: BatchConfig, email: Option<String>) -> Result<()> {
    let harvest = HarvestConfig::batch();

    println!("Reading journal list from {}...", input_file.display());
    let journals = read_journal_list(&input_file)
        .with_context(|| format!("Failed to read {}", input_file.display()))?;
    println!("Total journals in file: {}", journals.len());

    let end = batch.end.unwrap_or(journals.len()).min(journals.len());
    println!("Started at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("Processing journals from line {} to {}", batch.start, end);
    println!("Output directory: {}", batch.output_dir.display());
    println!("Log file: {}", batch.log_path.display());
    println!();
    println!("Rate limiting settings:");
    println!("  - Request delay: {:?} between requests", harvest.request_delay);
    println!("  - Max concurrent workers: {}", batch.workers);
    println!("  - Per-page results: {}", harvest.per_page);
    println!("  - Randomized contact addresses: {}", harvest.randomize_contact);
    println!();

    let client = build_client(harvest, email)?;
    let runner = JobRunner::new(client, batch.output_dir.clone(), batch.workers);
    let log_path = batch.log_path.clone();

    let summary = BatchRunner::new(runner, batch)
        .run(&journals)
        .await
        .context("Batch run aborted")?;

    print_summary(&summary);
    println!("\nLog saved to: {}", log_path.display());
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    println!("\n{}", "=".repeat(60));
    println!("BATCH PROCESSING SUMMARY");
    println!("{}", "=".repeat(60));
    println!("Total journals processed: {}", summary.total);
    println!("Successfully downloaded: {}", summary.success);
    println!("  of which partial: {}", summary.partial);
    println!("Skipped (already exists): {}", summary.skipped);
    println!("Not found in database: {}", summary.not_found);
    println!("Failed (errors): {}", summary.failed);
    println!("Total articles: {}", summary.articles);
    println!("{}", "=".repeat(60));
    println!("\nTotal time: {:.2} seconds", summary.elapsed.as_secs_f64());
    println!(
        "Average time per journal: {:.2} seconds",
        summary.average_per_journal().as_secs_f64()
    );
}

// ============================================================================
// Single Journal Mode
// ============================================================================

async fn run_single(
    journal_name: String,
    output: String,
    format: OutputFormat,
    email: Option<String>,
    workers: usize,
) -> Result<()> {
    let started = Instant::now();
    let client = build_client(HarvestConfig::single(), email)?;

    info!(journal = %journal_name, "Searching for journal");
    let Some(download) = download_journal(&client, &journal_name, workers).await? else {
        println!("No journal found matching: {}", journal_name);
        return Ok(());
    };
    let source = &download.source;
    let records = &download.records;
    println!("Found journal: {} (ID: {})", source.display_name, source.identifier);

    if download.is_partial() {
        println!(
            "Warning: {} of {} pages dropped after retries; output is incomplete",
            download.failed_pages.len(),
            download.pages_requested
        );
    }

    if records.is_empty() {
        println!("No works were downloaded. Exiting.");
        return Ok(());
    }

    if matches!(format, OutputFormat::Json | OutputFormat::Both) {
        let path = PathBuf::from(format!("{}.json", output));
        save_json(&path, records).context("Failed to write JSON")?;
        println!("Saved {} works to {}", records.len(), path.display());
    }

    if matches!(format, OutputFormat::Csv | OutputFormat::Both) {
        let path = PathBuf::from(format!("{}.csv", output));
        save_csv(&path, records).context("Failed to write CSV")?;
        println!("Saved {} works to {}", records.len(), path.display());
    }

    let elapsed = started.elapsed().as_secs_f64();
    println!("\nCompleted in {:.2} seconds", elapsed);
    println!(
        "Average time per work: {:.3} seconds",
        elapsed / records.len() as f64
    );
    Ok(())
}
