//! binstat CLI
//!
//! Builds a histogram or profile from a JSON configuration, fills it from a
//! sample file and prints a summary.
#![allow(
    clippy::uninlined_format_args,
    clippy::must_use_candidate,
    clippy::missing_errors_doc
)]

mod accumulate;
mod input;
mod report;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use binstat_core::{Histogram, HistogramConfig};
use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::input::RowLayout;
use crate::report::Summary;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Histogram error: {0}")]
    Core(#[from] binstat_core::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: {source}")]
    Sample {
        line: usize,
        source: binstat_core::Error,
    },
}

/// Weighted histogram and profile filler.
#[derive(Parser)]
#[command(name = "binstat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the binning layout described by a configuration
    Info {
        /// Histogram configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Fill a histogram from a sample file and summarize it
    Fill {
        /// Histogram configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Sample file: coordinates, then v for profiles, then the weight
        input: PathBuf,

        /// Read a weight as the last field of every sample
        #[arg(short, long)]
        weighted: bool,

        /// Number of worker threads (defaults to all cores)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: &Path) -> Result<HistogramConfig> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { config } => {
            let histogram = Histogram::new(&load_config(&config)?)?;
            report::write_layout(&histogram, &mut std::io::stdout().lock())?;
        }

        Commands::Fill {
            config,
            input,
            weighted,
            jobs,
            json,
        } => {
            let template = Histogram::new(&load_config(&config)?)?;
            let layout = RowLayout {
                dimension: template.dimension(),
                profile: template.is_profile(),
                weighted,
            };

            let start = Instant::now();
            let batch = input::read_samples(&input, layout)?;
            log::info!(
                "read {} samples from {} in {:.2?}",
                batch.len(),
                input.display(),
                start.elapsed()
            );
            if batch.is_empty() {
                log::warn!("{} contains no samples", input.display());
            }

            let mut pool = rayon::ThreadPoolBuilder::new();
            if let Some(jobs) = jobs {
                pool = pool.num_threads(jobs);
            }
            let pool = pool.build()?;

            let start = Instant::now();
            let filled = pool.install(|| accumulate::accumulate(&template, &batch))?;
            log::info!(
                "filled {} samples on {} threads in {:.2?}",
                batch.len(),
                pool.current_num_threads(),
                start.elapsed()
            );

            let summary = Summary::new(&filled);
            let mut out = std::io::stdout().lock();
            if json {
                report::write_json(&summary, &mut out)?;
            } else {
                report::write_text(&summary, &mut out)?;
            }
        }
    }

    Ok(())
}
