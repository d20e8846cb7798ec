//! CLI entry point for the Ride Comfort Index rater.
//!
//! Provides subcommands for scoring a recording, exporting the latest result,
//! building map data from every stored result, and clearing the store.

use std::ffi::OsStr;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rci_rater::config::{PipelineConfig, RetentionPolicy, StoreConfig};
use rci_rater::error::{PipelineError, StoreError};
use rci_rater::fetch::{BasicClient, load_source};
use rci_rater::map::aggregate::summarize;
use rci_rater::map::writetos3::write_json_to_s3;
use rci_rater::output::{print_json, print_pretty, write_csv};
use rci_rater::pipeline::process;
use rci_rater::store::{LocalStore, ResultStore};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Exit code for a batch rejected with a user-visible reason.
const REJECTED: u8 = 2;

#[derive(Parser)]
#[command(name = "rci_rater")]
#[command(about = "Compute ride comfort indices from vehicle accelerometer data", long_about = None)]
struct Cli {
    /// Directory holding processed datasets [env: RCI_STORE_DIR]
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Whether a new result replaces or accumulates with earlier ones
    #[arg(long, global = true, value_enum, default_value_t = RetentionPolicy::Replace)]
    retention: RetentionPolicy,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every row of a CSV or JSON recording from a file or URL
    Calculate {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Also write the processed CSV here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON file with pipeline settings
        #[arg(short, long)]
        config: Option<String>,

        /// Accelerometer sample rate in Hz (overrides config)
        #[arg(short = 'r', long)]
        sample_rate: Option<f64>,

        /// Discard rows with a pdop above this (overrides config)
        #[arg(long)]
        max_pdop: Option<f64>,

        /// Score rows in parallel
        #[arg(long, default_value_t = false)]
        parallel: bool,

        /// Do not persist the result
        #[arg(long, default_value_t = false)]
        no_store: bool,
    },
    /// Aggregate all stored results into map points
    MapData {
        /// Write the JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Optional: S3 bucket to publish the map JSON to (e.g., "my-bucket")
        #[arg(long)]
        s3_bucket: Option<String>,

        /// Object key used when publishing to S3
        #[arg(long, default_value = "map/points.json")]
        s3_key: String,

        /// Optional: Gzip compress the JSON before uploading to S3
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Write the most recently stored result as CSV
    Latest {
        /// Write the CSV here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete every stored result
    Clear,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/rci_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("rci_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let store = LocalStore::new(StoreConfig {
        dir: cli.store_dir.unwrap_or_else(StoreConfig::default_dir),
        retention: cli.retention,
    });

    match cli.command {
        Commands::Calculate {
            source,
            output,
            config,
            sample_rate,
            max_pdop,
            parallel,
            no_store,
        } => {
            let mut config = match config {
                Some(path) => PipelineConfig::load(&path)?,
                None => PipelineConfig::default(),
            };
            if let Some(rate) = sample_rate {
                config.sample_rate_hz = rate;
            }
            if let Some(max) = max_pdop {
                config.max_pdop = max;
            }
            config.parallel |= parallel;

            return calculate(&store, &source, output.as_deref(), config, no_store).await;
        }
        Commands::MapData {
            output,
            s3_bucket,
            s3_key,
            gzip,
        } => {
            let datasets = store.load_all().await?;
            if datasets.is_empty() {
                return Ok(reject(&StoreError::NotFound.to_string()));
            }
            let summary = summarize(&datasets);
            info!(
                datasets = summary.datasets,
                points = summary.point_count,
                "Map data assembled"
            );

            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("creating '{}'", path.display()))?;
                    serde_json::to_writer_pretty(file, &summary.points)?;
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    serde_json::to_writer_pretty(&mut stdout, &summary.points)?;
                    writeln!(stdout)?;
                }
            }

            if let Some(bucket) = s3_bucket {
                let config = aws_config::load_from_env().await;
                let s3 = aws_sdk_s3::Client::new(&config);
                write_json_to_s3(&s3, &bucket, &s3_key, &summary, gzip).await?;
            }
        }
        Commands::Latest { output } => match store.load_latest().await {
            Ok(dataset) => match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("creating '{}'", path.display()))?;
                    write_csv(&dataset, file)?;
                }
                None => write_csv(&dataset, std::io::stdout().lock())?,
            },
            Err(StoreError::NotFound) => return Ok(reject(&StoreError::NotFound.to_string())),
            Err(e) => return Err(e.into()),
        },
        Commands::Clear => {
            let removed = store.clear().await?;
            info!(removed, dir = %store.dir().display(), "Store cleared");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Loads, scores and stores one recording.
#[tracing::instrument(skip(store, config), fields(store_dir = %store.dir().display()))]
async fn calculate(
    store: &LocalStore,
    source: &str,
    output: Option<&Path>,
    config: PipelineConfig,
    no_store: bool,
) -> Result<ExitCode> {
    let client = BasicClient::new();
    let dataset = load_source(&client, source).await?;
    info!(columns = ?dataset.columns, rows = dataset.len(), "Processing file");

    // CPU-bound; keep it off the async workers.
    let result = tokio::task::spawn_blocking(move || process(dataset, &config)).await?;

    let augmented = match result {
        Ok(augmented) => augmented,
        Err(e) => return Ok(reject_batch(&e)),
    };

    print_pretty(&augmented.stats);
    print_json(&augmented.stats)?;
    info!(yield_pct = augmented.stats.yield_pct(), "Rows scored");

    if !no_store {
        let handle = store.store(&augmented.dataset).await?;
        info!(%handle, "Result stored");
    }

    if let Some(path) = output {
        let file =
            File::create(path).with_context(|| format!("creating '{}'", path.display()))?;
        write_csv(&augmented.dataset, file)?;
        info!(path = %path.display(), "Processed CSV written");
    }

    Ok(ExitCode::SUCCESS)
}

fn reject_batch(e: &PipelineError) -> ExitCode {
    error!(error = %e, "Batch rejected");
    reject(&e.to_string())
}

/// Reports a structured rejection on stdout.
fn reject(reason: &str) -> ExitCode {
    println!("{}", serde_json::json!({ "error": reason }));
    ExitCode::from(REJECTED)
}
