//! CLI entry point for the stop traffic pipeline.
//!
//! Provides subcommands for downloading the raw sources, building the joined
//! snapshot, and aggregating delay, flow or load per stop over an hour window.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use stop_traffic::{
    config::PipelineConfig,
    fetch::BasicClient,
    metrics::{HourWindow, Metric},
    output::{print_json, print_pretty, write_csv, write_json},
    pipeline::{aggregate_snapshot, build, download},
};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "stop_traffic")]
#[command(about = "Aggregate transit delay, passenger flow and vehicle load per stop", long_about = None)]
struct Cli {
    /// Directory for cached sources and the joined snapshot (overrides DATA_DIR)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the ridership records and the stop catalog into the data directory
    Download {
        /// Record source URL or file path (overrides TRAFFIC_URL)
        #[arg(long)]
        traffic_url: Option<String>,

        /// Stop catalog URL or file path (overrides STOPS_URL)
        #[arg(long)]
        stops_url: Option<String>,
    },
    /// Parse, flatten and join the cached sources into a snapshot
    Build,
    /// Download the sources, then build the snapshot
    Run {
        /// Record source URL or file path (overrides TRAFFIC_URL)
        #[arg(long)]
        traffic_url: Option<String>,

        /// Stop catalog URL or file path (overrides STOPS_URL)
        #[arg(long)]
        stops_url: Option<String>,
    },
    /// Aggregate one metric per stop from the snapshot
    Aggregate {
        /// Metric to compute: delay, flow or load
        #[arg(short, long)]
        metric: Metric,

        /// First scheduled hour included
        #[arg(short, long, default_value_t = 0)]
        start_hour: i32,

        /// First scheduled hour excluded
        #[arg(short, long, default_value_t = 24)]
        end_hour: i32,

        /// Snapshot to read (defaults to the one in the data directory)
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// File to write results to; results are logged when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/stop_traffic.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("stop_traffic.log"));

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

    let mut config = PipelineConfig::from_env();
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    match cli.command {
        Commands::Download {
            traffic_url,
            stops_url,
        } => {
            apply_sources(&mut config, traffic_url, stops_url);
            download(&BasicClient::with_timeout(config.fetch_timeout)?, &config).await?;
        }
        Commands::Build => {
            build(&config)?;
        }
        Commands::Run {
            traffic_url,
            stops_url,
        } => {
            apply_sources(&mut config, traffic_url, stops_url);
            download(&BasicClient::with_timeout(config.fetch_timeout)?, &config).await?;
            build(&config)?;
        }
        Commands::Aggregate {
            metric,
            start_hour,
            end_hour,
            snapshot,
            output,
            format,
        } => {
            let window = HourWindow::new(start_hour, end_hour)?;
            let snapshot = snapshot.unwrap_or_else(|| config.snapshot_path());
            let metrics = aggregate_snapshot(&snapshot, window, metric)?;

            print_pretty(&metrics);
            match (output, format) {
                (Some(path), OutputFormat::Csv) => write_csv(&path, &metrics)?,
                (Some(path), OutputFormat::Json) => write_json(&path, &metrics)?,
                (None, _) => print_json(&metrics)?,
            }

            info!(
                %metric,
                start_hour,
                end_hour,
                stops = metrics.len(),
                "Aggregation finished"
            );
        }
    }

    Ok(())
}

fn apply_sources(
    config: &mut PipelineConfig,
    traffic_url: Option<String>,
    stops_url: Option<String>,
) {
    if let Some(url) = traffic_url {
        config.traffic_url = url;
    }
    if let Some(url) = stops_url {
        config.stops_url = url;
    }
}
