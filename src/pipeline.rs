//! Batch stages: download, build the joined snapshot, aggregate.
//!
//! Each stage consumes its complete input before the next starts. Any stage
//! error aborts the run and nothing is written for the failing stage.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::catalog::{Stop, parse_catalog};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::fetch::{HttpClient, load_source};
use crate::join::{JoinedRecord, join};
use crate::metrics::{AggregatedMetric, HourWindow, Metric, aggregate_window};
use crate::output::write_json;
use crate::parser::{TrafficRecord, parse_records};
use crate::snapshot::{self, Snapshot};

/// Fetches both sources and caches the raw bytes in the data directory.
#[tracing::instrument(skip_all, fields(data_dir = %config.data_dir.display()))]
pub async fn download<C: HttpClient>(client: &C, config: &PipelineConfig) -> Result<()> {
    let traffic = load_source(client, &config.traffic_url).await?;
    let stops = load_source(client, &config.stops_url).await?;

    fs::create_dir_all(&config.data_dir)
        .map_err(|e| PipelineError::io(config.data_dir.display().to_string(), e))?;
    write_bytes(&config.traffic_csv_path(), &traffic)?;
    write_bytes(&config.stops_json_path(), &stops)?;

    info!(
        traffic_bytes = traffic.len(),
        stops_bytes = stops.len(),
        "Sources cached"
    );
    Ok(())
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| PipelineError::io(path.display().to_string(), e))
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| PipelineError::io(path.display().to_string(), e))
}

/// Parses both raw sources and joins them.
pub fn join_sources(
    traffic_csv: &[u8],
    stops_json: &[u8],
) -> Result<(Vec<TrafficRecord>, Vec<Stop>, Vec<JoinedRecord>)> {
    let records = parse_records(traffic_csv)?;
    let stops = parse_catalog(stops_json)?;
    let joined = join(&records, &stops);
    Ok((records, stops, joined))
}

/// Builds the joined snapshot from the cached sources.
///
/// The sorted traffic records and the flattened stops are also written out
/// as JSON next to the snapshot.
#[tracing::instrument(skip_all, fields(data_dir = %config.data_dir.display()))]
pub fn build(config: &PipelineConfig) -> Result<Snapshot> {
    let traffic_csv = read_bytes(&config.traffic_csv_path())?;
    let stops_json = read_bytes(&config.stops_json_path())?;

    let (records, stops, joined) = join_sources(&traffic_csv, &stops_json)?;
    write_json(&config.traffic_out_path(), &records)?;
    write_json(&config.stops_out_path(), &stops)?;

    info!(
        records = records.len(),
        stops = stops.len(),
        joined = joined.len(),
        "Joined dataset built"
    );

    let snapshot = Snapshot::new(joined);
    snapshot::save(&config.snapshot_path(), &snapshot)?;
    Ok(snapshot)
}

/// Loads the snapshot at `path` and aggregates `metric` over `window`.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn aggregate_snapshot(
    path: &Path,
    window: HourWindow,
    metric: Metric,
) -> Result<Vec<AggregatedMetric>> {
    let snapshot = snapshot::load(path)?;
    let metrics = aggregate_window(&snapshot.records, window, metric)?;
    info!(stops = metrics.len(), "Metrics aggregated");
    Ok(metrics)
}
