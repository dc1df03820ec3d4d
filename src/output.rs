//! Output formatting and persistence for aggregated metrics.
//!
//! Supports logging, JSON files, and CSV files.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::metrics::AggregatedMetric;

/// Logs metrics using Rust's debug pretty-print format.
pub fn print_pretty(metrics: &[AggregatedMetric]) {
    debug!("{:#?}", metrics);
}

/// Logs metrics as pretty-printed JSON.
pub fn print_json(metrics: &[AggregatedMetric]) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(metrics)?);
    Ok(())
}

fn create(path: &Path) -> Result<File> {
    let path_str = path.display().to_string();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(&path_str, e))?;
    }
    File::create(path).map_err(|e| PipelineError::io(path_str, e))
}

/// Writes any serializable value to `path` as pretty JSON, replacing the file.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let mut writer = BufWriter::new(create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer
        .flush()
        .map_err(|e| PipelineError::io(path.display().to_string(), e))?;
    debug!(path = %path.display(), "JSON written");
    Ok(())
}

/// Writes metrics to `path` as CSV with a header row, replacing the file.
pub fn write_csv(path: &Path, metrics: &[AggregatedMetric]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_writer(create(path)?);

    for metric in metrics {
        writer.serialize(metric)?;
    }
    writer
        .flush()
        .map_err(|e| PipelineError::io(path.display().to_string(), e))?;

    debug!(path = %path.display(), rows = metrics.len(), "CSV written");
    Ok(())
}
