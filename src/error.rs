//! Error types for every pipeline stage.
//!
//! Each variant names the stage that failed. No stage recovers locally: any
//! error aborts the run so that a partial dataset never reaches aggregation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// A remote source answered with a non-success status or could not be reached.
    #[error("retrieval of '{url}' failed: {reason}")]
    Retrieval { url: String, reason: String },

    /// A raw traffic row is too short, has a bad identifier, or a non-integer count.
    #[error("malformed traffic record on line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("cannot parse departure timestamp '{value}'")]
    TimestampParse { value: String },

    #[error("invalid hour window [{start}, {end}): expected 0 <= start < end <= 24")]
    InvalidWindow { start: i32, end: i32 },

    #[error("invalid metric '{0}': expected one of delay, flow, load")]
    InvalidMetric(String),

    #[error("unsupported snapshot schema version {found} (expected {expected})")]
    SnapshotVersion { found: u8, expected: u8 },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}
