//! On-disk snapshot of the joined dataset.
//!
//! The snapshot lets the aggregator run repeatedly without re-fetching or
//! re-joining. It is plain JSON, gzip-compressed when the path ends in `.gz`.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::join::JoinedRecord;

pub const SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: u8,
    pub created_at: DateTime<Utc>,
    pub records: Vec<JoinedRecord>,
}

impl Snapshot {
    pub fn new(records: Vec<JoinedRecord>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            created_at: Utc::now(),
            records,
        }
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

fn write_snapshot(path: &Path, gzip: bool, snapshot: &Snapshot) -> Result<()> {
    let path_str = path.display().to_string();
    let file = File::create(path).map_err(|e| PipelineError::io(&path_str, e))?;
    let writer = BufWriter::new(file);

    let mut writer = if gzip {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        serde_json::to_writer(&mut encoder, snapshot)?;
        encoder.finish().map_err(|e| PipelineError::io(&path_str, e))?
    } else {
        let mut writer = writer;
        serde_json::to_writer(&mut writer, snapshot)?;
        writer
    };
    writer.flush().map_err(|e| PipelineError::io(&path_str, e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| PipelineError::io(&path_str, e))
}

/// Writes `snapshot` to `path`, replacing any previous file.
///
/// The data goes to a sibling `.tmp` file first and is renamed into place,
/// so a failed write never leaves a truncated snapshot behind.
pub fn save(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let path_str = path.display().to_string();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(&path_str, e))?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    if let Err(e) = write_snapshot(&tmp_path, is_gzip(path), snapshot) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    fs::rename(&tmp_path, path).map_err(|e| PipelineError::io(&path_str, e))?;

    info!(
        path = %path_str,
        records = snapshot.records.len(),
        "Snapshot written"
    );
    Ok(())
}

/// Reads a snapshot written by [`save`].
pub fn load(path: &Path) -> Result<Snapshot> {
    let path_str = path.display().to_string();
    let file = File::open(path).map_err(|e| PipelineError::io(&path_str, e))?;

    let reader: Box<dyn Read> = if is_gzip(path) {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let snapshot: Snapshot = serde_json::from_reader(reader)?;
    if snapshot.schema_version != SCHEMA_VERSION {
        return Err(PipelineError::SnapshotVersion {
            found: snapshot.schema_version,
            expected: SCHEMA_VERSION,
        });
    }

    debug!(
        path = %path_str,
        records = snapshot.records.len(),
        created_at = %snapshot.created_at,
        "Snapshot loaded"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample_records() -> Vec<JoinedRecord> {
        vec![
            JoinedRecord {
                id: "100/1".to_string(),
                name: "Náměstí Míru".to_string(),
                lat: 50.075_496_7,
                lon: 14.437_812_3,
                scheduled_departure: "1.1.2020 08:00:00".to_string(),
                real_departure: "1.1.1900".to_string(),
                entry_count: 5,
                exit_count: 1,
                before_arrival_count: 9,
                after_departure_count: 13,
            },
            JoinedRecord {
                id: "7/2".to_string(),
                name: "Depot".to_string(),
                lat: 0.1 + 0.2,
                lon: -1.0 / 3.0,
                scheduled_departure: "2.1.2020 23:59:59".to_string(),
                real_departure: "3.1.2020 00:00:04".to_string(),
                entry_count: 0,
                exit_count: 0,
                before_arrival_count: 0,
                after_departure_count: 0,
            },
        ]
    }

    #[test]
    fn test_save_and_load_plain() {
        let path = temp_path("stop_traffic_snapshot_test.json");
        let _ = fs::remove_file(&path);

        let snapshot = Snapshot::new(sample_records());
        save(Path::new(&path), &snapshot).unwrap();
        let loaded = load(Path::new(&path)).unwrap();

        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.records[1].lat.to_bits(), (0.1f64 + 0.2).to_bits());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_and_load_gzip() {
        let path = temp_path("stop_traffic_snapshot_test.json.gz");
        let _ = fs::remove_file(&path);

        let snapshot = Snapshot::new(sample_records());
        save(Path::new(&path), &snapshot).unwrap();

        let raw = fs::read(&path).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);

        let loaded = load(Path::new(&path)).unwrap();
        assert_eq!(loaded.records, snapshot.records);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let path = temp_path("stop_traffic_snapshot_replace.json");
        let tmp = format!("{path}.tmp");
        let _ = fs::remove_file(&path);

        save(Path::new(&path), &Snapshot::new(sample_records())).unwrap();
        save(Path::new(&path), &Snapshot::new(Vec::new())).unwrap();

        let loaded = load(Path::new(&path)).unwrap();
        assert!(loaded.records.is_empty());
        assert!(!Path::new(&tmp).exists());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_failed_save_keeps_previous_snapshot() {
        let path = temp_path("stop_traffic_snapshot_failed.json");
        let tmp = format!("{path}.tmp");
        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir_all(&tmp);

        let original = Snapshot::new(sample_records());
        save(Path::new(&path), &original).unwrap();

        // A directory in the way of the staging file makes the write fail
        fs::create_dir_all(&tmp).unwrap();
        let result = save(Path::new(&path), &Snapshot::new(Vec::new()));
        assert!(matches!(result, Err(PipelineError::Io { .. })));

        let loaded = load(Path::new(&path)).unwrap();
        assert_eq!(loaded.records, original.records);

        fs::remove_dir_all(&tmp).unwrap();
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_rejects_other_schema_version() {
        let path = temp_path("stop_traffic_snapshot_version.json");
        fs::write(
            &path,
            r#"{"schema_version":9,"created_at":"2020-01-01T00:00:00Z","records":[]}"#,
        )
        .unwrap();

        let result = load(Path::new(&path));
        assert!(matches!(
            result,
            Err(PipelineError::SnapshotVersion { found: 9, .. })
        ));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let result = load(Path::new(&temp_path("stop_traffic_no_such_snapshot.json")));
        assert!(matches!(result, Err(PipelineError::Io { .. })));
    }
}
