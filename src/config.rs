//! Run configuration.
//!
//! Values come from the environment (a `.env` file is loaded by the binary)
//! and fall back to the public Prague datasets:
//!
//! | Variable             | Default                                 |
//! |----------------------|-----------------------------------------|
//! | `TRAFFIC_URL`        | TRAM2014 ridership records (CSV)        |
//! | `STOPS_URL`          | PID stop catalog (JSON)                 |
//! | `DATA_DIR`           | `data`                                  |
//! | `FETCH_TIMEOUT_SECS` | `30`                                    |

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_TRAFFIC_URL: &str = "https://raw.githubusercontent.com/datastory/dpp-prepravni-pruzkumy/master/data_csv/TRAM2014_records.csv";
pub const DEFAULT_STOPS_URL: &str = "http://data.pid.cz/stops/json/stops.json";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub traffic_url: String,
    pub stops_url: String,
    pub data_dir: PathBuf,
    pub fetch_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            traffic_url: DEFAULT_TRAFFIC_URL.to_string(),
            stops_url: DEFAULT_STOPS_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

impl PipelineConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let fetch_timeout = match lookup("FETCH_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(_) => {
                    warn!(value = %raw, "Ignoring invalid FETCH_TIMEOUT_SECS");
                    defaults.fetch_timeout
                }
            },
            None => defaults.fetch_timeout,
        };

        Self {
            traffic_url: lookup("TRAFFIC_URL").unwrap_or(defaults.traffic_url),
            stops_url: lookup("STOPS_URL").unwrap_or(defaults.stops_url),
            data_dir: lookup("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            fetch_timeout,
        }
    }

    /// Cached copy of the raw record table.
    pub fn traffic_csv_path(&self) -> PathBuf {
        self.data_dir.join("traffic.csv")
    }

    /// Cached copy of the stop catalog.
    pub fn stops_json_path(&self) -> PathBuf {
        self.data_dir.join("stops_pid.json")
    }

    pub fn traffic_out_path(&self) -> PathBuf {
        self.data_dir.join("traffic_out.json")
    }

    pub fn stops_out_path(&self) -> PathBuf {
        self.data_dir.join("stops_out.json")
    }

    /// Joined dataset consumed by aggregation.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("final_traffic.json")
    }
}
