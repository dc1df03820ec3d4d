//! The three metric kinds and how each turns a departure into a value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::metrics::timestamp::Departure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Seconds between scheduled and real departure; early departures count as on time.
    Delay,
    /// Boardings plus alightings.
    Flow,
    /// Mean of the occupancy before arrival and after departure.
    Load,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Delay, Metric::Flow, Metric::Load];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Delay => "delay",
            Metric::Flow => "flow",
            Metric::Load => "load",
        }
    }

    pub fn compute_value(&self, departure: &Departure<'_>) -> f64 {
        let record = departure.record;
        match self {
            Metric::Delay => {
                let delay = departure.real - departure.scheduled;
                (delay.num_milliseconds() as f64 / 1000.0).max(0.0)
            }
            Metric::Flow => (record.entry_count + record.exit_count) as f64,
            Metric::Load => {
                (record.after_departure_count + record.before_arrival_count) as f64 / 2.0
            }
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| PipelineError::InvalidMetric(s.to_string()))
    }
}
