//! Inner join of traffic records against the stop catalog.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Stop;
use crate::parser::TrafficRecord;

/// A traffic record enriched with the name and position of its stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedRecord {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub scheduled_departure: String,
    pub real_departure: String,
    pub entry_count: u64,
    pub exit_count: u64,
    pub before_arrival_count: u64,
    pub after_departure_count: u64,
}

impl JoinedRecord {
    fn new(record: &TrafficRecord, stop: &Stop) -> Self {
        Self {
            id: record.id.clone(),
            name: stop.name.clone(),
            lat: stop.lat,
            lon: stop.lon,
            scheduled_departure: record.scheduled_departure.clone(),
            real_departure: record.real_departure.clone(),
            entry_count: record.entry_count,
            exit_count: record.exit_count,
            before_arrival_count: record.before_arrival_count,
            after_departure_count: record.after_departure_count,
        }
    }
}

/// Joins records to stops on `id`.
///
/// Output follows record order; a record matching several stops yields one
/// row per stop, in catalog order. Unmatched rows on either side are dropped.
pub fn join(records: &[TrafficRecord], stops: &[Stop]) -> Vec<JoinedRecord> {
    let mut by_id: HashMap<&str, Vec<&Stop>> = HashMap::new();
    for stop in stops {
        by_id.entry(stop.id.as_str()).or_default().push(stop);
    }

    let joined: Vec<JoinedRecord> = records
        .iter()
        .flat_map(|record| {
            by_id
                .get(record.id.as_str())
                .into_iter()
                .flatten()
                .map(move |stop| JoinedRecord::new(record, stop))
        })
        .collect();

    debug!(
        records = records.len(),
        stops = stops.len(),
        joined = joined.len(),
        "Join complete"
    );
    joined
}
