use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::join::JoinedRecord;
use crate::metrics::kind::Metric;
use crate::metrics::timestamp::{Departure, is_unobserved};
use crate::metrics::utility::mean;
use crate::metrics::window::HourWindow;

/// Mean metric value for one stop post over an hour window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMetric {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub value: f64,
    /// Number of records averaged into `value`.
    pub samples: usize,
}

/// Stops are grouped on id together with their display attributes, so two
/// catalog entries sharing an id but differing in name or position stay apart.
type GroupKey<'a> = (&'a str, &'a str, u64, u64);

/// Aggregates `metric` per stop over departures scheduled in
/// `[start_hour, end_hour)`.
///
/// Records whose real departure was never observed are skipped before any
/// timestamp is parsed. Groups are returned ordered by id.
///
/// # Errors
///
/// [`InvalidWindow`](crate::error::PipelineError::InvalidWindow) for a bad
/// hour range and
/// [`TimestampParse`](crate::error::PipelineError::TimestampParse) if any
/// observed record carries an unparseable timestamp.
pub fn aggregate(
    records: &[JoinedRecord],
    start_hour: i32,
    end_hour: i32,
    metric: Metric,
) -> Result<Vec<AggregatedMetric>> {
    let window = HourWindow::new(start_hour, end_hour)?;
    aggregate_window(records, window, metric)
}

/// Same as [`aggregate`] with an already validated window.
pub fn aggregate_window(
    records: &[JoinedRecord],
    window: HourWindow,
    metric: Metric,
) -> Result<Vec<AggregatedMetric>> {
    let departures = records
        .iter()
        .filter(|r| !is_unobserved(&r.real_departure))
        .map(Departure::parse)
        .collect::<Result<Vec<_>>>()?;
    let observed = departures.len();

    let mut groups: BTreeMap<GroupKey<'_>, Vec<f64>> = BTreeMap::new();
    for departure in departures
        .iter()
        .filter(|d| window.contains(d.scheduled_hour()))
    {
        let r = departure.record;
        groups
            .entry((r.id.as_str(), r.name.as_str(), r.lat.to_bits(), r.lon.to_bits()))
            .or_default()
            .push(metric.compute_value(departure));
    }

    let aggregated: Vec<AggregatedMetric> = groups
        .into_iter()
        .map(|((id, name, lat, lon), values)| AggregatedMetric {
            id: id.to_string(),
            name: name.to_string(),
            lat: f64::from_bits(lat),
            lon: f64::from_bits(lon),
            value: mean(&values),
            samples: values.len(),
        })
        .collect();

    debug!(
        %metric,
        start = window.start(),
        end = window.end(),
        records = records.len(),
        observed,
        groups = aggregated.len(),
        "Aggregation complete"
    );
    Ok(aggregated)
}
