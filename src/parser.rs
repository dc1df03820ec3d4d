//! CSV parser for raw ridership records.
//!
//! Every row of the source table describes one vehicle stopping at one stop
//! post. Sensor counts arrive as two independent readings each and are summed
//! here; timestamps are kept verbatim until aggregation.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, Result};

const REAL_DEPARTURE: usize = 2;
const SCHEDULED_DEPARTURE: usize = 3;
const ENTRY: [usize; 2] = [6, 7];
const AFTER_DEPARTURE: [usize; 2] = [8, 9];
const BEFORE_ARRIVAL: [usize; 2] = [10, 11];
const EXIT: [usize; 2] = [12, 13];
const NODE: usize = 14;
const POST: usize = 15;

/// Minimum number of positional fields a row must carry.
pub const MIN_FIELDS: usize = 16;

/// One vehicle-at-stop event, keyed by `"<node>/<post>"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficRecord {
    pub id: String,
    pub scheduled_departure: String,
    pub real_departure: String,
    pub entry_count: u64,
    pub exit_count: u64,
    pub before_arrival_count: u64,
    pub after_departure_count: u64,
}

/// Parses a headed CSV stream into [`TrafficRecord`]s sorted by `id`.
///
/// No row is dropped here, including rows whose real departure holds the
/// "not observed" sentinel.
///
/// # Errors
///
/// Returns [`PipelineError::MalformedRow`] for the first row that is too
/// short, carries an unusable stop identifier, or has a count operand that
/// is not a non-negative integer.
pub fn parse_records<R: Read>(reader: R) -> Result<Vec<TrafficRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        records.push(parse_row(&row)?);
    }

    records.sort_by(|a, b| a.id.cmp(&b.id));
    debug!(count = records.len(), "Traffic records parsed");
    Ok(records)
}

/// Converts a single raw row into a [`TrafficRecord`].
pub fn parse_row(row: &StringRecord) -> Result<TrafficRecord> {
    let line = row.position().map(|p| p.line()).unwrap_or(0);
    let malformed = |reason: String| PipelineError::MalformedRow { line, reason };

    if row.len() < MIN_FIELDS {
        return Err(malformed(format!(
            "expected at least {MIN_FIELDS} fields, found {}",
            row.len()
        )));
    }

    let node = &row[NODE];
    let post = &row[POST];
    let unusable = |part: &str| part.trim().is_empty() || part.contains('/');
    if unusable(node) || unusable(post) {
        return Err(malformed(format!(
            "invalid stop identifier parts '{node}' and '{post}'"
        )));
    }

    let sum = |pair: [usize; 2]| -> Result<u64> {
        let mut total = 0u64;
        for idx in pair {
            let raw = &row[idx];
            let value: u64 = raw
                .trim()
                .parse()
                .map_err(|_| malformed(format!("field {idx} is not a count: '{raw}'")))?;
            total = total
                .checked_add(value)
                .ok_or_else(|| malformed(format!("count pair {pair:?} overflows")))?;
        }
        Ok(total)
    };

    Ok(TrafficRecord {
        id: format!("{node}/{post}"),
        scheduled_departure: row[SCHEDULED_DEPARTURE].to_string(),
        real_departure: row[REAL_DEPARTURE].to_string(),
        entry_count: sum(ENTRY)?,
        exit_count: sum(EXIT)?,
        before_arrival_count: sum(BEFORE_ARRIVAL)?,
        after_departure_count: sum(AFTER_DEPARTURE)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "a,b,real,sch,e,f,in1,in2,ad1,ad2,ba1,ba2,out1,out2,node,post\n";

    fn row(node: &str, post: &str, real: &str, sch: &str, counts: [&str; 8]) -> String {
        format!(
            "x,y,{real},{sch},z,w,{},{},{},{},{},{},{},{},{node},{post}\n",
            counts[0], counts[1], counts[2], counts[3], counts[4], counts[5], counts[6], counts[7]
        )
    }

    #[test]
    fn test_parse_sums_sensor_pairs() {
        let csv = format!(
            "{HEADER}{}",
            row(
                "100",
                "1",
                "1.1.2020 08:00:10",
                "1.1.2020 08:00:00",
                ["2", "3", "6", "7", "4", "5", "1", "0"]
            )
        );
        let records = parse_records(csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.id, "100/1");
        assert_eq!(r.real_departure, "1.1.2020 08:00:10");
        assert_eq!(r.scheduled_departure, "1.1.2020 08:00:00");
        assert_eq!(r.entry_count, 5);
        assert_eq!(r.exit_count, 1);
        assert_eq!(r.before_arrival_count, 9);
        assert_eq!(r.after_departure_count, 13);
    }

    #[test]
    fn test_parse_sorts_by_id_lexicographically() {
        let counts = ["0"; 8];
        let csv = format!(
            "{HEADER}{}{}{}",
            row("2", "1", "1.1.2020 08:00:00", "1.1.2020 08:00:00", counts),
            row("10", "1", "1.1.2020 08:00:00", "1.1.2020 08:00:00", counts),
            row("1", "2", "1.1.2020 08:00:00", "1.1.2020 08:00:00", counts),
        );
        let records = parse_records(csv.as_bytes()).unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();

        assert_eq!(ids, vec!["1/2", "10/1", "2/1"]);
    }

    #[test]
    fn test_parse_keeps_sentinel_rows() {
        let csv = format!(
            "{HEADER}{}",
            row("5", "2", "1.1.1900", "1.1.2020 08:00:00", ["1"; 8])
        );
        let records = parse_records(csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].real_departure, "1.1.1900");
    }

    #[test]
    fn test_parse_rejects_non_integer_count() {
        let csv = format!(
            "{HEADER}{}",
            row(
                "5",
                "2",
                "1.1.2020 08:00:00",
                "1.1.2020 08:00:00",
                ["1", "1", "1", "x", "1", "1", "1", "1"]
            )
        );
        let err = parse_records(csv.as_bytes()).unwrap_err();

        assert!(matches!(err, PipelineError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_negative_count() {
        let csv = format!(
            "{HEADER}{}",
            row(
                "5",
                "2",
                "1.1.2020 08:00:00",
                "1.1.2020 08:00:00",
                ["-1", "1", "1", "1", "1", "1", "1", "1"]
            )
        );
        assert!(matches!(
            parse_records(csv.as_bytes()),
            Err(PipelineError::MalformedRow { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_short_row() {
        let csv = format!("{HEADER}a,b,c\n");
        assert!(matches!(
            parse_records(csv.as_bytes()),
            Err(PipelineError::MalformedRow { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_slash_in_identifier() {
        let csv = format!(
            "{HEADER}{}",
            row("5/1", "2", "1.1.2020 08:00:00", "1.1.2020 08:00:00", ["0"; 8])
        );
        assert!(matches!(
            parse_records(csv.as_bytes()),
            Err(PipelineError::MalformedRow { .. })
        ));
    }

    #[test]
    fn test_parse_sums_counts_beyond_u32() {
        let csv = format!(
            "{HEADER}{}",
            row(
                "5",
                "2",
                "1.1.2020 08:00:00",
                "1.1.2020 08:00:00",
                ["4294967296", "4294967295", "0", "0", "0", "0", "0", "0"]
            )
        );
        let records = parse_records(csv.as_bytes()).unwrap();

        assert_eq!(records[0].entry_count, 8_589_934_591);
    }

    #[test]
    fn test_parse_rejects_overflowing_sum() {
        let max = u64::MAX.to_string();
        let csv = format!(
            "{HEADER}{}",
            row(
                "5",
                "2",
                "1.1.2020 08:00:00",
                "1.1.2020 08:00:00",
                ["0", "0", "0", "0", "0", "0", max.as_str(), "1"]
            )
        );
        assert!(matches!(
            parse_records(csv.as_bytes()),
            Err(PipelineError::MalformedRow { line: 2, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_blank_identifier_part() {
        for (node, post) in [(" ", "1"), ("5", "  "), ("", "1")] {
            let csv = format!(
                "{HEADER}{}",
                row(node, post, "1.1.2020 08:00:00", "1.1.2020 08:00:00", ["0"; 8])
            );
            assert!(matches!(
                parse_records(csv.as_bytes()),
                Err(PipelineError::MalformedRow { .. })
            ));
        }
    }

    #[test]
    fn test_parse_header_only_is_empty() {
        let records = parse_records(HEADER.as_bytes()).unwrap();
        assert!(records.is_empty());
    }
}
