use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::TimestampError;
use crate::types::{FieldValue, Row};

/// Parse a row timestamp into nanoseconds since the epoch.
///
/// Strings are ISO-8601 (with or without an offset; naive times are read as
/// UTC). Numeric epochs are classified by magnitude: values above 1e18 are
/// nanoseconds, above 1e12 milliseconds, anything else seconds.
pub fn parse_timestamp(value: &FieldValue) -> Result<i64, TimestampError> {
    match value {
        FieldValue::Str(s) => parse_iso8601(s),
        FieldValue::Float(v) => Ok(ns_from_numeric(*v)),
        FieldValue::Int(v) => Ok(ns_from_numeric(*v as f64)),
        FieldValue::UInt(v) => Ok(ns_from_numeric(*v as f64)),
        FieldValue::Bool(_) => Err(TimestampError::TypeMismatch("bool".to_string())),
    }
}

fn parse_iso8601(s: &str) -> Result<i64, TimestampError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt
            .timestamp_nanos_opt()
            .ok_or_else(|| TimestampError::Format(s.to_string()));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive
            .and_utc()
            .timestamp_nanos_opt()
            .ok_or_else(|| TimestampError::Format(s.to_string()));
    }
    Err(TimestampError::Format(s.to_string()))
}

fn ns_from_numeric(v: f64) -> i64 {
    if v > 1e18 {
        v as i64
    } else if v > 1e12 {
        (v * 1e6) as i64
    } else {
        (v * 1e9) as i64
    }
}

/// Bucket start for a timestamp: floored toward negative infinity to the
/// nearest multiple of the width, with the epoch as origin. Assignment is a
/// pure function of the timestamp, so buckets are disjoint by construction.
pub fn bucket_start(ts_ns: i64, width: Duration) -> i64 {
    let width_ns = width.as_nanos() as i64;
    ts_ns.div_euclid(width_ns) * width_ns
}

/// Partition rows into time buckets, ascending by timestamp. Rows whose
/// timestamp is missing or unparseable are skipped with a warning; one bad
/// row never fails the batch.
pub fn partition<'a>(rows: &'a [Row], width: Duration) -> BTreeMap<i64, Vec<&'a Row>> {
    let mut stamped: Vec<(i64, &Row)> = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(time) = row.time.as_ref() else {
            tracing::warn!("skipping row with no timestamp");
            continue;
        };
        match parse_timestamp(time) {
            Ok(ts) => stamped.push((ts, row)),
            Err(e) => {
                tracing::warn!(error = %e, "skipping row with bad timestamp");
            }
        }
    }
    stamped.sort_by_key(|(ts, _)| *ts);

    let mut buckets: BTreeMap<i64, Vec<&Row>> = BTreeMap::new();
    for (ts, row) in stamped {
        buckets.entry(bucket_start(ts, width)).or_default().push(row);
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn row_at(time: FieldValue) -> Row {
        Row { time: Some(time), ..Row::default() }
    }

    #[test]
    fn numeric_magnitude_selects_unit() {
        // 2025-03-31T12:00:00Z in three encodings
        let ns = 1_743_441_600_000_000_000_i64;
        assert_eq!(parse_timestamp(&FieldValue::Int(ns)).unwrap(), ns);
        assert_eq!(parse_timestamp(&FieldValue::Int(ns / 1_000_000)).unwrap(), ns);
        assert_eq!(parse_timestamp(&FieldValue::Int(ns / 1_000_000_000)).unwrap(), ns);
        assert_eq!(parse_timestamp(&FieldValue::Float(1_743_441_600.5)).unwrap(), ns + 500_000_000);
    }

    #[test]
    fn iso8601_strings_parse() {
        let ns = 1_743_441_600_000_000_000_i64;
        assert_eq!(
            parse_timestamp(&FieldValue::Str("2025-03-31T12:00:00Z".into())).unwrap(),
            ns
        );
        assert_eq!(
            parse_timestamp(&FieldValue::Str("2025-03-31T12:00:00".into())).unwrap(),
            ns
        );
    }

    #[test]
    fn unsupported_type_and_bad_format_are_distinct() {
        assert!(matches!(
            parse_timestamp(&FieldValue::Bool(true)),
            Err(TimestampError::TypeMismatch(_))
        ));
        assert!(matches!(
            parse_timestamp(&FieldValue::Str("yesterday".into())),
            Err(TimestampError::Format(_))
        ));
    }

    #[test]
    fn bucket_start_floors_to_width() {
        let t0 = 1_743_441_600_000_000_000_i64; // exactly on the hour
        let ten_past = t0 + 600 * 1_000_000_000;
        let next_hour = t0 + 3600 * 1_000_000_000;
        assert_eq!(bucket_start(t0, HOUR), t0);
        assert_eq!(bucket_start(ten_past, HOUR), t0);
        assert_eq!(bucket_start(next_hour, HOUR), next_hour);
    }

    #[test]
    fn rows_fall_into_disjoint_hour_buckets() {
        let t0 = 1_743_441_600_i64; // epoch seconds, on the hour
        let rows = vec![
            row_at(FieldValue::Int(t0 + 600)),  // 00:10
            row_at(FieldValue::Int(t0 + 3900)), // 01:05
            row_at(FieldValue::Int(t0 + 3000)), // 00:50
        ];
        let buckets = partition(&rows, HOUR);
        assert_eq!(buckets.len(), 2);

        let mut iter = buckets.iter();
        let (first, first_rows) = iter.next().unwrap();
        let (second, second_rows) = iter.next().unwrap();
        assert_eq!(*first, t0 * 1_000_000_000);
        assert_eq!(first_rows.len(), 2);
        assert_eq!(*second, (t0 + 3600) * 1_000_000_000);
        assert_eq!(second_rows.len(), 1);
    }

    #[test]
    fn bad_timestamps_are_skipped_not_fatal() {
        let rows = vec![
            row_at(FieldValue::Int(1_743_441_600)),
            row_at(FieldValue::Str("not-a-time".into())),
            Row::default(),
        ];
        let buckets = partition(&rows, HOUR);
        assert_eq!(buckets.values().map(|r| r.len()).sum::<usize>(), 1);
    }
}
