//! Epoch-second arrays to calendar timestamps.

use chrono::{DateTime, TimeZone, Utc};

use crate::error::FeedError;

/// Convert epoch seconds to UTC timestamps, 1:1 and in input order.
pub fn normalize_timestamps(unix_seconds: &[i64]) -> Result<Vec<DateTime<Utc>>, FeedError> {
    normalize_timestamps_in(unix_seconds, &Utc)
}

/// Same as [`normalize_timestamps`], rendered in `tz`.
pub fn normalize_timestamps_in<Tz: TimeZone>(
    unix_seconds: &[i64],
    tz: &Tz,
) -> Result<Vec<DateTime<Tz>>, FeedError> {
    unix_seconds
        .iter()
        .map(|&secs| {
            DateTime::from_timestamp(secs, 0)
                .map(|dt| dt.with_timezone(tz))
                .ok_or_else(|| FeedError::Malformed(format!("timestamp {secs} is out of range")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn preserves_order_and_length() {
        let input = [1672532100, 1672531200, 1672533000];
        let out = normalize_timestamps(&input).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].to_rfc3339(), "2023-01-01T00:15:00+00:00");
        assert_eq!(out[1].to_rfc3339(), "2023-01-01T00:00:00+00:00");
        assert_eq!(out[2].to_rfc3339(), "2023-01-01T00:30:00+00:00");
    }

    #[test]
    fn renders_in_requested_zone() {
        let cet = FixedOffset::east_opt(3600).unwrap();
        let out = normalize_timestamps_in(&[1672531200], &cet).unwrap();
        assert_eq!(out[0].to_rfc3339(), "2023-01-01T01:00:00+01:00");
    }

    #[test]
    fn out_of_range_is_malformed() {
        let err = normalize_timestamps(&[i64::MAX]).unwrap_err();
        assert!(matches!(err, FeedError::Malformed(_)));
    }
}
