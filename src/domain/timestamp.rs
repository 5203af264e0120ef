use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Normalize any of the timestamp shapes the document store hands out into a
/// single UTC instant.
///
/// Accepted shapes:
/// - remote timestamp objects: `{"_seconds": .., "_nanoseconds": ..}` or
///   `{"seconds": .., "nanoseconds": ..}`
/// - numbers: epoch milliseconds
/// - strings: RFC 3339, `YYYY-MM-DD` (UTC midnight), or an offset-less
///   date-time interpreted in `tz`
///
/// Returns `None` for anything else.
pub fn normalize_timestamp<Tz: TimeZone>(value: &Value, tz: &Tz) -> Option<DateTime<Utc>> {
    match value {
        Value::Object(map) => {
            let seconds = map
                .get("_seconds")
                .or_else(|| map.get("seconds"))
                .and_then(as_whole_number)?;
            let nanos = map
                .get("_nanoseconds")
                .or_else(|| map.get("nanoseconds"))
                .and_then(as_whole_number)
                .unwrap_or(0);
            let nanos = u32::try_from(nanos).ok().filter(|n| *n < 1_000_000_000)?;
            DateTime::from_timestamp(seconds, nanos)
        }
        Value::Number(_) => as_whole_number(value).and_then(DateTime::from_timestamp_millis),
        Value::String(s) => parse_timestamp_str(s, tz),
        _ => None,
    }
}

/// Parse a textual timestamp. Date-only strings are UTC midnight; date-times
/// without an offset are local to `tz`.
pub fn parse_timestamp_str<Tz: TimeZone>(input: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .and_then(|naive| resolve_local(tz, naive))
}

/// Resolve a wall-clock time in `tz`. Ambiguous times take the earlier
/// instant; times inside a DST gap are pushed forward by an hour.
pub fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => tz
            .from_local_datetime(&(naive + chrono::Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

/// Integers, or floats with no fractional part.
pub(crate) fn as_whole_number(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use serde_json::json;

    use super::*;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 1800).unwrap()
    }

    #[test]
    fn test_remote_timestamp_object() {
        let value = json!({"_seconds": 1_704_067_200, "_nanoseconds": 500_000_000});
        let ts = normalize_timestamp(&value, &Utc).unwrap();
        assert_eq!(ts.timestamp_millis(), 1_704_067_200_500);

        let value = json!({"seconds": 1_704_067_200, "nanoseconds": 0});
        let ts = normalize_timestamp(&value, &Utc).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_epoch_millis() {
        let ts = normalize_timestamp(&json!(1_704_067_200_000i64), &Utc).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-01T00:00:00+00:00");

        let ts = normalize_timestamp(&json!(1_704_067_200_000.0), &Utc).unwrap();
        assert_eq!(ts.timestamp_millis(), 1_704_067_200_000);
    }

    #[test]
    fn test_rfc3339_string() {
        let ts = normalize_timestamp(&json!("2024-03-10T12:30:00+05:30"), &Utc).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-10T07:00:00+00:00");
    }

    #[test]
    fn test_date_only_string_is_utc_midnight() {
        let ts = normalize_timestamp(&json!("2024-03-10"), &ist()).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-10T00:00:00+00:00");
    }

    #[test]
    fn test_naive_string_uses_local_zone() {
        let ts = normalize_timestamp(&json!("2024-03-10T12:30:00"), &ist()).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-10T07:00:00+00:00");

        let ts = normalize_timestamp(&json!("2024-03-10 05:30"), &ist()).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-10T00:00:00+00:00");
    }

    #[test]
    fn test_unusable_values() {
        for value in [
            json!(null),
            json!(true),
            json!(""),
            json!("yesterday"),
            json!([]),
            json!({"foo": 1}),
            json!({"_seconds": "abc"}),
            json!(12.5),
        ] {
            assert!(normalize_timestamp(&value, &Utc).is_none(), "{value}");
        }
    }
}
