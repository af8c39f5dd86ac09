//! Comparison and formatting helpers for JSON field values.
//!
//! These define the comparison semantics every backend follows: numbers
//! compare numerically, date-like strings chronologically, and other strings
//! byte-wise.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

/// Canonical text form of a timestamp: RFC 3339, microseconds, `Z` suffix.
///
/// Canonical timestamps sort lexicographically in chronological order.
pub fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses an RFC 3339 timestamp, a `YYYY-MM-DD HH:MM:SS` timestamp (UTC) or
/// a `YYYY-MM-DD` date (midnight UTC).
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// First instant of `month` and first instant of the following month.
pub fn month_range(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((
        Utc.from_utc_datetime(&start.and_hms_opt(0, 0, 0)?),
        Utc.from_utc_datetime(&end.and_hms_opt(0, 0, 0)?),
    ))
}

/// First instant of `year` and first instant of the following year.
pub fn year_range(year: i32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let (start, _) = month_range(year, 1)?;
    let (_, end) = month_range(year, 12)?;
    Some((start, end))
}

/// Compares two values. `None` when they are not comparable.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => {
            match (parse_datetime(x), parse_datetime(y)) {
                (Some(dx), Some(dy)) => Some(dx.cmp(&dy)),
                _ => Some(x.as_str().cmp(y.as_str())),
            }
        }
        (Value::Number(x), Value::String(y)) => x.as_f64()?.partial_cmp(&y.trim().parse().ok()?),
        (Value::String(x), Value::Number(y)) => {
            x.trim().parse::<f64>().ok()?.partial_cmp(&y.as_f64()?)
        }
        (Value::Bool(x), Value::Number(_)) | (Value::Number(_), Value::Bool(x)) => {
            let as_number = Value::from(u8::from(*x));
            match a {
                Value::Bool(_) => compare(&as_number, b),
                _ => compare(a, &as_number),
            }
        }
        _ => None,
    }
}

/// Equality under [`compare`] semantics. Null equals only null.
pub fn equals(a: &Value, b: &Value) -> bool {
    compare(a, b) == Some(Ordering::Equal) || a == b
}

/// Textual form of a scalar. Booleans render as `1` / `0`.
pub fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

/// Case-insensitive substring match on the textual form of a scalar.
pub fn contains(haystack: &Value, needle: &str) -> bool {
    stringify(haystack)
        .map(|s| s.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

/// Reads a value as a record identifier.
pub fn as_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Total order used for sorting: nulls first, then numbers (booleans count
/// as 0/1), then strings.
pub fn sort_cmp(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) | Value::Number(_) => 1,
            Value::String(_) => 2,
            Value::Array(_) | Value::Object(_) => 3,
        }
    }

    match rank(a).cmp(&rank(b)) {
        Ordering::Equal => match (a, b) {
            (Value::String(x), Value::String(y)) => x.as_str().cmp(y.as_str()),
            _ => compare(a, b).unwrap_or(Ordering::Equal),
        },
        other => other,
    }
}
