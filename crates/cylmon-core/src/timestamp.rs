use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MonitorError, Result};

/// Naive layouts the history service has been seen to emit. Interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Offset-carrying layouts that RFC 3339 parsing rejects (space separator).
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

// ---------------------------------------------------------------------------
// RawTimestamp
// ---------------------------------------------------------------------------

/// A timestamp exactly as the remote service sent it.
///
/// The service documents `ts` as an ISO-8601 string, but anything a browser
/// `Date` would accept shows up in practice, including bare epoch milliseconds.
/// Parsing is deferred until reconciliation so an unparseable value only costs
/// the one sample that carries it. `Other` holds whatever else arrived
/// (`null`, fractional millis, objects) and a missing `ts` decodes to it too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    Text(String),
    Other(serde_json::Value),
}

impl Default for RawTimestamp {
    fn default() -> Self {
        RawTimestamp::Other(serde_json::Value::Null)
    }
}

impl RawTimestamp {
    pub fn to_instant(&self) -> Result<DateTime<Utc>> {
        match self {
            RawTimestamp::Millis(ms) => Utc
                .timestamp_millis_opt(*ms)
                .single()
                .ok_or_else(|| MonitorError::InvalidTimestamp(ms.to_string())),
            RawTimestamp::Text(s) => parse_timestamp(s),
            RawTimestamp::Other(value) => value
                .as_f64()
                .filter(|ms| ms.is_finite())
                .and_then(|ms| Utc.timestamp_millis_opt(ms.trunc() as i64).single())
                .ok_or_else(|| MonitorError::InvalidTimestamp(value.to_string())),
        }
    }
}

impl fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawTimestamp::Millis(ms) => write!(f, "{ms}"),
            RawTimestamp::Text(s) => f.write_str(s),
            RawTimestamp::Other(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for RawTimestamp {
    fn from(s: &str) -> Self {
        RawTimestamp::Text(s.to_string())
    }
}

impl From<String> for RawTimestamp {
    fn from(s: String) -> Self {
        RawTimestamp::Text(s)
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        RawTimestamp::Text(dt.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a textual timestamp into a UTC instant.
///
/// Accepts RFC 3339, RFC 2822, `YYYY-MM-DD[T ]HH:MM[:SS[.fff]]` with or
/// without an offset (naive values are UTC), and a bare `YYYY-MM-DD`
/// (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(MonitorError::InvalidTimestamp(raw.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    Err(MonitorError::InvalidTimestamp(raw.to_string()))
}
