//! Date-window filter
//!
//! Both bounds are inclusive: a record is kept iff `start <= t` and, when an
//! end is configured, `t <= end`.

use crate::error::{Error, Result};
use crate::types::lookup;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Whether `timestamp` lies inside `[start, end]` (`end` open when `None`)
pub fn in_window(timestamp: DateTime<Utc>, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> bool {
    timestamp >= start && end.map_or(true, |end| timestamp <= end)
}

/// Parse an ISO-8601 timestamp into UTC.
///
/// Accepts RFC 3339 with any offset, plus naive date-times and bare dates,
/// which are taken as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(ndt.and_utc());
        }
    }

    if let Ok(nd) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(ndt) = nd.and_hms_opt(0, 0, 0) {
            return Ok(ndt.and_utc());
        }
    }

    Err(Error::timestamp(value, "expected an ISO-8601 date or date-time"))
}

/// Configured `[start, end]` window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
}

impl DateWindow {
    /// Create a window; `end` before `start` is a configuration error
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Result<Self> {
        if let Some(end) = end {
            if end < start {
                return Err(Error::invalid_value(
                    "end_date",
                    format!("{end} is before start_date {start}"),
                ));
            }
        }
        Ok(Self { start, end })
    }

    /// Window with no upper bound
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    /// Lower bound
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Upper bound, if any
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// Whether a timestamp falls inside the window
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        in_window(timestamp, self.start, self.end)
    }

    /// Check the timestamp stored at `field` in a record.
    ///
    /// A missing, non-string or unparseable timestamp is an error.
    pub fn check(&self, record: &Value, field: &str) -> Result<bool> {
        let raw = lookup(record, field)
            .ok_or_else(|| Error::timestamp("", format!("record has no '{field}' field")))?;
        let raw = raw
            .as_str()
            .ok_or_else(|| Error::timestamp(raw.to_string(), format!("'{field}' is not a string")))?;
        Ok(self.contains(parse_timestamp(raw)?))
    }
}
