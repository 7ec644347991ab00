//! Timestamp normalisation.
//!
//! Free-form formats and the JSON backend's explicit `datetime_format` both
//! describe textual timestamps with a [`Layout`]: a chrono `strftime` string
//! or one of the named aliases below. The JSON backend additionally decodes
//! numeric epoch timestamps, see [`TimestampFormat`].
//!
//! | alias | meaning |
//! |-------|---------|
//! | `rfc3339`, `rfc3339_nano` | RFC 3339, optional fractional seconds |
//! | `iso8601` | `%Y-%m-%dT%H:%M:%S%.f%z` |
//! | `wall` | `%Y/%m/%d %H:%M:%S` |
//! | `wall_milli` | `%Y/%m/%d %H:%M:%S%.3f` |
//! | `wall_nano` | `%Y/%m/%d %H:%M:%S%.9f` |
//! | `common_log` | `%d/%b/%Y:%H:%M:%S %z` |

use std::fmt::Write as _;

use chrono::format::{Item, ParseErrorKind, StrftimeItems};
use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc,
};
use serde_json::Value;

use crate::error::{LayoutError, TimestampError};

/// The instant reported when a free-form line carries no timestamp capture.
pub fn zero_instant() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// A validated description of a textual timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    Rfc3339,
    Strftime(String),
}

impl Layout {
    /// Resolve aliases and validate `spec`.
    ///
    /// A layout is accepted only if a reference instant rendered through it
    /// parses back through it.
    pub fn new(spec: &str) -> Result<Self, LayoutError> {
        let layout = match spec {
            "rfc3339" | "rfc3339_nano" => Layout::Rfc3339,
            "iso8601" => Layout::Strftime("%Y-%m-%dT%H:%M:%S%.f%z".to_string()),
            "wall" => Layout::Strftime("%Y/%m/%d %H:%M:%S".to_string()),
            "wall_milli" => Layout::Strftime("%Y/%m/%d %H:%M:%S%.3f".to_string()),
            "wall_nano" => Layout::Strftime("%Y/%m/%d %H:%M:%S%.9f".to_string()),
            "common_log" => Layout::Strftime("%d/%b/%Y:%H:%M:%S %z".to_string()),
            other => Layout::Strftime(other.to_string()),
        };
        layout.smoke_test()?;
        Ok(layout)
    }

    fn smoke_test(&self) -> Result<(), LayoutError> {
        let Layout::Strftime(fmt) = self else {
            return Ok(());
        };
        if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
            return Err(LayoutError::InvalidItem { layout: fmt.clone() });
        }
        let mut rendered = String::new();
        write!(rendered, "{}", reference_instant().format(fmt))
            .map_err(|_| LayoutError::InvalidItem { layout: fmt.clone() })?;
        self.parse(&rendered)
            .map(|_| ())
            .map_err(|source| LayoutError::SelfParse {
                layout: fmt.clone(),
                rendered,
                source,
            })
    }

    /// Parse `value` and convert it to UTC.
    ///
    /// Values without an offset are taken to be UTC; a date without a time is
    /// midnight; a time without a date falls on 0000-01-01.
    pub fn parse(&self, value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        let fmt = match self {
            Layout::Rfc3339 => {
                return DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
            }
            Layout::Strftime(fmt) => fmt.as_str(),
        };

        let mut best: Option<chrono::ParseError> = None;
        let mut keep = |err: chrono::ParseError| {
            if best.map_or(true, |b| b.kind() == ParseErrorKind::NotEnough) {
                best = Some(err);
            }
        };

        match DateTime::parse_from_str(value, fmt) {
            Ok(dt) => return Ok(dt.with_timezone(&Utc)),
            Err(err) => keep(err),
        }
        match NaiveDateTime::parse_from_str(value, fmt) {
            Ok(dt) => return Ok(dt.and_utc()),
            Err(err) => keep(err),
        }
        match NaiveDate::parse_from_str(value, fmt) {
            Ok(d) => return Ok(d.and_time(NaiveTime::MIN).and_utc()),
            Err(err) => keep(err),
        }
        match NaiveTime::parse_from_str(value, fmt) {
            Ok(t) => {
                if let Some(d) = NaiveDate::from_ymd_opt(0, 1, 1) {
                    return Ok(d.and_time(t).and_utc());
                }
            }
            Err(err) => keep(err),
        }
        // Every branch above either returned or recorded an error.
        Err(best.unwrap_or_else(|| not_enough_error()))
    }
}

fn reference_instant() -> DateTime<FixedOffset> {
    FixedOffset::west_opt(7 * 3600)
        .and_then(|tz| tz.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).single())
        .map(|dt| dt + TimeDelta::nanoseconds(123_456_789))
        .unwrap_or_else(|| DateTime::UNIX_EPOCH.fixed_offset())
}

fn not_enough_error() -> chrono::ParseError {
    match NaiveTime::parse_from_str("", "%H") {
        Err(err) => err,
        Ok(_) => unreachable!("an empty string never parses as an hour"),
    }
}

// ---------------------------------------------------------------------------
// TimestampFormat
// ---------------------------------------------------------------------------

/// How the JSON backend reads its `ts` value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TimestampFormat {
    /// Floating-point seconds since the epoch.
    #[default]
    UnixSecondsFloat,
    /// Floating-point milliseconds since the epoch.
    UnixMilliFloat,
    /// Divided by 1000 and read as microseconds since the epoch.
    UnixNano,
    /// A string timestamp in the given layout.
    Layout(Layout),
}

impl TimestampFormat {
    /// Resolve a `datetime_format` selector. Anything that is not one of the
    /// numeric selectors is treated as a layout.
    pub fn new(selector: &str) -> Result<Self, LayoutError> {
        Ok(match selector {
            "" | "unix_seconds_float" => TimestampFormat::UnixSecondsFloat,
            "unix_milli_float" => TimestampFormat::UnixMilliFloat,
            "unix_nano" => TimestampFormat::UnixNano,
            layout => TimestampFormat::Layout(Layout::new(layout)?),
        })
    }

    pub fn decode(&self, ts: &Value) -> Result<DateTime<Utc>, TimestampError> {
        match self {
            TimestampFormat::UnixSecondsFloat => from_float_seconds(expect_number(ts)?),
            // Divide before splitting; splitting first rounds differently.
            TimestampFormat::UnixMilliFloat => from_float_seconds(expect_number(ts)? / 1000.0),
            TimestampFormat::UnixNano => {
                let micros = (expect_number(ts)? / 1000.0) as i64;
                DateTime::from_timestamp_micros(micros)
                    .ok_or_else(|| TimestampError::OutOfRange(ts.to_string()))
            }
            TimestampFormat::Layout(layout) => {
                let Value::String(s) = ts else {
                    return Err(TimestampError::UnexpectedType {
                        expected: "string",
                        found: json_type(ts),
                    });
                };
                layout.parse(s).map_err(|source| TimestampError::Layout {
                    value: s.clone(),
                    source,
                })
            }
        }
    }
}

fn expect_number(ts: &Value) -> Result<f64, TimestampError> {
    ts.as_f64().ok_or(TimestampError::UnexpectedType {
        expected: "number",
        found: json_type(ts),
    })
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn from_float_seconds(v: f64) -> Result<DateTime<Utc>, TimestampError> {
    let nanos = (v.fract() * 1e9) as i64;
    TimeDelta::try_seconds(v.trunc() as i64)
        .and_then(|secs| DateTime::UNIX_EPOCH.checked_add_signed(secs))
        .and_then(|t| t.checked_add_signed(TimeDelta::nanoseconds(nanos)))
        .ok_or_else(|| TimestampError::OutOfRange(v.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
