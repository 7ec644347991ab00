//! Core types for lognorm-core.
//!
//! This module defines the canonical [`Field`] catalog, the [`Line`] accessor
//! contract shared by both backends, the [`NormalizedLine`] variant that
//! carries either backend's record, and the serialisable [`Record`] snapshot.

use std::borrow::Cow;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{RuleError, TimestampError};
use crate::pattern::FieldMap;
use crate::structured::StructuredRecord;

// ---------------------------------------------------------------------------
// Field catalog
// ---------------------------------------------------------------------------

/// A canonical field that both backends expose and exclusion rules target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Host,
    RemoteAddr,
    Method,
    Http,
    Path,
    Query,
    Referrer,
    UserAgent,
    ContentType,
    Status,
    Size,
    Xff,
    AcceptLanguage,
}

static FIELDS: phf::Map<&'static str, Field> = phf::phf_map! {
    "host" => Field::Host,
    "remote_addr" => Field::RemoteAddr,
    "method" => Field::Method,
    "http" => Field::Http,
    "path" => Field::Path,
    "query" => Field::Query,
    "referrer" => Field::Referrer,
    "user_agent" => Field::UserAgent,
    "content_type" => Field::ContentType,
    "status" => Field::Status,
    "size" => Field::Size,
    "xff" => Field::Xff,
    "accept_language" => Field::AcceptLanguage,
};

impl Field {
    pub const ALL: [Field; 13] = [
        Field::Host,
        Field::RemoteAddr,
        Field::Method,
        Field::Http,
        Field::Path,
        Field::Query,
        Field::Referrer,
        Field::UserAgent,
        Field::ContentType,
        Field::Status,
        Field::Size,
        Field::Xff,
        Field::AcceptLanguage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Host => "host",
            Field::RemoteAddr => "remote_addr",
            Field::Method => "method",
            Field::Http => "http",
            Field::Path => "path",
            Field::Query => "query",
            Field::Referrer => "referrer",
            Field::UserAgent => "user_agent",
            Field::ContentType => "content_type",
            Field::Status => "status",
            Field::Size => "size",
            Field::Xff => "xff",
            Field::AcceptLanguage => "accept_language",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FIELDS
            .get(s)
            .copied()
            .ok_or_else(|| RuleError::UnknownField(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Accessor contract
// ---------------------------------------------------------------------------

/// Canonical view over one parsed access-log line.
///
/// Every accessor has a defined default: string fields read as `""`, numbers
/// as `0`, timing as a zero duration.
pub trait Line {
    fn host(&self) -> &str;
    fn remote_addr(&self) -> &str;
    fn xff(&self) -> &str;
    fn method(&self) -> &str;
    fn http(&self) -> &str;
    fn path(&self) -> Cow<'_, str>;
    fn query(&self) -> Cow<'_, str>;
    fn referrer(&self) -> &str;
    fn user_agent(&self) -> &str;
    fn content_type(&self) -> &str;
    fn language(&self) -> &str;
    fn status(&self) -> u16;
    fn size(&self) -> u64;
    fn timing(&self) -> Duration;

    /// The request timestamp, normalised to UTC.
    fn datetime(&self) -> Result<DateTime<Utc>, TimestampError>;

    /// [`Line::datetime`], substituting the error's fallback instant.
    fn datetime_lossy(&self) -> DateTime<Utc> {
        self.datetime().unwrap_or_else(|err| err.fallback())
    }

    /// String value of a canonical field, as seen by exclusion rules.
    fn field_value(&self, field: Field) -> Cow<'_, str> {
        match field {
            Field::Host => Cow::Borrowed(self.host()),
            Field::RemoteAddr => Cow::Borrowed(self.remote_addr()),
            Field::Method => Cow::Borrowed(self.method()),
            Field::Http => Cow::Borrowed(self.http()),
            Field::Path => self.path(),
            Field::Query => self.query(),
            Field::Referrer => Cow::Borrowed(self.referrer()),
            Field::UserAgent => Cow::Borrowed(self.user_agent()),
            Field::ContentType => Cow::Borrowed(self.content_type()),
            Field::Status => Cow::Owned(self.status().to_string()),
            Field::Size => Cow::Owned(self.size().to_string()),
            Field::Xff => Cow::Borrowed(self.xff()),
            Field::AcceptLanguage => Cow::Borrowed(self.language()),
        }
    }
}

// ---------------------------------------------------------------------------
// NormalizedLine
// ---------------------------------------------------------------------------

/// A parsed line from either backend.
#[derive(Debug, Clone)]
pub enum NormalizedLine {
    Structured(StructuredRecord),
    Pattern(FieldMap),
}

macro_rules! delegate {
    ($self:ident, $l:ident => $e:expr) => {
        match $self {
            NormalizedLine::Structured($l) => $e,
            NormalizedLine::Pattern($l) => $e,
        }
    };
}

impl Line for NormalizedLine {
    fn host(&self) -> &str {
        delegate!(self, l => l.host())
    }

    fn remote_addr(&self) -> &str {
        delegate!(self, l => l.remote_addr())
    }

    fn xff(&self) -> &str {
        delegate!(self, l => l.xff())
    }

    fn method(&self) -> &str {
        delegate!(self, l => l.method())
    }

    fn http(&self) -> &str {
        delegate!(self, l => l.http())
    }

    fn path(&self) -> Cow<'_, str> {
        delegate!(self, l => l.path())
    }

    fn query(&self) -> Cow<'_, str> {
        delegate!(self, l => l.query())
    }

    fn referrer(&self) -> &str {
        delegate!(self, l => l.referrer())
    }

    fn user_agent(&self) -> &str {
        delegate!(self, l => l.user_agent())
    }

    fn content_type(&self) -> &str {
        delegate!(self, l => l.content_type())
    }

    fn language(&self) -> &str {
        delegate!(self, l => l.language())
    }

    fn status(&self) -> u16 {
        delegate!(self, l => l.status())
    }

    fn size(&self) -> u64 {
        delegate!(self, l => l.size())
    }

    fn timing(&self) -> Duration {
        delegate!(self, l => l.timing())
    }

    fn datetime(&self) -> Result<DateTime<Utc>, TimestampError> {
        delegate!(self, l => l.datetime())
    }
}

/// Result of parsing one line: a record, or a signal that an exclusion rule
/// dropped it.
#[derive(Debug, Clone)]
pub enum ParseOutcome<T = NormalizedLine> {
    Line(T),
    Skipped,
}

impl<T> ParseOutcome<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, ParseOutcome::Skipped)
    }

    pub fn into_line(self) -> Option<T> {
        match self {
            ParseOutcome::Line(line) => Some(line),
            ParseOutcome::Skipped => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ParseOutcome<U> {
        match self {
            ParseOutcome::Line(line) => ParseOutcome::Line(f(line)),
            ParseOutcome::Skipped => ParseOutcome::Skipped,
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// An owned, serialisable snapshot of every canonical accessor.
///
/// Undecodable timestamps are replaced with their fallback instant; use
/// [`Line::datetime`] directly when the error matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub datetime: DateTime<Utc>,
    pub host: String,
    pub remote_addr: String,
    pub xff: String,
    pub method: String,
    pub http: String,
    pub path: String,
    pub query: String,
    pub status: u16,
    pub size: u64,
    pub timing_micros: u64,
    pub referrer: String,
    pub user_agent: String,
    pub content_type: String,
    pub accept_language: String,
}

impl Record {
    pub fn from_line<L: Line + ?Sized>(line: &L) -> Self {
        Self {
            datetime: line.datetime_lossy(),
            host: line.host().to_string(),
            remote_addr: line.remote_addr().to_string(),
            xff: line.xff().to_string(),
            method: line.method().to_string(),
            http: line.http().to_string(),
            path: line.path().into_owned(),
            query: line.query().into_owned(),
            status: line.status(),
            size: line.size(),
            timing_micros: u64::try_from(line.timing().as_micros()).unwrap_or(u64::MAX),
            referrer: line.referrer().to_string(),
            user_agent: line.user_agent().to_string(),
            content_type: line.content_type().to_string(),
            accept_language: line.language().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_round_trip_through_the_catalog() {
        for field in Field::ALL {
            assert_eq!(field.as_str().parse::<Field>().unwrap(), field);
        }
    }

    #[test]
    fn unknown_field_name_is_rejected() {
        let err = "timing".parse::<Field>().unwrap_err();
        assert!(matches!(err, RuleError::UnknownField(name) if name == "timing"));
    }

    #[test]
    fn outcome_map_keeps_skips() {
        let skipped: ParseOutcome<u8> = ParseOutcome::Skipped;
        assert!(skipped.map(|n| n + 1).is_skipped());
        assert_eq!(ParseOutcome::Line(1u8).map(|n| n + 1).into_line(), Some(2));
    }
}
