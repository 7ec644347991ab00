//! Structured backend: Caddy's JSON access log.
//!
//! <https://caddyserver.com/docs/caddyfile/directives/log>
//!
//! Each line is one JSON object. Keys this backend does not know about are
//! ignored and missing keys take their default, so partial objects such as
//! `{"request":{"uri":"/"}}` still decode.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use serde::Deserialize;

use crate::datetime::TimestampFormat;
use crate::error::{ParseError, TimestampError};
use crate::exclude::{excluded_by, ExclusionRule};
use crate::types::{Line, ParseOutcome};

// ---------------------------------------------------------------------------
// Wire shape
// ---------------------------------------------------------------------------

/// One decoded Caddy access-log entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CaddyLogEntry {
    /// Number or string, depending on Caddy's `time_format`.
    pub ts: serde_json::Value,
    pub request: CaddyRequest,
    /// Seconds.
    pub duration: f64,
    pub size: u64,
    pub status: u16,
    pub resp_headers: CaddyHeaders,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CaddyRequest {
    pub remote_addr: String,
    pub proto: String,
    pub method: String,
    pub host: String,
    pub uri: String,
    pub headers: CaddyHeaders,
}

/// The headers the canonical record reads. Values are in source order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CaddyHeaders {
    #[serde(rename = "User-Agent")]
    pub user_agent: Vec<String>,
    #[serde(rename = "Referer")]
    pub referer: Vec<String>,
    #[serde(rename = "Content-Type")]
    pub content_type: Vec<String>,
    #[serde(rename = "X-Forwarded-For")]
    pub x_forwarded_for: Vec<String>,
    #[serde(rename = "Accept-Language")]
    pub accept_language: Vec<String>,
}

fn first(values: &[String]) -> &str {
    values.first().map_or("", String::as_str)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parser for Caddy JSON access logs.
#[derive(Debug, Clone, Default)]
pub struct CaddyParser {
    timestamp: Arc<TimestampFormat>,
    exclude: Vec<ExclusionRule>,
}

impl CaddyParser {
    pub fn new(timestamp: TimestampFormat, exclude: Vec<ExclusionRule>) -> Self {
        Self {
            timestamp: Arc::new(timestamp),
            exclude,
        }
    }

    pub fn timestamp_format(&self) -> &TimestampFormat {
        &self.timestamp
    }

    /// Decode `line`; malformed JSON is an error, not a skip.
    pub fn parse(&self, line: &str) -> Result<ParseOutcome<StructuredRecord>, ParseError> {
        let entry: CaddyLogEntry = serde_json::from_str(line).map_err(|err| {
            tracing::warn!(error = %err, "failed to decode JSON access-log line");
            ParseError::Json(err)
        })?;

        let record = StructuredRecord {
            entry,
            timestamp: Arc::clone(&self.timestamp),
        };
        if let Some(rule) = excluded_by(&record, &self.exclude) {
            tracing::trace!(field = %rule.field(), pattern = rule.pattern(), "line excluded");
            return Ok(ParseOutcome::Skipped);
        }
        Ok(ParseOutcome::Line(record))
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A decoded entry together with the timestamp format it was read with.
#[derive(Debug, Clone)]
pub struct StructuredRecord {
    entry: CaddyLogEntry,
    timestamp: Arc<TimestampFormat>,
}

impl StructuredRecord {
    pub fn new(entry: CaddyLogEntry, timestamp: Arc<TimestampFormat>) -> Self {
        Self { entry, timestamp }
    }

    pub fn entry(&self) -> &CaddyLogEntry {
        &self.entry
    }

}

// ---------------------------------------------------------------------------
// Request target
// ---------------------------------------------------------------------------

/// A raw `uri` split into scheme, authority-and-path, and query, following
/// Go's `net/url`: any `#fragment` is dropped and the query is everything
/// after the first `?`. Nothing is decoded here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequestTarget<'a> {
    scheme: &'a str,
    rest: &'a str,
    query: &'a str,
}

impl<'a> RequestTarget<'a> {
    /// `None` when the target holds ASCII control bytes.
    fn split(raw: &'a str) -> Option<Self> {
        if raw.bytes().any(|b| b < 0x20 || b == 0x7f) {
            return None;
        }
        let raw = raw.split_once('#').map_or(raw, |(head, _)| head);
        let (scheme, raw) = split_scheme(raw);
        let (rest, query) = raw.split_once('?').unwrap_or((raw, ""));
        Some(Self {
            scheme,
            rest,
            query,
        })
    }

    /// Escaped path of an origin-form (`/p`) or absolute-form
    /// (`https://h/p`) target. Relative targets have none.
    fn request_path(&self) -> Option<&'a str> {
        if self.scheme.is_empty() {
            return self.rest.starts_with('/').then_some(self.rest);
        }
        match self.rest.strip_prefix("//") {
            Some(authority) => Some(authority.find('/').map_or("", |i| &authority[i..])),
            None if self.rest.starts_with('/') => Some(self.rest),
            // Opaque, e.g. `mailto:x`.
            None => Some(""),
        }
    }

    /// Whether the target reads as a URL at all, relative ones included.
    fn is_well_formed(&self) -> bool {
        if self.scheme.is_empty() && !self.rest.starts_with('/') {
            // `a:b/c` would have been a scheme.
            let first_segment = self.rest.split('/').next().unwrap_or_default();
            if first_segment.contains(':') {
                return false;
            }
        }
        valid_escapes(self.rest)
    }
}

fn split_scheme(raw: &str) -> (&str, &str) {
    for (i, b) in raw.bytes().enumerate() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' => {}
            b'0'..=b'9' | b'+' | b'-' | b'.' if i > 0 => {}
            b':' if i > 0 => return (&raw[..i], &raw[i + 1..]),
            _ => return ("", raw),
        }
    }
    ("", raw)
}

/// Every `%` starts a two-digit hex escape.
fn valid_escapes(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        match bytes.get(i + 1..i + 3) {
            Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => i += 3,
            _ => return false,
        }
    }
    true
}

impl Line for StructuredRecord {
    fn host(&self) -> &str {
        &self.entry.request.host
    }

    fn remote_addr(&self) -> &str {
        &self.entry.request.remote_addr
    }

    fn method(&self) -> &str {
        &self.entry.request.method
    }

    fn http(&self) -> &str {
        &self.entry.request.proto
    }

    fn status(&self) -> u16 {
        self.entry.status
    }

    fn size(&self) -> u64 {
        self.entry.size
    }

    fn xff(&self) -> &str {
        first(&self.entry.request.headers.x_forwarded_for)
    }

    fn referrer(&self) -> &str {
        first(&self.entry.request.headers.referer)
    }

    fn user_agent(&self) -> &str {
        first(&self.entry.request.headers.user_agent)
    }

    fn content_type(&self) -> &str {
        first(&self.entry.request.headers.content_type)
    }

    fn language(&self) -> &str {
        first(&self.entry.request.headers.accept_language)
    }

    /// Percent-decoded. Empty for relative targets and bad escapes.
    fn path(&self) -> Cow<'_, str> {
        let uri = self.entry.request.uri.as_str();
        if uri == "*" {
            return Cow::Borrowed(uri);
        }
        match RequestTarget::split(uri).and_then(|target| target.request_path()) {
            Some(path) if valid_escapes(path) => percent_decode_str(path).decode_utf8_lossy(),
            _ => Cow::Borrowed(""),
        }
    }

    /// Raw, still escaped. Relative targets keep their query.
    fn query(&self) -> Cow<'_, str> {
        RequestTarget::split(&self.entry.request.uri)
            .filter(RequestTarget::is_well_formed)
            .map_or(Cow::Borrowed(""), |target| Cow::Borrowed(target.query))
    }

    fn timing(&self) -> Duration {
        // Truncate to whole nanoseconds; NaN and negatives become zero.
        let nanos = (self.entry.duration * 1e9) as i64;
        Duration::from_nanos(nanos.max(0) as u64)
    }

    fn datetime(&self) -> Result<DateTime<Utc>, TimestampError> {
        self.timestamp.decode(&self.entry.ts)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
