//! Free-form backend: lines matched against a compiled format.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::datetime::zero_instant;
use crate::error::{FormatError, TimestampError};
use crate::exclude::{excluded_by, ExclusionRule};
use crate::format::{compile, DateLayouts, LayoutSpecs, Placeholder};
use crate::types::{Field, Line, ParseOutcome};

/// Parser for user-defined line formats.
#[derive(Debug, Clone)]
pub struct PatternParser {
    regex: Regex,
    captures: Vec<Placeholder>,
    layouts: Arc<DateLayouts>,
    exclude: Vec<ExclusionRule>,
}

impl PatternParser {
    /// Compile `format` (already preset-resolved) with its layouts.
    pub fn new(
        format: &str,
        layouts: &LayoutSpecs,
        exclude: Vec<ExclusionRule>,
    ) -> Result<Self, FormatError> {
        let compiled = compile(format, layouts)?;
        tracing::debug!(pattern = compiled.regex.as_str(), "compiled line format");
        Ok(Self {
            regex: compiled.regex,
            captures: compiled.captures,
            layouts: Arc::new(compiled.layouts),
            exclude,
        })
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Capturing placeholders in group order.
    pub fn captures(&self) -> &[Placeholder] {
        &self.captures
    }

    /// Extract fields from `line`.
    ///
    /// A line that does not match the format is not an error: it produces a
    /// [`FieldMap`] with every field at its default.
    pub fn parse(&self, line: &str) -> ParseOutcome<FieldMap> {
        let mut values = HashMap::with_capacity(self.captures.len());
        match self.regex.captures(line) {
            Some(caps) => {
                for &placeholder in &self.captures {
                    if let Some(m) = caps.name(placeholder.name()) {
                        // `-` is the common-log spelling of "no value".
                        let v = match m.as_str() {
                            "-" => "",
                            v => v,
                        };
                        values.insert(placeholder, v.to_string());
                    }
                }
            }
            None => tracing::trace!(line, "line does not match format"),
        }

        let map = FieldMap {
            values,
            layouts: Arc::clone(&self.layouts),
        };
        if let Some(rule) = excluded_by(&map, &self.exclude) {
            tracing::trace!(field = %rule.field(), pattern = rule.pattern(), "line excluded");
            return ParseOutcome::Skipped;
        }
        ParseOutcome::Line(map)
    }
}

/// Captured values of one free-form line.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    values: HashMap<Placeholder, String>,
    layouts: Arc<DateLayouts>,
}

impl FieldMap {
    pub fn new(values: HashMap<Placeholder, String>, layouts: Arc<DateLayouts>) -> Self {
        Self { values, layouts }
    }

    pub fn get(&self, placeholder: Placeholder) -> Option<&str> {
        self.values.get(&placeholder).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn str(&self, placeholder: Placeholder) -> &str {
        self.get(placeholder).unwrap_or("")
    }
}

fn digits<T: std::str::FromStr + Default>(s: &str) -> T {
    s.parse().unwrap_or_default()
}

impl Line for FieldMap {
    fn host(&self) -> &str {
        self.str(Placeholder::Host)
    }

    fn remote_addr(&self) -> &str {
        self.str(Placeholder::RemoteAddr)
    }

    fn xff(&self) -> &str {
        self.str(Placeholder::Xff)
    }

    fn method(&self) -> &str {
        self.str(Placeholder::Method)
    }

    fn http(&self) -> &str {
        self.str(Placeholder::Http)
    }

    fn path(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.str(Placeholder::Path))
    }

    fn query(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.str(Placeholder::Query))
    }

    fn referrer(&self) -> &str {
        self.str(Placeholder::Referrer)
    }

    fn user_agent(&self) -> &str {
        self.str(Placeholder::UserAgent)
    }

    fn content_type(&self) -> &str {
        self.str(Placeholder::ContentType)
    }

    // Formats have no placeholder for it.
    fn language(&self) -> &str {
        ""
    }

    fn status(&self) -> u16 {
        digits(self.str(Placeholder::Status))
    }

    fn size(&self) -> u64 {
        digits(self.str(Placeholder::Size))
    }

    fn timing(&self) -> Duration {
        if let Some(s) = self.get(Placeholder::TimingSec) {
            return s
                .parse::<f64>()
                .ok()
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .unwrap_or_default();
        }
        if let Some(s) = self.get(Placeholder::TimingMilli) {
            return Duration::from_millis(digits(s));
        }
        if let Some(s) = self.get(Placeholder::TimingMicro) {
            return Duration::from_micros(digits(s));
        }
        Duration::ZERO
    }

    /// First present of `$date`, `$time`, `$datetime`, parsed with its
    /// layout; the zero instant if none was captured.
    fn datetime(&self) -> Result<DateTime<Utc>, TimestampError> {
        let candidates = [
            (Placeholder::Date, &self.layouts.date),
            (Placeholder::Time, &self.layouts.time),
            (Placeholder::Datetime, &self.layouts.datetime),
        ];
        for (placeholder, layout) in candidates {
            if let (Some(value), Some(layout)) = (self.get(placeholder), layout) {
                return layout.parse(value).map_err(|source| TimestampError::Layout {
                    value: value.to_string(),
                    source,
                });
            }
        }
        Ok(zero_instant())
    }

    // Rules see the captured text, not the parsed number.
    fn field_value(&self, field: Field) -> Cow<'_, str> {
        Cow::Borrowed(Placeholder::for_field(field).map_or("", |p| self.str(p)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
