//! Error types for lognorm-core.
//!
//! Construction-time failures ([`FormatError`], [`RuleError`],
//! [`LayoutError`], [`ConfigError`]) mean no parser is produced. Per-line
//! failures ([`ParseError`], [`TimestampError`]) only affect the line at hand.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A layout string was rejected.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout {layout:?} contains an invalid strftime item")]
    InvalidItem { layout: String },
    #[error("layout {layout:?} cannot parse its own output {rendered:?}: {source}")]
    SelfParse {
        layout: String,
        rendered: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// The free-form format string could not be compiled.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unknown format specifier: ${0}")]
    UnknownSpecifier(String),
    #[error("${0} used but the {0} layout is empty")]
    MissingLayout(&'static str),
    #[error("invalid {name} layout: {source}")]
    InvalidLayout {
        name: &'static str,
        #[source]
        source: LayoutError,
    },
    #[error("compiled format is not a valid regular expression: {0}")]
    Regex(#[from] regex::Error),
}

/// An exclusion rule specification could not be turned into a rule.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("exclusion rule {0:?} is not of the form [!]field:[glob:|re:]pattern")]
    Syntax(String),
    #[error("unknown field {0:?} in exclusion rule")]
    UnknownField(String),
    #[error("invalid regular expression in exclusion rule: {0}")]
    Regex(#[from] regex::Error),
}

/// Loading or building a parser configuration failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("invalid format: {0}")]
    Format(#[from] FormatError),
    #[error("invalid exclude rule: {0}")]
    Rule(#[from] RuleError),
    #[error("invalid datetime_format: {0}")]
    DatetimeFormat(#[from] LayoutError),
}

/// A line could not be decoded by the structured backend.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed JSON access-log line: {0}")]
    Json(#[from] serde_json::Error),
}

/// A timestamp could not be normalised.
///
/// Callers that do not care about timestamps can fall back to
/// [`TimestampError::fallback`], the Unix epoch in UTC.
#[derive(Debug, Error)]
pub enum TimestampError {
    #[error("expected a {expected} timestamp, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
    #[error("timestamp {0} is out of range")]
    OutOfRange(String),
    #[error("timestamp {value:?} does not match layout: {source}")]
    Layout {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl TimestampError {
    /// Best-effort instant to use in place of the undecodable timestamp.
    pub fn fallback(&self) -> DateTime<Utc> {
        DateTime::UNIX_EPOCH
    }
}
