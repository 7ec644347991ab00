//! lognorm-core — access-log normalisation.
//!
//! This crate turns raw access-log lines into canonical records. Two backends
//! share one accessor contract ([`Line`]):
//!
//! ```text
//!                 ┌── CaddyParser   (one JSON object per line)
//! raw line ──►  Parser                                         ──► exclusion rules ──► NormalizedLine | Skipped
//!                 └── PatternParser (compiled `$placeholder` format)
//! ```
//!
//! Parsers are built once from a [`config::ParserConfig`] and are immutable
//! afterwards, so a single instance can be shared across threads.

pub mod config;
pub mod datetime;
pub mod error;
pub mod exclude;
pub mod format;
pub mod parser;
pub mod pattern;
pub mod structured;
pub mod types;

pub use config::ParserConfig;
pub use error::{ConfigError, FormatError, LayoutError, ParseError, RuleError, TimestampError};
pub use exclude::{ExclusionRule, RuleKind};
pub use parser::Parser;
pub use pattern::{FieldMap, PatternParser};
pub use structured::{CaddyLogEntry, CaddyParser, StructuredRecord};
pub use types::{Field, Line, NormalizedLine, ParseOutcome, Record};
