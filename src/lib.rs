//! lognorm — access-log normaliser.
//!
//! Reads raw access-log lines, normalises them through one of the
//! `lognorm-core` backends and writes one JSON record per line.
//!
//! # Architecture
//!
//! ```text
//! config (file, env, flags) ──► ParserConfig::build ──► Parser
//!                                                         │
//! stdin / files ──► driver::normalize ──► Parser::parse ──┴──► JSON records on stdout
//! ```
//!
//! Parsing is synchronous and the parser is immutable; the driver only adds
//! async line I/O around it.

pub mod driver;

pub use lognorm_core::{
    config, datetime, error, exclude, format, pattern, structured, types, ExclusionRule, Field,
    Line, NormalizedLine, ParseOutcome, Parser, ParserConfig, Record,
};
