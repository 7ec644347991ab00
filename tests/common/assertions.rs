//! Domain-specific assertion macros for lognorm harnesses.
//!
//! These add context-rich failure messages that make it clear *which* line
//! broke *which* expectation.

use lognorm_core::{NormalizedLine, ParseOutcome, Parser};

// ---------------------------------------------------------------------------
// Outcome helpers
// ---------------------------------------------------------------------------

/// Parse `raw`, panicking if it errors or is skipped.
pub fn parse_line(parser: &Parser, raw: &str) -> NormalizedLine {
    match parser.parse(raw) {
        Ok(ParseOutcome::Line(line)) => line,
        Ok(ParseOutcome::Skipped) => panic!("line was unexpectedly skipped:\n  raw: {raw:?}"),
        Err(err) => panic!("line failed to parse: {err}\n  raw: {raw:?}"),
    }
}

/// Whether `raw` is dropped by an exclusion rule, panicking on parse errors.
pub fn is_skipped(parser: &Parser, raw: &str) -> bool {
    match parser.parse(raw) {
        Ok(outcome) => outcome.is_skipped(),
        Err(err) => panic!("line failed to parse: {err}\n  raw: {raw:?}"),
    }
}

// ---------------------------------------------------------------------------
// Field assertions
// ---------------------------------------------------------------------------

/// Assert that a line exposes `value` for a canonical field.
///
/// ```rust
/// assert_field!(line, Field::Host, "example.com");
/// ```
#[macro_export]
macro_rules! assert_field {
    ($line:expr, $field:expr, $value:expr) => {{
        use lognorm_core::Line as _;
        let line = &$line;
        let field: lognorm_core::Field = $field;
        let expected: &str = $value;
        let actual = line.field_value(field);
        if actual != expected {
            panic!(
                "assert_field! failed:\n  field:    {}\n  expected: {:?}\n  actual:   {:?}",
                field, expected, actual
            );
        }
    }};
}

/// Assert that a parse outcome is a skip.
#[macro_export]
macro_rules! assert_skipped {
    ($parser:expr, $raw:expr) => {{
        let raw: &str = $raw;
        if !$crate::common::is_skipped(&$parser, raw) {
            panic!("assert_skipped! failed: line was kept\n  raw: {:?}", raw);
        }
    }};
}

/// Assert that a parse outcome is kept.
#[macro_export]
macro_rules! assert_kept {
    ($parser:expr, $raw:expr) => {{
        let raw: &str = $raw;
        if $crate::common::is_skipped(&$parser, raw) {
            panic!("assert_kept! failed: line was skipped\n  raw: {:?}", raw);
        }
    }};
}
