//! Backend selection.

use crate::error::ParseError;
use crate::pattern::PatternParser;
use crate::structured::CaddyParser;
use crate::types::{NormalizedLine, ParseOutcome};

/// A configured line parser: one of the two backends.
///
/// Immutable after construction; share it freely between threads.
#[derive(Debug, Clone)]
pub enum Parser {
    Caddy(CaddyParser),
    Pattern(PatternParser),
}

impl Parser {
    /// Parse one raw line (without its trailing newline).
    ///
    /// Only the JSON backend can fail; a free-form line that does not match
    /// its format yields an all-default record.
    pub fn parse(&self, line: &str) -> Result<ParseOutcome, ParseError> {
        match self {
            Parser::Caddy(p) => Ok(p.parse(line)?.map(NormalizedLine::Structured)),
            Parser::Pattern(p) => Ok(p.parse(line).map(NormalizedLine::Pattern)),
        }
    }
}

impl From<CaddyParser> for Parser {
    fn from(p: CaddyParser) -> Self {
        Parser::Caddy(p)
    }
}

impl From<PatternParser> for Parser {
    fn from(p: PatternParser) -> Self {
        Parser::Pattern(p)
    }
}
