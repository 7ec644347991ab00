//! Exclusion rules.
//!
//! A rule targets one canonical [`Field`] and matches its value by substring,
//! glob or regular expression, optionally negated. A line is dropped when any
//! rule matches.
//!
//! Rules are written `[!]field:[glob:|re:]pattern`:
//!
//! ```text
//! path:/healthz              substring
//! host:glob:**.example.com   glob, `*` does not cross `/`, `{a,b}` alternation
//! user_agent:re:(?i)bot      unanchored regex
//! !method:GET                negated
//! static                     path:glob:**/*.{png,jpg,...}
//! redirect                   status:glob:3*
//! ```

use std::str::FromStr;

use globset::{GlobBuilder, GlobMatcher};
use regex::Regex;

use crate::error::RuleError;
use crate::types::{Field, Line};

const STATIC_GLOB: &str =
    "**/*.{png,jpg,jpeg,gif,webp,avif,svg,ico,css,js,mjs,map,woff,woff2,ttf,otf,eot}";
const REDIRECT_GLOB: &str = "3*";

/// How a rule compares its pattern against a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleKind {
    #[default]
    Substring,
    Glob,
    Regex,
}

#[derive(Debug, Clone)]
enum Matcher {
    Substring,
    // `None` when the glob failed to compile; such a rule never matches.
    Glob(Option<GlobMatcher>),
    Regex(Regex),
}

/// A compiled exclusion rule. Immutable once built.
#[derive(Debug, Clone)]
pub struct ExclusionRule {
    field: Field,
    kind: RuleKind,
    pattern: String,
    negate: bool,
    matcher: Matcher,
}

impl ExclusionRule {
    /// Build a rule, compiling its pattern.
    ///
    /// An invalid regular expression is an error; an invalid glob yields a
    /// rule that never matches.
    pub fn new(
        field: Field,
        kind: RuleKind,
        pattern: impl Into<String>,
        negate: bool,
    ) -> Result<Self, RuleError> {
        let pattern = pattern.into();
        let matcher = match kind {
            RuleKind::Substring => Matcher::Substring,
            RuleKind::Glob => Matcher::Glob(compile_glob(&pattern)),
            RuleKind::Regex => Matcher::Regex(Regex::new(&pattern)?),
        };
        Ok(Self {
            field,
            kind,
            pattern,
            negate,
            matcher,
        })
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn negate(&self) -> bool {
        self.negate
    }

    /// Whether `value` satisfies this rule, after negation.
    pub fn matches(&self, value: &str) -> bool {
        let m = match &self.matcher {
            Matcher::Substring => value.contains(self.pattern.as_str()),
            Matcher::Glob(glob) => glob.as_ref().is_some_and(|g| g.is_match(value)),
            Matcher::Regex(re) => re.is_match(value),
        };
        m != self.negate
    }
}

fn compile_glob(pattern: &str) -> Option<GlobMatcher> {
    match GlobBuilder::new(pattern).literal_separator(true).build() {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(err) => {
            tracing::debug!(pattern, error = %err, "invalid glob in exclusion rule; it will never match");
            None
        }
    }
}

impl FromStr for ExclusionRule {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negate, body) = match s.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        match body {
            "static" => {
                return ExclusionRule::new(Field::Path, RuleKind::Glob, STATIC_GLOB, negate)
            }
            "redirect" => {
                return ExclusionRule::new(Field::Status, RuleKind::Glob, REDIRECT_GLOB, negate)
            }
            _ => {}
        }

        let (field, rest) = body
            .split_once(':')
            .ok_or_else(|| RuleError::Syntax(s.to_string()))?;
        let field: Field = field.parse()?;
        let (kind, pattern) = if let Some(p) = rest.strip_prefix("glob:") {
            (RuleKind::Glob, p)
        } else if let Some(p) = rest.strip_prefix("re:") {
            (RuleKind::Regex, p)
        } else {
            (RuleKind::Substring, rest)
        };
        ExclusionRule::new(field, kind, pattern, negate)
    }
}

/// The first rule that drops `line`, if any.
pub fn excluded_by<'r, L: Line + ?Sized>(
    line: &L,
    rules: &'r [ExclusionRule],
) -> Option<&'r ExclusionRule> {
    rules
        .iter()
        .find(|rule| rule.matches(&line.field_value(rule.field)))
}

/// Parse a list of rule specifications, stopping at the first invalid one.
pub fn parse_rules<S: AsRef<str>>(specs: &[S]) -> Result<Vec<ExclusionRule>, RuleError> {
    specs.iter().map(|s| s.as_ref().parse()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
