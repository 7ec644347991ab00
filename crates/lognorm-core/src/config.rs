//! Parser configuration.
//!
//! [`ParserConfig::load`] layers an optional TOML file and `LOGNORM_*`
//! environment variables over the embedded defaults, then applies explicit
//! overrides (command-line flags). [`ParserConfig::defaults`] returns the
//! embedded defaults without touching the filesystem (useful in tests).
//! [`ParserConfig::build`] compiles a configuration into a [`Parser`].

use std::path::Path;

use serde::Deserialize;

use crate::datetime::TimestampFormat;
use crate::error::ConfigError;
use crate::exclude::parse_rules;
use crate::format::{resolve_preset, LayoutSpecs};
use crate::parser::Parser;
use crate::pattern::PatternParser;
use crate::structured::CaddyParser;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
# "caddy" selects the JSON backend; anything else is a line format or preset.
format          = "combined"
datetime_format = ""
date            = ""
time            = ""
datetime        = ""
exclude         = []
"#;

/// The `format` value that selects the JSON backend.
pub const CADDY: &str = "caddy";

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// How to parse lines, and which ones to drop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParserConfig {
    #[serde(default = "default_format")]
    pub format: String,
    /// `ts` decoding for the JSON backend.
    #[serde(default)]
    pub datetime_format: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub datetime: String,
    /// Exclusion rules, `[!]field:[glob:|re:]pattern`.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_format() -> String {
    "combined".to_string()
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Values that take precedence over every other source.
///
/// `exclude` entries are appended to the configured rules rather than
/// replacing them.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub format: Option<String>,
    pub datetime_format: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub datetime: Option<String>,
    pub exclude: Vec<String>,
}

impl ParserConfig {
    /// Load the embedded defaults, then `path` (if given, it must exist),
    /// then `LOGNORM_*` environment variables, then `overrides`.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml));
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let mut cfg: ParserConfig = builder
            .add_source(config::Environment::with_prefix("LOGNORM"))
            .set_override_option("format", overrides.format.clone())?
            .set_override_option("datetime_format", overrides.datetime_format.clone())?
            .set_override_option("date", overrides.date.clone())?
            .set_override_option("time", overrides.time.clone())?
            .set_override_option("datetime", overrides.datetime.clone())?
            .build()?
            .try_deserialize()?;
        cfg.exclude.extend(overrides.exclude.iter().cloned());
        Ok(cfg)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    /// Validate the configuration and compile it into a parser.
    pub fn build(&self) -> Result<Parser, ConfigError> {
        let exclude = parse_rules(&self.exclude)?;

        if self.format == CADDY {
            let timestamp = TimestampFormat::new(&self.datetime_format)?;
            tracing::debug!(?timestamp, rules = exclude.len(), "built JSON access-log parser");
            return Ok(CaddyParser::new(timestamp, exclude).into());
        }

        let (format, layouts) = resolve_preset(
            &self.format,
            LayoutSpecs {
                date: self.date.clone(),
                time: self.time.clone(),
                datetime: self.datetime.clone(),
            },
        );
        let parser = PatternParser::new(&format, &layouts, exclude)?;
        tracing::debug!(format = %format, "built free-form parser");
        Ok(parser.into())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
