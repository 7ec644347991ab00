//! Free-form format compiler.
//!
//! A format is literal text with `$placeholder`s, e.g.
//!
//! ```text
//! $remote_addr - $ignore [$datetime] "$method $path $http" $status $size
//! ```
//!
//! Literal text matches itself; each placeholder becomes a named capture
//! group built from [`Placeholder::fragment`]. The whole pattern is anchored
//! to the full line.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::datetime::Layout;
use crate::error::FormatError;
use crate::types::Field;

// ---------------------------------------------------------------------------
// Placeholder table
// ---------------------------------------------------------------------------

/// Every `$name` the format language understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Ignore,
    Host,
    RemoteAddr,
    Xff,
    Method,
    Status,
    Http,
    Path,
    TimingSec,
    TimingMilli,
    TimingMicro,
    Size,
    Referrer,
    UserAgent,
    Query,
    ContentType,
    Date,
    Time,
    Datetime,
}

static PLACEHOLDERS: phf::Map<&'static str, Placeholder> = phf::phf_map! {
    "ignore" => Placeholder::Ignore,
    "host" => Placeholder::Host,
    "remote_addr" => Placeholder::RemoteAddr,
    "xff" => Placeholder::Xff,
    "method" => Placeholder::Method,
    "status" => Placeholder::Status,
    "http" => Placeholder::Http,
    "path" => Placeholder::Path,
    "timing_sec" => Placeholder::TimingSec,
    "timing_milli" => Placeholder::TimingMilli,
    "timing_micro" => Placeholder::TimingMicro,
    "size" => Placeholder::Size,
    "referrer" => Placeholder::Referrer,
    "user_agent" => Placeholder::UserAgent,
    "query" => Placeholder::Query,
    "content_type" => Placeholder::ContentType,
    "date" => Placeholder::Date,
    "time" => Placeholder::Time,
    "datetime" => Placeholder::Datetime,
};

impl Placeholder {
    pub fn lookup(name: &str) -> Option<Self> {
        PLACEHOLDERS.get(name).copied()
    }

    /// Capture-group name; also the `$name` used in formats.
    pub fn name(self) -> &'static str {
        match self {
            Placeholder::Ignore => "ignore",
            Placeholder::Host => "host",
            Placeholder::RemoteAddr => "remote_addr",
            Placeholder::Xff => "xff",
            Placeholder::Method => "method",
            Placeholder::Status => "status",
            Placeholder::Http => "http",
            Placeholder::Path => "path",
            Placeholder::TimingSec => "timing_sec",
            Placeholder::TimingMilli => "timing_milli",
            Placeholder::TimingMicro => "timing_micro",
            Placeholder::Size => "size",
            Placeholder::Referrer => "referrer",
            Placeholder::UserAgent => "user_agent",
            Placeholder::Query => "query",
            Placeholder::ContentType => "content_type",
            Placeholder::Date => "date",
            Placeholder::Time => "time",
            Placeholder::Datetime => "datetime",
        }
    }

    pub fn fragment(self) -> &'static str {
        match self {
            Placeholder::Ignore => ".*?",
            Placeholder::Host => r"(?:xn--)?[a-zA-Z0-9.-]+",
            Placeholder::RemoteAddr => r"[0-9a-fA-F:.]+",
            Placeholder::Xff => r"[0-9a-fA-F:. ,]+",
            Placeholder::Method => r"[A-Z]{3,10}",
            Placeholder::Status => r"\d{3}",
            Placeholder::Http => r"HTTP/[\d.]+",
            Placeholder::Path => r"/.*?",
            Placeholder::TimingSec => r"[\d.]+",
            Placeholder::TimingMilli | Placeholder::TimingMicro => r"\d+",
            Placeholder::Size => r"(?:\d+|-)",
            Placeholder::Referrer | Placeholder::UserAgent => ".*?",
            Placeholder::Query
            | Placeholder::ContentType
            | Placeholder::Date
            | Placeholder::Time
            | Placeholder::Datetime => ".+?",
        }
    }

    /// The canonical field this placeholder fills, if any.
    pub fn field(self) -> Option<Field> {
        Some(match self {
            Placeholder::Host => Field::Host,
            Placeholder::RemoteAddr => Field::RemoteAddr,
            Placeholder::Xff => Field::Xff,
            Placeholder::Method => Field::Method,
            Placeholder::Status => Field::Status,
            Placeholder::Http => Field::Http,
            Placeholder::Path => Field::Path,
            Placeholder::Size => Field::Size,
            Placeholder::Referrer => Field::Referrer,
            Placeholder::UserAgent => Field::UserAgent,
            Placeholder::Query => Field::Query,
            Placeholder::ContentType => Field::ContentType,
            Placeholder::Ignore
            | Placeholder::TimingSec
            | Placeholder::TimingMilli
            | Placeholder::TimingMicro
            | Placeholder::Date
            | Placeholder::Time
            | Placeholder::Datetime => return None,
        })
    }

    /// The placeholder that fills `field`; `None` for fields no format can
    /// capture.
    pub fn for_field(field: Field) -> Option<Self> {
        Some(match field {
            Field::Host => Placeholder::Host,
            Field::RemoteAddr => Placeholder::RemoteAddr,
            Field::Xff => Placeholder::Xff,
            Field::Method => Placeholder::Method,
            Field::Status => Placeholder::Status,
            Field::Http => Placeholder::Http,
            Field::Path => Placeholder::Path,
            Field::Size => Placeholder::Size,
            Field::Referrer => Placeholder::Referrer,
            Field::UserAgent => Placeholder::UserAgent,
            Field::Query => Placeholder::Query,
            Field::ContentType => Placeholder::ContentType,
            Field::AcceptLanguage => return None,
        })
    }
}

impl std::fmt::Display for Placeholder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.name())
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

const COMMON: &str = r#"$remote_addr $ignore $ignore [$datetime] "$method $path $http" $status $size"#;
const COMMON_VHOST: &str =
    r#"$host:$ignore $remote_addr $ignore $ignore [$datetime] "$method $path $http" $status $size"#;
const COMBINED: &str = r#"$remote_addr $ignore $ignore [$datetime] "$method $path $http" $status $size "$referrer" "$user_agent""#;
const COMBINED_VHOST: &str = r#"$host:$ignore $remote_addr $ignore $ignore [$datetime] "$method $path $http" $status $size "$referrer" "$user_agent""#;
const COMMON_LOG_LAYOUT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Layout strings for the `$date`, `$time` and `$datetime` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutSpecs {
    pub date: String,
    pub time: String,
    pub datetime: String,
}

/// Expand a preset name into its format, filling in any layout the caller
/// left empty. `log:` strips itself and passes the rest through.
pub fn resolve_preset(format: &str, layouts: LayoutSpecs) -> (String, LayoutSpecs) {
    let (fmt, preset_datetime) = match format {
        "common" => (COMMON, COMMON_LOG_LAYOUT),
        "common-vhost" => (COMMON_VHOST, COMMON_LOG_LAYOUT),
        "combined" => (COMBINED, COMMON_LOG_LAYOUT),
        "combined-vhost" => (COMBINED_VHOST, COMMON_LOG_LAYOUT),
        other => {
            let other = other.strip_prefix("log:").unwrap_or(other);
            return (other.to_string(), layouts);
        }
    };
    let datetime = if layouts.datetime.is_empty() {
        preset_datetime.to_string()
    } else {
        layouts.datetime
    };
    (fmt.to_string(), LayoutSpecs { datetime, ..layouts })
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Validated layouts for the timestamp placeholders a format uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateLayouts {
    pub date: Option<Layout>,
    pub time: Option<Layout>,
    pub datetime: Option<Layout>,
}

/// A format compiled into one whole-line pattern.
#[derive(Debug, Clone)]
pub struct CompiledFormat {
    pub regex: Regex,
    /// Capturing placeholders in the order their groups appear.
    pub captures: Vec<Placeholder>,
    pub layouts: DateLayouts,
}

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([a-z_]+)").expect("placeholder pattern is valid"));

/// Compile `format` into an anchored pattern.
///
/// Fails on unknown placeholders, on `$date`/`$time`/`$datetime` without a
/// usable layout, and if the assembled pattern does not compile.
pub fn compile(format: &str, layouts: &LayoutSpecs) -> Result<CompiledFormat, FormatError> {
    let mut pattern = String::with_capacity(format.len() * 2 + 2);
    let mut captures = Vec::new();
    let mut seen = HashSet::new();
    let mut date_layouts = DateLayouts::default();
    let mut last = 0;

    pattern.push('^');
    for caps in PLACEHOLDER_RE.captures_iter(format) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        pattern.push_str(&regex::escape(&format[last..whole.start()]));
        last = whole.end();

        let placeholder = Placeholder::lookup(name.as_str())
            .ok_or_else(|| FormatError::UnknownSpecifier(name.as_str().to_string()))?;

        match placeholder {
            Placeholder::Date if date_layouts.date.is_none() => {
                date_layouts.date = Some(layout_for("date", &layouts.date)?);
            }
            Placeholder::Time if date_layouts.time.is_none() => {
                date_layouts.time = Some(layout_for("time", &layouts.time)?);
            }
            Placeholder::Datetime if date_layouts.datetime.is_none() => {
                date_layouts.datetime = Some(layout_for("datetime", &layouts.datetime)?);
            }
            _ => {}
        }

        if placeholder == Placeholder::Ignore || !seen.insert(placeholder) {
            pattern.push_str("(?:");
        } else {
            captures.push(placeholder);
            pattern.push_str("(?P<");
            pattern.push_str(placeholder.name());
            pattern.push('>');
        }
        pattern.push_str(placeholder.fragment());
        pattern.push(')');
    }
    pattern.push_str(&regex::escape(&format[last..]));
    pattern.push('$');

    let regex = Regex::new(&pattern)?;
    Ok(CompiledFormat {
        regex,
        captures,
        layouts: date_layouts,
    })
}

fn layout_for(name: &'static str, spec: &str) -> Result<Layout, FormatError> {
    if spec.is_empty() {
        return Err(FormatError::MissingLayout(name));
    }
    Layout::new(spec).map_err(|source| FormatError::InvalidLayout { name, source })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn no_layouts() -> LayoutSpecs {
        LayoutSpecs::default()
    }

    #[test]
    fn every_placeholder_is_in_the_table() {
        for (name, placeholder) in PLACEHOLDERS.entries() {
            assert_eq!(placeholder.name(), *name);
            assert_eq!(Placeholder::lookup(name), Some(*placeholder));
        }
    }

    #[test]
    fn field_mapping_is_consistent() {
        for field in Field::ALL {
            if let Some(p) = Placeholder::for_field(field) {
                assert_eq!(p.field(), Some(field));
            }
        }
    }

    #[test]
    fn literal_text_is_escaped_and_anchored() {
        let compiled = compile("[$status] (x+y)? $size", &no_layouts()).unwrap();
        assert_eq!(
            compiled.regex.as_str(),
            r"^\[(?P<status>\d{3})\] \(x\+y\)\? (?P<size>(?:\d+|-))$"
        );
        assert_eq!(compiled.captures, vec![Placeholder::Status, Placeholder::Size]);
    }

    #[test]
    fn ignore_does_not_capture() {
        let compiled = compile("$ignore $method $ignore", &no_layouts()).unwrap();
        assert_eq!(compiled.captures, vec![Placeholder::Method]);
        assert_eq!(compiled.regex.captures_len(), 2);
    }

    #[test]
    fn repeated_placeholder_captures_once() {
        let compiled = compile("$host $host", &no_layouts()).unwrap();
        assert_eq!(compiled.captures, vec![Placeholder::Host]);
        let caps = compiled.regex.captures("a.example b.example").unwrap();
        assert_eq!(&caps["host"], "a.example");
    }

    #[test]
    fn whole_line_must_match() {
        let compiled = compile("$status", &no_layouts()).unwrap();
        assert!(compiled.regex.is_match("200"));
        assert!(!compiled.regex.is_match("200 "));
        assert!(!compiled.regex.is_match(" 200"));
    }

    #[rstest]
    #[case::accept_language("$accept_language")]
    #[case::nginx_style("$request_time")]
    #[case::typo("$stauts")]
    fn unknown_specifier_fails(#[case] format: &str) {
        let err = compile(format, &no_layouts()).unwrap_err();
        assert!(matches!(err, FormatError::UnknownSpecifier(_)), "{err}");
    }

    #[rstest]
    #[case::date("$date", "date")]
    #[case::time("$time", "time")]
    #[case::datetime("$datetime", "datetime")]
    fn timestamp_placeholder_requires_layout(#[case] format: &str, #[case] name: &str) {
        let err = compile(format, &no_layouts()).unwrap_err();
        assert!(matches!(err, FormatError::MissingLayout(n) if n == name), "{err}");
    }

    #[test]
    fn invalid_layout_is_rejected_at_compile_time() {
        let layouts = LayoutSpecs {
            date: "%Y-%m-%d %Q".to_string(),
            ..LayoutSpecs::default()
        };
        let err = compile("$date", &layouts).unwrap_err();
        assert!(matches!(err, FormatError::InvalidLayout { name: "date", .. }), "{err}");
    }

    #[test]
    fn unused_layouts_are_not_validated() {
        let layouts = LayoutSpecs {
            time: "garbage".to_string(),
            ..LayoutSpecs::default()
        };
        let compiled = compile("$status", &layouts).unwrap();
        assert_eq!(compiled.layouts, DateLayouts::default());
    }

    #[test]
    fn presets_fill_only_missing_layouts() {
        let (fmt, layouts) = resolve_preset("combined", no_layouts());
        assert_eq!(fmt, COMBINED);
        assert_eq!(layouts.datetime, COMMON_LOG_LAYOUT);

        let custom = LayoutSpecs {
            datetime: "rfc3339".to_string(),
            ..LayoutSpecs::default()
        };
        let (_, layouts) = resolve_preset("common", custom);
        assert_eq!(layouts.datetime, "rfc3339");
    }

    #[test]
    fn log_prefix_is_stripped() {
        let (fmt, _) = resolve_preset("log:$host $status", no_layouts());
        assert_eq!(fmt, "$host $status");
    }

    #[rstest]
    #[case("common")]
    #[case("common-vhost")]
    #[case("combined")]
    #[case("combined-vhost")]
    fn presets_compile(#[case] name: &str) {
        let (fmt, layouts) = resolve_preset(name, no_layouts());
        compile(&fmt, &layouts).unwrap();
    }
}
