//! Test builders — ergonomic constructors for Caddy JSON lines and parsers.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use lognorm_core::{Parser, ParserConfig};
use serde_json::{json, Map, Value};

// ---------------------------------------------------------------------------
// CaddyLineBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for one Caddy JSON access-log line.
///
/// # Example
///
/// ```rust
/// let line = CaddyLineBuilder::new()
///     .host("a.b.example.com")
///     .uri("/index.html?x=1")
///     .header("User-Agent", &["curl/8.5.0"])
///     .build();
/// ```
pub struct CaddyLineBuilder {
    ts: Value,
    duration: f64,
    size: u64,
    status: u16,
    remote_addr: String,
    proto: String,
    method: String,
    host: String,
    uri: String,
    headers: Map<String, Value>,
}

impl CaddyLineBuilder {
    pub fn new() -> Self {
        Self {
            ts: json!(1_706_788_852.5),
            duration: 0.001,
            size: 0,
            status: 200,
            remote_addr: "127.0.0.1:5000".to_string(),
            proto: "HTTP/1.1".to_string(),
            method: "GET".to_string(),
            host: "example.com".to_string(),
            uri: "/".to_string(),
            headers: Map::new(),
        }
    }

    pub fn ts(mut self, ts: impl Into<Value>) -> Self {
        self.ts = ts.into();
        self
    }

    pub fn duration(mut self, secs: f64) -> Self {
        self.duration = secs;
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = addr.into();
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    pub fn header(mut self, name: &str, values: &[&str]) -> Self {
        self.headers.insert(name.to_string(), json!(values));
        self
    }

    pub fn build_value(self) -> Value {
        json!({
            "level": "info",
            "ts": self.ts,
            "logger": "http.log.access",
            "msg": "handled request",
            "request": {
                "remote_addr": self.remote_addr,
                "proto": self.proto,
                "method": self.method,
                "host": self.host,
                "uri": self.uri,
                "headers": self.headers,
            },
            "duration": self.duration,
            "size": self.size,
            "status": self.status,
            "resp_headers": {},
        })
    }

    pub fn build(self) -> String {
        self.build_value().to_string()
    }
}

impl Default for CaddyLineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Parser constructors
// ---------------------------------------------------------------------------

/// A JSON-backend parser with the given `datetime_format` and rules.
pub fn caddy_parser(datetime_format: &str, exclude: &[&str]) -> Parser {
    ParserConfig {
        format: "caddy".to_string(),
        datetime_format: datetime_format.to_string(),
        exclude: exclude.iter().map(|s| s.to_string()).collect(),
        ..ParserConfig::defaults()
    }
    .build()
    .expect("valid caddy parser config")
}

/// A free-form parser for `format` (or a preset name) and rules.
pub fn pattern_parser(format: &str, exclude: &[&str]) -> Parser {
    ParserConfig {
        format: format.to_string(),
        exclude: exclude.iter().map(|s| s.to_string()).collect(),
        ..ParserConfig::defaults()
    }
    .build()
    .expect("valid pattern parser config")
}
