//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use mirai_adapter_api_http::MiraiConfig;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// The session to open.
    #[serde(default)]
    pub bot: MiraiConfig,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the filter directive spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature.
    #[cfg(feature = "json-log")]
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Written to [`LoggingConfig::file_path`].
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level; `RUST_LOG` takes precedence when set.
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    pub span_events: SpanEventConfig,
    /// Include thread ids.
    pub thread_ids: bool,
    /// Include file and line.
    pub file_location: bool,
    /// Target file when `output` is `file`.
    pub file_path: Option<PathBuf>,
    pub max_file_size: u64,
    pub max_files: u32,
    /// Per-module levels, e.g. `mirai_adapter_api_http = "debug"`.
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            file_path: None,
            max_file_size: 10 * 1024 * 1024,
            max_files: 5,
            filters: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.output, LogOutput::Stdout);
        assert_eq!(config.bot.port, 8080);
    }

    #[test]
    fn test_partial_json() {
        let config: RuntimeConfig = serde_json::from_value(serde_json::json!({
            "logging": {"level": "debug", "filters": {"mirai_core": "trace"}},
            "bot": {"account": 10000, "verify_key": "k"}
        }))
        .unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.filters["mirai_core"], LogLevel::Trace);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.bot.account, 10000);
        assert_eq!(config.bot.host, "127.0.0.1");
    }
}
