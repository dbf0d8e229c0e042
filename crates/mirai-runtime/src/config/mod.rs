//! Configuration for the mirai runtime.
//!
//! Loaded with figment from defaults, `mirai.toml` / `mirai.yaml` and
//! `MIRAI_*` environment variables.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LoggingConfig, RuntimeConfig, SpanEventConfig,
};
