//! # Mirai Runtime
//!
//! Orchestration layer of the mirai SDK:
//!
//! - Layered configuration loading with figment ([`ConfigLoader`], [`RuntimeConfig`])
//! - Logging setup over `tracing-subscriber` ([`LoggingBuilder`])
//! - Session lifecycle: connect, run until a shutdown signal, stop ([`MiraiRuntime`])
//! - A blocking facade for plain threads ([`BlockingBot`])
//!
//! ```ignore
//! use mirai_runtime::MiraiRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = MiraiRuntime::new()?;
//!     runtime.register("GroupMessage", on_group_message);
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod blocking;
pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use blocking::BlockingBot;
pub use config::{ConfigError, ConfigLoader, ConfigResult, LoggingConfig, RuntimeConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{MiraiRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for application code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
