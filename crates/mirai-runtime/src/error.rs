//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use mirai_core::ApiError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The session failed to open or a command failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A shutdown signal handler could not be installed.
    #[error("Failed to install signal handler: {0}")]
    Signal(#[from] std::io::Error),

    /// A blocking facade was requested outside a tokio runtime.
    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
