//! Error types for the mirai framework.

use thiserror::Error;

use mirai_core::ApiError;

/// Errors that can occur during context extraction.
///
/// An extraction failure never reaches the user: the dispatcher skips the
/// listener whose parameter could not be bound.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The event type does not match the expected type.
    #[error("event type mismatch: expected '{expected}', got '{got}'")]
    EventTypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// Actual event name.
        got: &'static str,
    },

    /// The bot type does not match the expected type.
    #[error("bot type mismatch: expected '{expected}'")]
    BotTypeMismatch {
        /// Expected bot type name.
        expected: &'static str,
    },

    /// The payload carries no field the parameter can be bound from.
    #[error("no field bindable as '{expected}'")]
    MissingField {
        /// Expected type name.
        expected: &'static str,
    },

    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    /// Creates a custom extraction error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// An error returned (or raised) by a listener.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A command issued by the listener failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The listener panicked.
    #[error("listener panicked: {0}")]
    Panic(String),

    /// Any other error.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    /// Wraps an arbitrary error.
    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Other(Box::new(err))
    }

    /// Returns `true` for gateway status errors, which are expected on the
    /// background path and only worth a warning.
    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_domain())
    }
}

impl From<String> for HandlerError {
    fn from(msg: String) -> Self {
        Self::Other(msg.into())
    }
}

impl From<&str> for HandlerError {
    fn from(msg: &str) -> Self {
        Self::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_classification() {
        let err: HandlerError = ApiError::BotMuted("muted".into()).into();
        assert!(err.is_domain());

        let err: HandlerError = ApiError::Timeout.into();
        assert!(!err.is_domain());

        let err: HandlerError = "boom".into();
        assert!(!err.is_domain());
        assert_eq!(err.to_string(), "boom");
    }
}
