//! Unified error types for the mirai SDK.
//!
//! Errors are grouped by how the session reacts to them, see [`ErrorClass`].
//! Framework-level errors (like `ExtractError`) are defined in mirai-framework.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur in transport operations.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {url} - {reason}")]
    ConnectionFailed {
        /// The URL that failed to connect.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// Connection closed.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// Message send failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// Invalid configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// API Errors
// =============================================================================

/// How the session reacts to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The channel could not be opened or went away. Retried after a reconnect.
    Connect,
    /// The gateway rejected the session or spoke an unexpected dialect. Fatal.
    Protocol,
    /// A status code from the gateway's table. Surfaced to the caller.
    Domain,
    /// Anything else.
    Other,
}

/// Error type for API calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The bot is not connected.
    #[error("bot is not connected")]
    NotConnected,
    /// The API call timed out.
    #[error("API call timed out")]
    Timeout,

    /// Status 1: wrong verify key.
    #[error("verify failed: {0}")]
    Verify(String),
    /// Status 2: the account is not logged in on the gateway.
    #[error("bot not found: {0}")]
    BotNotFound(String),
    /// Status 3: the session key is invalid or expired.
    #[error("session invalid: {0}")]
    SessionInvalid(String),
    /// Status 4: the session is not bound to an account.
    #[error("session unauthorized: {0}")]
    SessionUnauthorized(String),
    /// Status 5: the target friend, group or member does not exist.
    #[error("target not found: {0}")]
    TargetNotFound(String),
    /// Status 6: the requested file does not exist.
    #[error("file not found: {0}")]
    FileNotFound(String),
    /// Status 10: the bot lacks the permission for this operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// Status 20: the bot is muted in the target group.
    #[error("bot muted: {0}")]
    BotMuted(String),
    /// Status 30: the message exceeds the length limit.
    #[error("message too long: {0}")]
    MessageTooLong(String),
    /// Status 400: the request was malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Status 500 or any code outside the table.
    #[error("API error ({code}): {message}")]
    Unknown { code: i64, message: String },

    /// Failed to serialize/deserialize.
    #[error("serialization error: {0}")]
    SerializationError(String),
    /// An inbound payload could not be decoded into a typed entity.
    #[error("decode error: {0}")]
    Decode(String),
    /// Media upload failed.
    #[error("upload failed: {0}")]
    Upload(String),
    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Maps a gateway status code to its typed error.
    ///
    /// Returns `None` for `0`. Codes outside the table become [`ApiError::Unknown`].
    pub fn from_status(code: i64, message: impl Into<String>) -> Option<Self> {
        let message = message.into();
        Some(match code {
            0 => return None,
            1 => Self::Verify(message),
            2 => Self::BotNotFound(message),
            3 => Self::SessionInvalid(message),
            4 => Self::SessionUnauthorized(message),
            5 => Self::TargetNotFound(message),
            6 => Self::FileNotFound(message),
            10 => Self::PermissionDenied(message),
            20 => Self::BotMuted(message),
            30 => Self::MessageTooLong(message),
            400 => Self::InvalidArgument(message),
            code => Self::Unknown { code, message },
        })
    }

    /// Returns the gateway status code this error was built from, if any.
    pub fn status_code(&self) -> Option<i64> {
        match self {
            Self::Verify(_) => Some(1),
            Self::BotNotFound(_) => Some(2),
            Self::SessionInvalid(_) => Some(3),
            Self::SessionUnauthorized(_) => Some(4),
            Self::TargetNotFound(_) => Some(5),
            Self::FileNotFound(_) => Some(6),
            Self::PermissionDenied(_) => Some(10),
            Self::BotMuted(_) => Some(20),
            Self::MessageTooLong(_) => Some(30),
            Self::InvalidArgument(_) => Some(400),
            Self::Unknown { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Classifies this error for the retry envelope.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotConnected => ErrorClass::Connect,
            Self::Transport(
                TransportError::ConnectionFailed { .. }
                | TransportError::ConnectionClosed { .. }
                | TransportError::SendFailed(_)
                | TransportError::Io(_),
            ) => ErrorClass::Connect,
            Self::Verify(_)
            | Self::SessionInvalid(_)
            | Self::SessionUnauthorized(_)
            | Self::BotNotFound(_)
            | Self::Decode(_)
            | Self::SerializationError(_) => ErrorClass::Protocol,
            Self::TargetNotFound(_)
            | Self::FileNotFound(_)
            | Self::PermissionDenied(_)
            | Self::BotMuted(_)
            | Self::MessageTooLong(_)
            | Self::InvalidArgument(_)
            | Self::Unknown { .. } => ErrorClass::Domain,
            _ => ErrorClass::Other,
        }
    }

    /// Shorthand for `self.class() == ErrorClass::Domain`.
    pub fn is_domain(&self) -> bool {
        self.class() == ErrorClass::Domain
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_zero_is_success() {
        assert!(ApiError::from_status(0, "success").is_none());
    }

    #[test]
    fn test_status_table() {
        let cases = [
            (1, "verify"),
            (2, "bot"),
            (3, "session invalid"),
            (4, "session unauthorized"),
            (5, "target"),
            (6, "file"),
            (10, "no permission"),
            (20, "muted"),
            (30, "too long"),
            (400, "bad"),
        ];
        for (code, msg) in cases {
            let err = ApiError::from_status(code, msg).unwrap();
            assert_eq!(err.status_code(), Some(code));
            assert!(err.to_string().ends_with(msg), "{err}");
        }

        match ApiError::from_status(10, "no permission").unwrap() {
            ApiError::PermissionDenied(msg) => assert_eq!(msg, "no permission"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unmapped_status_is_unknown() {
        match ApiError::from_status(7, "what").unwrap() {
            ApiError::Unknown { code, message } => {
                assert_eq!(code, 7);
                assert_eq!(message, "what");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            ApiError::from_status(500, "boom"),
            Some(ApiError::Unknown { code: 500, .. })
        ));
    }

    #[test]
    fn test_classes() {
        assert_eq!(ApiError::NotConnected.class(), ErrorClass::Connect);
        assert_eq!(
            ApiError::Transport(TransportError::ConnectionFailed {
                url: "ws://x".into(),
                reason: "refused".into(),
            })
            .class(),
            ErrorClass::Connect
        );
        assert_eq!(ApiError::Verify(String::new()).class(), ErrorClass::Protocol);
        assert_eq!(
            ApiError::Decode("unknown type".into()).class(),
            ErrorClass::Protocol
        );
        assert!(ApiError::PermissionDenied(String::new()).is_domain());
        assert_eq!(ApiError::Timeout.class(), ErrorClass::Other);
    }
}
