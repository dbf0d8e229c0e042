//! Wire frames of the `/all` channel.
//!
//! Outbound: `{"syncId", "command", "subCommand"?, "content"}`.
//! Inbound: `{"syncId", "data"}`, where a `syncId` of `"-1"` marks a push.

use serde::Serialize;
use serde_json::Value;

use mirai_core::{ApiError, ApiResult};

/// `syncId` of frames the gateway pushes on its own.
pub const PUSH_SYNC_ID: &str = "-1";

/// A command frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingFrame {
    /// Correlation token.
    pub sync_id: String,
    /// Command name.
    pub command: String,
    /// Sub command, e.g. `"get"` or `"update"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_command: Option<String>,
    /// Command content.
    pub content: Value,
}

impl OutgoingFrame {
    /// Creates a frame.
    pub fn new(
        sync_id: impl Into<String>,
        command: impl Into<String>,
        sub_command: Option<&str>,
        content: Value,
    ) -> Self {
        Self {
            sync_id: sync_id.into(),
            command: command.into(),
            sub_command: sub_command.map(str::to_string),
            content,
        }
    }

    /// Serializes the frame.
    pub fn to_text(&self) -> ApiResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// What an inbound frame is.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A push; carries the `data` payload.
    Push(Value),
    /// A response to the command with this token; carries the whole frame.
    Response {
        /// The correlation token.
        sync_id: String,
        /// The frame.
        frame: Value,
    },
    /// No string `syncId`.
    Unrecognized(Value),
}

impl Inbound {
    /// Classifies a parsed frame.
    pub fn classify(frame: Value) -> Self {
        let sync_id = match frame.get("syncId").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => return Self::Unrecognized(frame),
        };
        if sync_id == PUSH_SYNC_ID {
            let data = match frame {
                Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
                other => other,
            };
            Self::Push(data)
        } else {
            Self::Response { sync_id, frame }
        }
    }
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Turns a response frame into the command's result.
///
/// A nonzero `code` (at the top level or inside `data`) becomes the matching
/// [`ApiError`] carrying the gateway's `msg`. Otherwise the first present value
/// among `data.data`, `data`, `data.msg` and the frame itself is returned.
pub fn decode_response(frame: &Value) -> ApiResult<Value> {
    let data = frame.get("data").unwrap_or(&Value::Null);

    let code = frame
        .get("code")
        .and_then(Value::as_i64)
        .or_else(|| data.get("code").and_then(Value::as_i64));

    if let Some(code) = code {
        let message = data
            .get("msg")
            .or_else(|| frame.get("msg"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        if let Some(err) = ApiError::from_status(code, message) {
            return Err(err);
        }
    }

    let candidates = [data.get("data"), Some(data), data.get("msg")];
    Ok(candidates
        .into_iter()
        .flatten()
        .find(|v| !is_absent(v))
        .unwrap_or(frame)
        .clone())
}
