//! Typed model of everything the gateway pushes.
//!
//! Push payloads are closed tagged unions keyed by their `type` field. A
//! payload is decoded in two steps: [`Incoming::decode`] first picks the family
//! (message or event) from the discriminator, then deserializes the variant.
//! Nested contacts, permissions and chains decode recursively.

use std::any::Any;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use mirai_core::{ApiError, Event as EventTrait};

/// Declares a family of payloads tagged by `type`.
///
/// Variant names double as wire discriminators and as the names of their
/// payload structs. Every payload struct becomes a listener parameter.
macro_rules! tagged_union {
    (
        $(#[$meta:meta])*
        pub enum $name:ident in $family:ident {
            $($variant:ident),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(tag = "type")]
        pub enum $name {
            $(
                #[doc = concat!("A `", stringify!($variant), "` payload.")]
                $variant($variant),
            )*
        }

        impl $name {
            /// Every discriminator of this family.
            pub const KINDS: &'static [&'static str] = &[$(stringify!($variant)),*];

            /// Returns the wire discriminator.
            pub fn kind(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => stringify!($variant),)*
                }
            }
        }

        impl mirai_framework::FromContext for $name {
            fn from_context(
                ctx: &mirai_framework::DispatchContext,
            ) -> mirai_framework::ExtractResult<Self> {
                match ctx
                    .event()
                    .downcast_ref::<$crate::model::Incoming>()
                    .map($crate::model::Incoming::payload)
                {
                    Some($crate::model::Payload::$family(v)) => Ok(v.clone()),
                    _ => Err(mirai_framework::ExtractError::EventTypeMismatch {
                        expected: stringify!($name),
                        got: ctx.event().event_name(),
                    }),
                }
            }
        }

        $(
            impl From<$variant> for $name {
                fn from(v: $variant) -> Self {
                    Self::$variant(v)
                }
            }

            impl mirai_framework::FromContext for $variant {
                fn from_context(
                    ctx: &mirai_framework::DispatchContext,
                ) -> mirai_framework::ExtractResult<Self> {
                    match ctx
                        .event()
                        .downcast_ref::<$crate::model::Incoming>()
                        .map($crate::model::Incoming::payload)
                    {
                        Some($crate::model::Payload::$family($name::$variant(v))) => Ok(v.clone()),
                        _ => Err(mirai_framework::ExtractError::EventTypeMismatch {
                            expected: stringify!($variant),
                            got: ctx.event().event_name(),
                        }),
                    }
                }
            }
        )*
    };
}

pub mod api;
pub mod chain;
pub mod contact;
pub mod element;
pub mod event;
pub mod message;
pub mod permission;

pub use api::{
    Announcement, AnnouncementOptions, DownloadInfo, FileInfo, GroupConfig, MemberInfoUpdate,
    Profile,
};
pub use chain::MessageChain;
pub use contact::{
    Client, ContactId, Friend, Group, Member, Operator, Stranger, Subject, SubjectKind,
};
pub use element::{
    App, At, Dice, Element, Face, File, Forward, ForwardNode, Image, Json, MarketFace,
    MediaSource, MiraiCode, MusicShare, Plain, Poke, Quote, Source, Voice, Xml,
};
pub use event::*;
pub use message::*;
pub use permission::Permission;

// =============================================================================
// Decode
// =============================================================================

/// Errors raised while decoding a push payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload has no string `type` field.
    #[error("payload has no type discriminator")]
    MissingType,

    /// The discriminator names no known message or event.
    #[error("unknown payload type '{0}'")]
    UnknownType(String),

    /// The discriminator is known but the payload does not match its shape.
    #[error("malformed {kind} payload: {source}")]
    Invalid {
        /// The discriminator.
        kind: String,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
}

impl From<DecodeError> for ApiError {
    fn from(err: DecodeError) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// The two payload families.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A chat message.
    Message(MessageEvent),
    /// Any other notification.
    Event(Event),
}

/// A decoded push payload together with the raw JSON it came from.
#[derive(Debug, Clone)]
pub struct Incoming {
    payload: Payload,
    raw: Value,
}

impl Incoming {
    /// Decodes a push payload.
    pub fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let kind = raw
            .get("type")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingType)?;

        let invalid = |source| DecodeError::Invalid {
            kind: kind.to_string(),
            source,
        };

        let payload = if MessageEvent::KINDS.contains(&kind) {
            Payload::Message(MessageEvent::deserialize(raw).map_err(invalid)?)
        } else if Event::KINDS.contains(&kind) {
            Payload::Event(Event::deserialize(raw).map_err(invalid)?)
        } else {
            return Err(DecodeError::UnknownType(kind.to_string()));
        };

        Ok(Self {
            payload,
            raw: raw.clone(),
        })
    }

    /// Returns the decoded payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Consumes self, returning the decoded payload.
    pub fn into_payload(self) -> Payload {
        self.payload
    }

    /// Returns the wire discriminator.
    pub fn kind(&self) -> &'static str {
        match &self.payload {
            Payload::Message(m) => m.kind(),
            Payload::Event(e) => e.kind(),
        }
    }

    /// Returns the message, if this is one.
    pub fn as_message(&self) -> Option<&MessageEvent> {
        match &self.payload {
            Payload::Message(m) => Some(m),
            Payload::Event(_) => None,
        }
    }

    /// Returns the event, if this is one.
    pub fn as_event(&self) -> Option<&Event> {
        match &self.payload {
            Payload::Event(e) => Some(e),
            Payload::Message(_) => None,
        }
    }

    /// Returns the raw payload.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Returns the account that caused this payload, when it names one.
    ///
    /// Messages report their sender; nudges and requests the initiating
    /// account; bot lifecycle events the bot's own account.
    pub fn origin_id(&self) -> Option<i64> {
        match &self.payload {
            Payload::Message(m) => m.sender_id(),
            Payload::Event(e) => e.origin_id(),
        }
    }
}

impl EventTrait for Incoming {
    fn event_name(&self) -> &'static str {
        self.kind()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn raw_json(&self) -> Option<&Value> {
        Some(&self.raw)
    }
}
