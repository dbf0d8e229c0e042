//! # mirai-api-http Adapter
//!
//! Speaks the mirai-api-http WebSocket protocol on behalf of one bot account.
//!
//! ## Overview
//!
//! - Session lifecycle: handshake, heartbeat, reconnect under the retry envelope ([`MiraiBot`])
//! - Command/response correlation over the single `/all` channel ([`ResponseRouter`])
//! - Typed decoding of every pushed message and event ([`model`])
//! - Listener parameters bound from payload fields ([`extractors`])
//! - Typed commands, including media upload over the HTTP side
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use mirai_adapter_api_http::{GroupMessage, MessageChain, MiraiBot, MiraiConfig};
//! use mirai_core::ApiResultExt;
//!
//! async fn echo(bot: Arc<MiraiBot>, msg: GroupMessage) {
//!     let _ = bot
//!         .send_group_message(msg.sender.group.id, msg.message_chain, None)
//!         .await
//!         .or_log("echo");
//! }
//!
//! let bot = MiraiBot::new(MiraiConfig::new("127.0.0.1", 8080, 10001, "key"))?;
//! bot.dispatcher().registry_mut(|r| {
//!     r.register("GroupMessage", echo);
//! });
//! bot.connect().await?;
//! bot.wait_closed().await;
//! ```
//!
//! ## Push Hierarchy
//!
//! ```text
//! Incoming (implements Event, keyed by the `type` discriminator)
//! ├── Message { GroupMessage, FriendMessage, TempMessage, ..., StrangerSyncMessage }
//! └── Event   { BotOnlineEvent, ..., NudgeEvent, ..., CommandExecutedEvent }
//! ```
//!
//! Pushes caused by the bot's own account are never dispatched.

mod adapter;
pub mod bot;
pub mod commands;
pub mod config;
pub mod correlation;
pub mod extractors;
pub mod frame;
pub mod model;
pub mod router;
pub mod upload;

pub use bot::{ConnectionState, MiraiBot};
pub use config::{MiraiConfig, RetryConfig};
pub use correlation::CorrelationNamespace;
pub use extractors::{Binding, FieldBinding};
pub use frame::{Inbound, OutgoingFrame, PUSH_SYNC_ID, decode_response};
pub use model::*;
pub use router::{ResponseRouter, Routed};
pub use upload::UploadTarget;
