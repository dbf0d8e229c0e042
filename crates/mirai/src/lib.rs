//! # Mirai
//!
//! A typed, async SDK for building QQ bots on top of the mirai-api-http
//! WebSocket gateway.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌────────────┐     ┌──────────┐
//! │  Transport  │────▶│   Session    │────▶│ Dispatcher │────▶│ Listener │
//! │ (WebSocket) │◀────│ (MiraiBot)   │     │            │────▶│ Listener │
//! └─────────────┘     └──────────────┘     └────────────┘     └──────────┘
//! ```
//!
//! - **Session**: handshake, heartbeat, command correlation and retry
//! - **Dispatcher**: runs listeners registered under a push's `type`
//! - **Listeners**: plain functions whose parameters are bound from the push
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use mirai::prelude::*;
//!
//! async fn echo(bot: Arc<MiraiBot>, group: Group, chain: MessageChain) -> ApiResult<()> {
//!     bot.send_group_message(group.id, chain, None).await.map(|_| ())
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = MiraiRuntime::new()?;
//!     runtime.register("GroupMessage", echo);
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default): read `mirai.toml`
//! - `yaml-config`: read `mirai.yaml`
//! - `json-log`: JSON log lines

pub use mirai_adapter_api_http as api_http;
pub use mirai_core as core;
pub use mirai_framework as framework;
pub use mirai_runtime as runtime;

/// Commonly used types for building bots.
///
/// ```rust,ignore
/// use mirai::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use mirai_runtime::{BlockingBot, MiraiRuntime, RuntimeConfig};

    // Session and configuration
    pub use mirai_adapter_api_http::{MiraiBot, MiraiConfig};

    // Typed model
    pub use mirai_adapter_api_http::{
        ContactId, Friend, FriendMessage, Group, GroupMessage, Incoming, Member, MessageChain,
        Operator, Stranger, TempMessage,
    };

    // Listener registration
    pub use mirai_framework::{FromContext, Listener, ListenerRegistry, Raw};

    // Errors
    pub use mirai_core::{ApiError, ApiResult, ApiResultExt};
}
