//! Bot trait and related types.
//!
//! This module defines the `Bot` trait which represents an active bot session
//! that can receive events and issue commands to the gateway.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ApiResult;

/// The core Bot trait.
///
/// A Bot is an authenticated session that:
/// - Receives events from its connection
/// - Issues commands back through the same connection
///
/// Concrete implementations (e.g., `MiraiBot`) provide strongly-typed
/// command methods on top of `call_api`.
#[async_trait]
pub trait Bot: Send + Sync + 'static {
    /// Returns the bot's account id as a string.
    fn id(&self) -> &str;

    /// Issues a raw command and waits for its correlated response.
    ///
    /// # Arguments
    ///
    /// * `command` - The command discriminator (e.g., "sendGroupMessage")
    /// * `sub_command` - Optional sub command (e.g., "get" for "groupConfig")
    /// * `content` - JSON value containing the command content
    async fn call_api(
        &self,
        command: &str,
        sub_command: Option<&str>,
        content: Value,
    ) -> ApiResult<Value>;

    /// Returns self as an `Arc<dyn Any>` for safe downcasting.
    ///
    /// Implementors should simply return `self`.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Called when the transport connection is lost.
    ///
    /// Implementations should notify pending waiters of the disconnection.
    /// The default implementation does nothing.
    async fn on_disconnect(&self) {}
}

/// A boxed Bot trait object.
pub type BoxedBot = Arc<dyn Bot>;

/// Downcasts a [`BoxedBot`] to a concrete bot type.
pub fn downcast_bot<T: Bot + 'static>(bot: BoxedBot) -> Option<Arc<T>> {
    let any_arc = bot.as_any();
    Arc::downcast::<T>(any_arc).ok()
}
