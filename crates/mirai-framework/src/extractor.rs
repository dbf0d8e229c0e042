//! Extractor system.
//!
//! A listener declares what it needs through its parameter types; each type
//! implementing [`FromContext`] knows how to pull itself out of a
//! [`DispatchContext`]. Wrapping a parameter in `Option` makes it optional.
//!
//! ```rust,ignore
//! async fn on_group_message(bot: Arc<MiraiBot>, group: Group, chain: MessageChain) {
//!     bot.send_group_message(&group, chain, None).await.or_log("echo").ok();
//! }
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::context::DispatchContext;
use crate::error::{ExtractError, ExtractResult};
use mirai_core::{Bot, BoxedBot, BoxedEvent, downcast_bot};

/// A trait for types that can be extracted from a [`DispatchContext`].
///
/// # Error Handling
///
/// The extraction can fail (returning `Err`) if the required data is not
/// available in the context. In this case, the listener will be skipped.
pub trait FromContext: Sized {
    /// Attempts to extract this type from the given context.
    fn from_context(ctx: &DispatchContext) -> ExtractResult<Self>;
}

impl FromContext for BoxedEvent {
    fn from_context(ctx: &DispatchContext) -> ExtractResult<Self> {
        Ok(ctx.event().clone())
    }
}

/// Optional parameters bind to `None` instead of skipping the listener.
impl<T: FromContext> FromContext for Option<T> {
    fn from_context(ctx: &DispatchContext) -> ExtractResult<Self> {
        Ok(T::from_context(ctx).ok())
    }
}

impl FromContext for BoxedBot {
    fn from_context(ctx: &DispatchContext) -> ExtractResult<Self> {
        Ok(ctx.bot_arc())
    }
}

/// Injects a concrete bot type to access protocol-specific commands.
impl<T: Bot + 'static> FromContext for Arc<T> {
    fn from_context(ctx: &DispatchContext) -> ExtractResult<Self> {
        downcast_bot::<T>(ctx.bot_arc()).ok_or_else(|| ExtractError::BotTypeMismatch {
            expected: std::any::type_name::<T>(),
        })
    }
}

/// The undecoded payload of the event.
#[derive(Debug, Clone, PartialEq)]
pub struct Raw(pub Value);

impl std::ops::Deref for Raw {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromContext for Raw {
    fn from_context(ctx: &DispatchContext) -> ExtractResult<Self> {
        Ok(Raw(ctx.raw().clone()))
    }
}
