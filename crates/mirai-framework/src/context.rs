//! The per-dispatch context handed to extractors.

use serde_json::Value;

use mirai_core::{Bot, BoxedBot, BoxedEvent};

static NULL: Value = Value::Null;

/// Everything a listener can bind its parameters from.
///
/// One `DispatchContext` is created per decoded push frame and shared by every
/// listener registered under the frame's discriminator.
#[derive(Clone)]
pub struct DispatchContext {
    event: BoxedEvent,
    bot: BoxedBot,
}

impl DispatchContext {
    /// Creates a context for one event.
    pub fn new(event: BoxedEvent, bot: BoxedBot) -> Self {
        Self { event, bot }
    }

    /// Returns the decoded event.
    pub fn event(&self) -> &BoxedEvent {
        &self.event
    }

    /// Returns the bot that received the event.
    pub fn bot(&self) -> &dyn Bot {
        self.bot.as_ref()
    }

    /// Returns a clone of the bot handle.
    pub fn bot_arc(&self) -> BoxedBot {
        self.bot.clone()
    }

    /// Returns the undecoded payload, or `null` if the event did not keep it.
    pub fn raw(&self) -> &Value {
        self.event.raw_json().unwrap_or(&NULL)
    }

    /// Returns the payload field at a JSON pointer such as `/sender/group`.
    pub fn field(&self, pointer: &str) -> Option<&Value> {
        self.raw().pointer(pointer).filter(|v| !v.is_null())
    }
}

impl std::fmt::Debug for DispatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchContext")
            .field("event", &self.event)
            .field("bot", &self.bot.id())
            .finish()
    }
}
