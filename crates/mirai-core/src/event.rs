//! Event system for the mirai SDK.
//!
//! - [`Event`] - Base trait for everything pushed by the gateway
//! - [`BoxedEvent`] - Type-erased, cheaply clonable event container
//!
//! Adapters decode wire payloads into their own closed sum types and wrap them
//! in a [`BoxedEvent`] before handing them to the dispatcher. Handlers recover
//! the concrete type through [`BoxedEvent::downcast_ref`].

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

/// The base trait for all events.
pub trait Event: Any + Send + Sync {
    /// Returns the discriminator this event was decoded from, e.g. `"GroupMessage"`.
    ///
    /// Listener registries are keyed by this name.
    fn event_name(&self) -> &'static str;

    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns the undecoded payload this event was built from, if retained.
    fn raw_json(&self) -> Option<&Value> {
        None
    }
}

/// A type-erased container for events that supports runtime downcasting.
#[derive(Clone)]
pub struct BoxedEvent {
    inner: Arc<dyn Event>,
}

impl BoxedEvent {
    /// Creates a new `BoxedEvent` from any type implementing `Event`.
    pub fn new<E: Event + 'static>(event: E) -> Self {
        Self {
            inner: Arc::new(event),
        }
    }

    /// Returns the inner `Arc<dyn Event>`.
    pub fn inner(&self) -> &Arc<dyn Event> {
        &self.inner
    }

    /// Attempts to downcast to a concrete event type.
    pub fn downcast_ref<E: Event + 'static>(&self) -> Option<&E> {
        self.inner.as_any().downcast_ref()
    }

    /// Returns `true` if the wrapped event is of type `E`.
    pub fn is<E: Event + 'static>(&self) -> bool {
        self.inner.as_any().is::<E>()
    }
}

impl std::ops::Deref for BoxedEvent {
    type Target = dyn Event;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl std::fmt::Debug for BoxedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxedEvent")
            .field("event_name", &self.event_name())
            .finish()
    }
}
