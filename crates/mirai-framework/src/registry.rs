//! Listener registry.
//!
//! Listeners are keyed by the discriminator of the payload they react to
//! (`"GroupMessage"`, `"MemberJoinEvent"`, ...). A registration under several
//! keys is expanded into one entry per key; entries under one key keep their
//! registration order.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::handler::{BoxedHandler, Handler, SyncHandler, into_handler, into_sync_handler};

/// A callback run synchronously with the raw payload before the listener is
/// bound. The second argument holds the registration's extra args.
pub type SideCallback = Arc<dyn Fn(&Value, &[Value]) + Send + Sync>;

/// One listener plus its optional side callback.
#[derive(Clone)]
pub struct Listener {
    handler: BoxedHandler,
    side_callback: Option<SideCallback>,
    side_args: Arc<[Value]>,
}

impl Listener {
    /// Creates a listener from an async function.
    pub fn new<H, T>(handler: H) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        Self::from_boxed(into_handler(handler))
    }

    /// Creates a listener from a synchronous function.
    pub fn sync<H, T>(handler: H) -> Self
    where
        H: SyncHandler<T>,
        T: 'static,
    {
        Self::from_boxed(into_sync_handler(handler))
    }

    fn from_boxed(handler: BoxedHandler) -> Self {
        Self {
            handler,
            side_callback: None,
            side_args: Arc::from(Vec::new()),
        }
    }

    /// Sets the side callback.
    pub fn side_callback<C>(mut self, callback: C) -> Self
    where
        C: Fn(&Value, &[Value]) + Send + Sync + 'static,
    {
        self.side_callback = Some(Arc::new(callback));
        self
    }

    /// Sets the extra args passed to the side callback.
    pub fn side_args(mut self, args: impl IntoIterator<Item = Value>) -> Self {
        self.side_args = args.into_iter().collect();
        self
    }

    pub(crate) fn handler(&self) -> &BoxedHandler {
        &self.handler
    }

    pub(crate) fn run_side_callback(&self, raw: &Value) {
        if let Some(callback) = &self.side_callback {
            callback(raw, &self.side_args);
        }
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("has_side_callback", &self.side_callback.is_some())
            .field("side_args", &self.side_args.len())
            .finish()
    }
}

/// One key or a list of keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerKeys(Vec<String>);

impl From<&str> for ListenerKeys {
    fn from(key: &str) -> Self {
        Self(vec![key.to_string()])
    }
}

impl From<String> for ListenerKeys {
    fn from(key: String) -> Self {
        Self(vec![key])
    }
}

impl From<&[&str]> for ListenerKeys {
    fn from(keys: &[&str]) -> Self {
        Self(keys.iter().map(|k| k.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ListenerKeys {
    fn from(keys: [&str; N]) -> Self {
        Self(keys.iter().map(|k| k.to_string()).collect())
    }
}

impl From<Vec<String>> for ListenerKeys {
    fn from(keys: Vec<String>) -> Self {
        Self(keys)
    }
}

/// Listeners indexed by discriminator key.
#[derive(Debug, Default, Clone)]
pub struct ListenerRegistry {
    listeners: HashMap<String, Vec<Listener>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an async function under one or more keys.
    pub fn register<H, T>(&mut self, keys: impl Into<ListenerKeys>, handler: H) -> &mut Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.register_with(keys, Listener::new(handler))
    }

    /// Registers a synchronous function under one or more keys.
    pub fn register_sync<H, T>(&mut self, keys: impl Into<ListenerKeys>, handler: H) -> &mut Self
    where
        H: SyncHandler<T>,
        T: 'static,
    {
        self.register_with(keys, Listener::sync(handler))
    }

    /// Registers a prepared [`Listener`] under one or more keys.
    pub fn register_with(&mut self, keys: impl Into<ListenerKeys>, listener: Listener) -> &mut Self {
        for key in keys.into().0 {
            self.listeners.entry(key).or_default().push(listener.clone());
        }
        self
    }

    /// Returns the listeners registered under `key`, in registration order.
    pub fn get(&self, key: &str) -> &[Listener] {
        self.listeners.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the number of keys with at least one listener.
    pub fn key_count(&self) -> usize {
        self.listeners.len()
    }

    /// Returns the total number of entries across all keys.
    pub fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
