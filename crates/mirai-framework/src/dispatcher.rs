//! Event dispatcher.
//!
//! For every event the dispatcher looks up the listeners registered under the
//! event's name and, in registration order:
//!
//! 1. runs the listener's side callback with the raw payload (a panicking
//!    side callback skips its listener),
//! 2. binds the listener's parameters (skipping it if binding fails),
//! 3. runs synchronous listeners inline and spawns async ones.
//!
//! Every listener outcome goes through the error observer: gateway status
//! errors are logged at `warn`, everything else (including panics) at `error`.
//! Nothing propagates back to the dispatching task.

use std::sync::Arc;

use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinSet;
use tracing::{debug, error, trace, warn};

use crate::context::DispatchContext;
use crate::error::HandlerError;
use crate::handler::{Invocation, panic_message};
use crate::registry::ListenerRegistry;
use mirai_core::{BoxedBot, BoxedEvent};

/// Routes events to listeners and tracks the tasks it spawns.
#[derive(Clone, Default)]
pub struct Dispatcher {
    registry: Arc<RwLock<ListenerRegistry>>,
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl Dispatcher {
    /// Creates a dispatcher with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with mutable access to the registry.
    pub fn registry_mut<R>(&self, f: impl FnOnce(&mut ListenerRegistry) -> R) -> R {
        f(&mut self.registry.write())
    }

    /// Returns the total number of registered entries.
    pub fn listener_count(&self) -> usize {
        self.registry.read().len()
    }

    /// Dispatches one event and returns how many listeners were invoked.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, event: BoxedEvent, bot: BoxedBot) -> usize {
        let event_name = event.event_name();
        let listeners = self.registry.read().get(event_name).to_vec();
        if listeners.is_empty() {
            trace!(event = event_name, "No listeners");
            return 0;
        }

        let ctx = DispatchContext::new(event, bot);
        let mut invoked = 0;

        for (index, listener) in listeners.iter().enumerate() {
            let side = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.run_side_callback(ctx.raw())
            }));
            if let Err(panic) = side {
                observe(event_name, Err(HandlerError::Panic(panic_message(panic.as_ref()))));
                continue;
            }

            match listener.handler().bind(&ctx) {
                Err(e) => {
                    trace!(event = event_name, listener = index, reason = %e, "Listener skipped");
                }
                Ok(Invocation::Completed(result)) => {
                    invoked += 1;
                    observe(event_name, result);
                }
                Ok(Invocation::Pending(fut)) => {
                    invoked += 1;
                    let mut tasks = self.tasks.lock();
                    while tasks.try_join_next().is_some() {}
                    tasks.spawn(async move {
                        let result = match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                            Ok(result) => result,
                            Err(panic) => Err(HandlerError::Panic(panic_message(panic.as_ref()))),
                        };
                        observe(event_name, result);
                    });
                }
            }
        }

        debug!(event = event_name, invoked, "Event dispatched");
        invoked
    }

    /// Waits for every spawned listener task to finish.
    pub async fn join_all(&self) {
        let mut tasks = std::mem::take(&mut *self.tasks.lock());
        while tasks.join_next().await.is_some() {}
    }

    /// Aborts every spawned listener task that is still running.
    pub fn abort_all(&self) {
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() {
            debug!(count = tasks.len(), "Cancelling listener tasks");
        }
        tasks.abort_all();
    }
}

fn observe(event: &'static str, result: Result<(), HandlerError>) {
    match result {
        Ok(()) => {}
        Err(e) if e.is_domain() => warn!(event, error = %e, "Listener failed"),
        Err(e) => error!(event, error = %e, "Listener failed"),
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use mirai_core::{ApiError, ApiResult, Bot, Event};
    use serde_json::{Value, json};

    use super::*;
    use crate::error::ExtractError;
    use crate::extractor::{FromContext, Raw};
    use crate::registry::Listener;

    struct TestEvent {
        name: &'static str,
        raw: Value,
    }

    impl Event for TestEvent {
        fn event_name(&self) -> &'static str {
            self.name
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn raw_json(&self) -> Option<&Value> {
            Some(&self.raw)
        }
    }

    struct MockBot;

    #[async_trait]
    impl Bot for MockBot {
        fn id(&self) -> &str {
            "test-bot"
        }

        async fn call_api(&self, _: &str, _: Option<&str>, _: Value) -> ApiResult<Value> {
            Err(ApiError::NotConnected)
        }

        fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    fn mock_bot() -> BoxedBot {
        Arc::new(MockBot)
    }

    fn event(name: &'static str) -> BoxedEvent {
        BoxedEvent::new(TestEvent {
            name,
            raw: json!({"type": name, "fromId": 42}),
        })
    }

    /// Binds only when the payload has a `group` field.
    struct NeedsGroup;

    impl FromContext for NeedsGroup {
        fn from_context(ctx: &DispatchContext) -> Result<Self, ExtractError> {
            ctx.field("/group")
                .map(|_| NeedsGroup)
                .ok_or(ExtractError::MissingField { expected: "NeedsGroup" })
        }
    }

    #[tokio::test]
    async fn test_dispatch_no_listeners() {
        let dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.dispatch(event("GroupMessage"), mock_bot()), 0);
    }

    #[tokio::test]
    async fn test_registrations_fire_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new();

        dispatcher.registry_mut(|r| {
            for i in 0..3 {
                let order = Arc::clone(&order);
                r.register_sync("GroupMessage", move || order.lock().push(i));
            }
        });

        assert_eq!(dispatcher.dispatch(event("GroupMessage"), mock_bot()), 3);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_async_listeners_are_spawned() {
        let counter = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new();

        dispatcher.registry_mut(|r| {
            for _ in 0..2 {
                let c = Arc::clone(&counter);
                r.register(["GroupMessage", "FriendMessage"], move || {
                    let c = Arc::clone(&c);
                    async move {
                        c.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        dispatcher.dispatch(event("GroupMessage"), mock_bot());
        dispatcher.dispatch(event("FriendMessage"), mock_bot());
        dispatcher.dispatch(event("TempMessage"), mock_bot());
        dispatcher.join_all().await;

        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_unbindable_listener_is_skipped() {
        let counter = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new();

        let required = Arc::clone(&counter);
        let optional = Arc::clone(&counter);
        dispatcher.registry_mut(|r| {
            r.register_sync("NudgeEvent", move |_: NeedsGroup| {
                required.fetch_add(100, Ordering::SeqCst);
            });
            r.register_sync("NudgeEvent", move |group: Option<NeedsGroup>, raw: Raw| {
                assert!(group.is_none());
                assert_eq!(raw["fromId"], 42);
                optional.fetch_add(1, Ordering::SeqCst);
            });
        });

        assert_eq!(dispatcher.dispatch(event("NudgeEvent"), mock_bot()), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_side_callback_runs_before_binding() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new();

        let sink = Arc::clone(&seen);
        dispatcher.registry_mut(|r| {
            r.register_with(
                "NudgeEvent",
                Listener::sync(|_: NeedsGroup| {})
                    .side_callback(move |raw, args| {
                        sink.lock().push((raw["fromId"].clone(), args.to_vec()));
                    })
                    .side_args([json!("extra")]),
            );
        });

        assert_eq!(dispatcher.dispatch(event("NudgeEvent"), mock_bot()), 0);
        assert_eq!(*seen.lock(), vec![(json!(42), vec![json!("extra")])]);
    }

    #[tokio::test]
    async fn test_panicking_side_callback_skips_only_its_listener() {
        let counter = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new();

        let skipped = Arc::clone(&counter);
        let next = Arc::clone(&counter);
        dispatcher.registry_mut(|r| {
            r.register_with(
                "GroupMessage",
                Listener::sync(move || {
                    skipped.fetch_add(100, Ordering::SeqCst);
                })
                .side_callback(|_, _| panic!("side callback bug")),
            );
            r.register_sync("GroupMessage", move || {
                next.fetch_add(1, Ordering::SeqCst);
            });
        });

        assert_eq!(dispatcher.dispatch(event("GroupMessage"), mock_bot()), 1);
        assert_eq!(dispatcher.dispatch(event("GroupMessage"), mock_bot()), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_do_not_escape() {
        let counter = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new();

        let after = Arc::clone(&counter);
        dispatcher.registry_mut(|r| {
            r.register("GroupMessage", || async { Err::<(), _>(ApiError::BotMuted("muted".into())) });
            r.register("GroupMessage", |bot: BoxedBot| async move {
                bot.call_api("sendGroupMessage", None, Value::Null).await.map(|_| ())
            });
            r.register("GroupMessage", || async { panic!("listener bug") as () });
            r.register_sync("GroupMessage", || -> Result<(), HandlerError> { Err("sync failure".into()) });
            r.register_sync("GroupMessage", move || {
                after.fetch_add(1, Ordering::SeqCst);
            });
        });

        assert_eq!(dispatcher.dispatch(event("GroupMessage"), mock_bot()), 5);
        dispatcher.join_all().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_abort_all_cancels_tasks() {
        let counter = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new();

        let c = Arc::clone(&counter);
        dispatcher.registry_mut(|r| {
            r.register("GroupMessage", move || {
                let c = Arc::clone(&c);
                async move {
                    tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                    c.fetch_add(1, Ordering::SeqCst);
                }
            });
        });

        dispatcher.dispatch(event("GroupMessage"), mock_bot());
        dispatcher.abort_all();
        dispatcher.join_all().await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
