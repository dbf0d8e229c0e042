//! Connection handler bridging the transport task and the session.
//!
//! Every inbound text frame arrives here in order. The first frame of a
//! connection is the handshake reply; afterwards responses go to the
//! [`ResponseRouter`](crate::router::ResponseRouter) and pushes are decoded and
//! dispatched:
//!
//! ```text
//! frame ─▶ route ─┬─ response ─▶ waiting command
//!                 └─ push ─▶ decode ─▶ self-originated? ─┬─ yes: track online state
//!                                                        └─ no:  Dispatcher
//! ```

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, trace, warn};

use mirai_core::{BoxedBot, BoxedEvent, ConnectionHandler};

use crate::bot::MiraiBot;
use crate::model::Incoming;
use crate::router::Routed;

/// Handler for one connection of a [`MiraiBot`].
pub(crate) struct MiraiConnectionHandler {
    bot: Weak<MiraiBot>,
    generation: u64,
}

impl MiraiConnectionHandler {
    pub(crate) fn new(bot: Weak<MiraiBot>, generation: u64) -> Self {
        Self { bot, generation }
    }
}

#[async_trait]
impl ConnectionHandler for MiraiConnectionHandler {
    async fn on_message(&self, conn_id: &str, data: &str) {
        let Some(bot) = self.bot.upgrade() else {
            trace!(conn_id = %conn_id, "Session dropped, ignoring frame");
            return;
        };

        let frame: Value = match serde_json::from_str(data) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, raw_data = %data, "Received invalid JSON frame");
                return;
            }
        };

        if let Some(handshake) = bot.take_handshake(self.generation) {
            let _ = handshake.send(frame);
            return;
        }

        if let Routed::Push(payload) = bot.router.route(frame) {
            handle_push(&bot, payload);
        }
    }

    async fn on_disconnect(&self, conn_id: &str) {
        debug!(conn_id = %conn_id, "Connection closed");
        if let Some(bot) = self.bot.upgrade() {
            bot.connection_lost(self.generation);
        }
    }

    async fn on_error(&self, conn_id: &str, error: &str) {
        warn!(conn_id = %conn_id, error = %error, "Connection error");
    }
}

/// Decodes a push payload and hands it to the dispatcher.
///
/// Pushes caused by the bot's own account never reach listeners; the bot's
/// own online/offline events only update [`MiraiBot::is_online`].
pub(crate) fn handle_push(bot: &Arc<MiraiBot>, payload: Value) -> usize {
    let incoming = match Incoming::decode(&payload) {
        Ok(incoming) => incoming,
        Err(e) => {
            error!(account = bot.account(), error = %e, payload = %payload, "Failed to decode push");
            return 0;
        }
    };
    let kind = incoming.kind();

    if incoming.origin_id() == Some(bot.account()) {
        if let Some(online) = incoming.as_event().and_then(|e| e.online_transition()) {
            bot.set_online(online);
        }
        debug!(account = bot.account(), kind = kind, "Suppressed self-originated push");
        return 0;
    }

    let invoked = bot
        .dispatcher
        .dispatch(BoxedEvent::new(incoming), Arc::clone(bot) as BoxedBot);
    if invoked > 0 {
        info!(account = bot.account(), kind = kind, listeners = invoked, "Dispatched push");
    } else {
        trace!(account = bot.account(), kind = kind, "Push had no listeners");
    }
    invoked
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::config::MiraiConfig;
    use crate::model::{FriendMessage, NudgeEvent};

    const ACCOUNT: i64 = 10001;

    fn bot() -> Arc<MiraiBot> {
        MiraiBot::new(MiraiConfig::new("127.0.0.1", 1, ACCOUNT, "key")).unwrap()
    }

    fn nudge(from_id: i64) -> Value {
        json!({
            "type": "NudgeEvent",
            "fromId": from_id,
            "subject": {"id": 123, "kind": "Group"},
            "action": "poke",
            "suffix": "",
            "target": 20002
        })
    }

    #[tokio::test]
    async fn test_self_originated_push_is_suppressed() {
        let bot = bot();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        bot.dispatcher().registry_mut(|r| {
            r.register_sync("NudgeEvent", move |_: NudgeEvent| {
                c.fetch_add(1, Ordering::SeqCst);
            });
        });

        assert_eq!(handle_push(&bot, nudge(ACCOUNT)), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        assert_eq!(handle_push(&bot, nudge(30003)), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_own_lifecycle_events_track_online_state() {
        let bot = bot();
        handle_push(&bot, json!({"type": "BotOnlineEvent", "qq": ACCOUNT}));
        assert!(bot.is_online());
        handle_push(&bot, json!({"type": "BotOfflineEventDropped", "qq": ACCOUNT}));
        assert!(!bot.is_online());

        // Another account's lifecycle is an ordinary event.
        handle_push(&bot, json!({"type": "BotOnlineEvent", "qq": 42}));
        assert!(!bot.is_online());
    }

    #[tokio::test]
    async fn test_message_dispatch_and_unknown_type() {
        let bot = bot();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        bot.dispatcher().registry_mut(|r| {
            r.register_sync("FriendMessage", move |msg: FriendMessage| {
                assert_eq!(msg.message_chain.to_text(), "hi");
                c.fetch_add(1, Ordering::SeqCst);
            });
        });

        let message = json!({
            "type": "FriendMessage",
            "sender": {"id": 30003, "nickname": "n", "remark": ""},
            "messageChain": [{"type": "Source", "id": 1, "time": 0}, {"type": "Plain", "text": "hi"}]
        });
        assert_eq!(handle_push(&bot, message), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        assert_eq!(handle_push(&bot, json!({"type": "NoSuchEvent"})), 0);
    }
}
