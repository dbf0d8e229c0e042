//! Routes inbound frames to push handling or to the command awaiting them.
//!
//! A response can arrive before its caller starts waiting (or while another
//! caller is waiting on a different token). Such frames are parked in a
//! bounded buffer until their own caller asks for them.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use mirai_core::{ApiError, ApiResult};

use crate::frame::Inbound;

/// Default number of unclaimed responses kept around.
pub const DEFAULT_BUFFER_CAPACITY: usize = 256;

/// Outcome of [`ResponseRouter::route`].
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    /// A push frame; carries its `data` payload for the event path.
    Push(Value),
    /// Handed to the caller waiting on this token.
    Resolved,
    /// Nobody is waiting yet; kept for a later `await_response`.
    Buffered,
    /// Not a frame this client understands.
    Discarded,
}

#[derive(Default)]
struct RouterState {
    waiters: HashMap<String, oneshot::Sender<Value>>,
    buffered: VecDeque<(String, Value)>,
}

/// Correlates responses with pending commands.
pub struct ResponseRouter {
    state: Mutex<RouterState>,
    capacity: usize,
}

impl Default for ResponseRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseRouter {
    /// Creates a router with [`DEFAULT_BUFFER_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    /// Creates a router keeping at most `capacity` unclaimed responses.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(RouterState::default()),
            capacity: capacity.max(1),
        }
    }

    /// Routes one parsed inbound frame.
    pub fn route(&self, frame: Value) -> Routed {
        match Inbound::classify(frame) {
            Inbound::Push(data) => Routed::Push(data),
            Inbound::Unrecognized(frame) => {
                warn!(frame = %frame, "Discarding frame without syncId");
                Routed::Discarded
            }
            Inbound::Response { sync_id, frame } => {
                let mut state = self.state.lock();
                let frame = match state.waiters.remove(&sync_id) {
                    Some(tx) => match tx.send(frame) {
                        Ok(()) => {
                            trace!(sync_id = %sync_id, "Response delivered");
                            return Routed::Resolved;
                        }
                        // The waiter gave up between lookup and send.
                        Err(frame) => frame,
                    },
                    None => frame,
                };

                if state.buffered.len() >= self.capacity
                    && let Some((evicted, _)) = state.buffered.pop_front()
                {
                    warn!(sync_id = %evicted, "Response buffer full, dropping oldest unclaimed response");
                }
                trace!(sync_id = %sync_id, "Response buffered");
                state.buffered.push_back((sync_id, frame));
                Routed::Buffered
            }
        }
    }

    /// Waits for the response carrying `sync_id`.
    ///
    /// Returns at once if the frame is already buffered. `timeout` of `None`
    /// waits until the frame arrives or the connection is lost.
    pub async fn await_response(&self, sync_id: &str, timeout: Option<Duration>) -> ApiResult<Value> {
        let rx = {
            let mut state = self.state.lock();
            if let Some(pos) = state.buffered.iter().position(|(id, _)| id == sync_id)
                && let Some((_, frame)) = state.buffered.remove(pos)
            {
                return Ok(frame);
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.insert(sync_id.to_string(), tx);
            rx
        };

        let received = match timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    self.state.lock().waiters.remove(sync_id);
                    debug!(sync_id = %sync_id, timeout = ?limit, "Response timed out");
                    return Err(ApiError::Timeout);
                }
            },
            None => rx.await,
        };

        received.map_err(|_| ApiError::NotConnected)
    }

    /// Drops every waiter (they observe [`ApiError::NotConnected`]) and clears the buffer.
    pub fn fail_all(&self) {
        let mut state = self.state.lock();
        let count = state.waiters.len();
        state.waiters.clear();
        state.buffered.clear();
        if count > 0 {
            debug!(count = count, "Failed pending commands due to disconnect");
        }
    }

    /// Number of callers currently waiting.
    pub fn pending_count(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Number of responses nobody has claimed yet.
    pub fn buffered_count(&self) -> usize {
        self.state.lock().buffered.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    fn response(id: &str, n: i64) -> Value {
        json!({"syncId": id, "data": {"code": 0, "msg": "", "n": n}})
    }

    #[test]
    fn test_push_and_discard() {
        let router = ResponseRouter::new();
        assert_eq!(
            router.route(json!({"syncId": "-1", "data": {"type": "FriendMessage"}})),
            Routed::Push(json!({"type": "FriendMessage"}))
        );
        assert_eq!(router.route(json!({"data": {}})), Routed::Discarded);
        assert_eq!(router.buffered_count(), 0);
    }

    #[tokio::test]
    async fn test_buffered_before_await() {
        let router = ResponseRouter::new();
        assert_eq!(router.route(response("3", 3)), Routed::Buffered);
        let frame = router.await_response("3", None).await.unwrap();
        assert_eq!(frame["data"]["n"], 3);
        assert_eq!(router.buffered_count(), 0);
    }

    #[tokio::test]
    async fn test_interleaved_responses() {
        let router = Arc::new(ResponseRouter::new());

        let r = Arc::clone(&router);
        let first = tokio::spawn(async move { r.await_response("1", Some(Duration::from_secs(5))).await });
        while router.pending_count() == 0 {
            tokio::task::yield_now().await;
        }

        // The second command's answer arrives first and must stay retrievable.
        assert_eq!(router.route(response("2", 2)), Routed::Buffered);
        assert_eq!(router.route(response("1", 1)), Routed::Resolved);

        assert_eq!(first.await.unwrap().unwrap()["data"]["n"], 1);
        let second = router.await_response("2", Some(Duration::from_secs(5))).await.unwrap();
        assert_eq!(second["data"]["n"], 2);
    }

    #[tokio::test]
    async fn test_pushes_between_responses_do_not_disturb_waiter() {
        let router = Arc::new(ResponseRouter::new());

        let r = Arc::clone(&router);
        let waiter = tokio::spawn(async move { r.await_response("7", Some(Duration::from_secs(5))).await });
        while router.pending_count() == 0 {
            tokio::task::yield_now().await;
        }

        let push = json!({"syncId": "-1", "data": {"type": "NudgeEvent", "fromId": 1}});
        assert!(matches!(router.route(push.clone()), Routed::Push(_)));
        assert_eq!(router.route(response("6", 6)), Routed::Buffered);
        assert!(matches!(router.route(push.clone()), Routed::Push(_)));
        assert_eq!(router.route(response("8", 8)), Routed::Buffered);
        assert!(matches!(router.route(push), Routed::Push(_)));
        assert_eq!(router.pending_count(), 1);

        assert_eq!(router.route(response("7", 7)), Routed::Resolved);
        assert_eq!(waiter.await.unwrap().unwrap()["data"]["n"], 7);
        assert_eq!(router.buffered_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_removes_waiter() {
        let router = ResponseRouter::new();
        let result = router.await_response("9", Some(Duration::from_millis(50))).await;
        assert!(matches!(result, Err(ApiError::Timeout)));
        assert_eq!(router.pending_count(), 0);

        // A late answer is only buffered.
        assert_eq!(router.route(response("9", 9)), Routed::Buffered);
    }

    #[tokio::test]
    async fn test_fail_all_yields_not_connected() {
        let router = Arc::new(ResponseRouter::new());
        let r = Arc::clone(&router);
        let waiter = tokio::spawn(async move { r.await_response("4", None).await });
        while router.pending_count() == 0 {
            tokio::task::yield_now().await;
        }
        router.fail_all();
        assert!(matches!(waiter.await.unwrap(), Err(ApiError::NotConnected)));
    }

    #[test]
    fn test_buffer_evicts_oldest() {
        let router = ResponseRouter::with_capacity(2);
        router.route(response("1", 1));
        router.route(response("2", 2));
        router.route(response("3", 3));
        assert_eq!(router.buffered_count(), 2);
        let state = router.state.lock();
        let ids: Vec<_> = state.buffered.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["2", "3"]);
    }
}
