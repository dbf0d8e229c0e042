//! The bot session.
//!
//! [`MiraiBot`] owns one live connection at a time, authenticates it, keeps it
//! alive with a heartbeat and correlates command responses. Typed commands
//! live in [`commands`](crate::commands) and [`upload`](crate::upload).
//!
//! # Usage
//!
//! ```rust,ignore
//! use mirai_adapter_api_http::{MiraiBot, MiraiConfig};
//!
//! let bot = MiraiBot::new(MiraiConfig::new("127.0.0.1", 8080, 10001, "key"))?;
//! bot.connect().await?;
//! bot.send_group_message(123456_i64, "hello", None).await?;
//! bot.close();
//! ```

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use mirai_core::{
    ApiError, ApiResult, Bot, ConnectionHandle, ErrorClass, RetryPolicy, TransportError,
};
use mirai_framework::Dispatcher;
use mirai_transport::{HttpClient, WsClient};

use crate::adapter::MiraiConnectionHandler;
use crate::config::MiraiConfig;
use crate::correlation::CorrelationNamespace;
use crate::frame::{OutgoingFrame, decode_response};
use crate::router::ResponseRouter;

/// Lifecycle of the session's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection.
    #[default]
    Disconnected,
    /// Connected, waiting for the handshake reply.
    Unauthenticated,
    /// Verified; commands may be sent.
    Ready,
    /// Closed for good.
    Closed,
}

#[derive(Default)]
struct SessionState {
    status: ConnectionState,
    connection: Option<ConnectionHandle>,
    session_key: Option<String>,
    heartbeat: Option<CancellationToken>,
    handshake: Option<oneshot::Sender<Value>>,
}

impl SessionState {
    /// Drops the current connection record, returning its handle.
    fn detach(&mut self) -> Option<ConnectionHandle> {
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.cancel();
        }
        self.handshake = None;
        self.session_key = None;
        self.connection.take()
    }
}

/// A mirai-api-http bot session.
pub struct MiraiBot {
    id: String,
    config: MiraiConfig,
    retry: RetryPolicy,
    namespace: CorrelationNamespace,
    pub(crate) router: ResponseRouter,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) http: HttpClient,
    state: Mutex<SessionState>,
    connect_lock: tokio::sync::Mutex<()>,
    generation: AtomicU64,
    online: AtomicBool,
    closed: AtomicBool,
    closed_tx: watch::Sender<bool>,
    weak: Weak<MiraiBot>,
}

impl std::fmt::Debug for MiraiBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiraiBot")
            .field("account", &self.config.account)
            .field("url", &self.config.ws_url())
            .field("state", &self.state())
            .finish()
    }
}

impl MiraiBot {
    /// Creates a session with its own dispatcher.
    pub fn new(config: MiraiConfig) -> ApiResult<Arc<Self>> {
        Self::with_dispatcher(config, Dispatcher::new())
    }

    /// Creates a session dispatching pushes through `dispatcher`.
    pub fn with_dispatcher(config: MiraiConfig, dispatcher: Dispatcher) -> ApiResult<Arc<Self>> {
        let http = HttpClient::new(config.http_client_config())?;
        let retry = config.retry.to_policy();
        let (closed_tx, _) = watch::channel(false);

        Ok(Arc::new_cyclic(|weak| Self {
            id: config.account.to_string(),
            config,
            retry,
            namespace: CorrelationNamespace::new(),
            router: ResponseRouter::new(),
            dispatcher,
            http,
            state: Mutex::new(SessionState::default()),
            connect_lock: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
            online: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            closed_tx,
            weak: weak.clone(),
        }))
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &MiraiConfig {
        &self.config
    }

    /// Returns the bot account id.
    pub fn account(&self) -> i64 {
        self.config.account
    }

    /// Returns the dispatcher pushes are routed through.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the connection state.
    pub fn state(&self) -> ConnectionState {
        self.state.lock().status
    }

    /// Returns `true` while a verified connection is open.
    pub fn is_ready(&self) -> bool {
        self.ready_connection().is_ok()
    }

    /// Returns `true` after [`close`](Self::close).
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns the session key of the current connection.
    pub fn session_key(&self) -> Option<String> {
        self.state.lock().session_key.clone()
    }

    /// Whether the gateway last reported this account online.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    pub(crate) fn set_online(&self, online: bool) {
        let previous = self.online.swap(online, Ordering::AcqRel);
        if previous != online {
            info!(account = %self.id, online = online, "Bot online state changed");
        }
    }

    /// Waits until the session is closed.
    pub async fn wait_closed(&self) {
        let mut rx = self.closed_tx.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    // =========================================================================
    // Connection lifecycle
    // =========================================================================

    /// Opens the channel and performs the handshake.
    ///
    /// Does nothing if the session is already ready. A rejected handshake
    /// closes the fresh connection and fails with [`ApiError::Verify`]. A
    /// connection that drops before the session is marked ready fails with
    /// [`TransportError::ConnectionClosed`].
    pub async fn connect(&self) -> ApiResult<()> {
        let _guard = self.connect_lock.lock().await;

        if self.is_closed() {
            return Err(ApiError::SessionInvalid("session is closed".into()));
        }
        if self.ready_connection().is_ok() {
            return Ok(());
        }

        let stale = self.state.lock().detach();
        if let Some(stale) = stale {
            stale.close();
        }

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let (handshake_tx, handshake_rx) = oneshot::channel();
        {
            let mut state = self.state.lock();
            state.status = ConnectionState::Unauthenticated;
            state.handshake = Some(handshake_tx);
        }

        let ws_config = self.config.ws_client_config();
        info!(account = %self.id, url = %ws_config.url, "Connecting to gateway");

        let handler = Arc::new(MiraiConnectionHandler::new(self.weak.clone(), generation));
        let connection = match WsClient::new().connect(&ws_config, handler).await {
            Ok(connection) => connection,
            Err(e) => {
                self.reset_state(generation);
                return Err(e.into());
            }
        };
        self.state.lock().connection = Some(connection.clone());

        let reply = match tokio::time::timeout(self.config.handshake_timeout(), handshake_rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => {
                self.reset_state(generation);
                return Err(TransportError::ConnectionClosed {
                    reason: "closed before handshake".into(),
                }
                .into());
            }
            Err(_) => {
                connection.close();
                self.reset_state(generation);
                return Err(TransportError::ConnectionFailed {
                    url: ws_config.url,
                    reason: "handshake timed out".into(),
                }
                .into());
            }
        };

        let data = reply.get("data").unwrap_or(&Value::Null);
        let code = data.get("code").and_then(Value::as_i64);
        if code != Some(0) {
            let message = data
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or("handshake rejected")
                .to_string();
            error!(account = %self.id, code = ?code, msg = %message, "Verification failed");
            connection.close();
            self.reset_state(generation);
            return Err(ApiError::Verify(message));
        }

        let session_key = data
            .get("session")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        {
            let mut state = self.state.lock();
            let live = self.generation.load(Ordering::Acquire) == generation
                && state.status == ConnectionState::Unauthenticated
                && state.connection.as_ref().is_some_and(|c| !c.is_closed());
            if live {
                state.status = ConnectionState::Ready;
                state.session_key = Some(session_key);
                state.heartbeat = self
                    .config
                    .heartbeat_interval()
                    .map(|interval| spawn_heartbeat(self.id.clone(), connection.clone(), interval));
            }
            drop(state);

            if !live {
                warn!(account = %self.id, "Connection dropped right after verification");
                connection.close();
                self.reset_state(generation);
                return Err(TransportError::ConnectionClosed {
                    reason: "closed after handshake".into(),
                }
                .into());
            }
        }
        info!(account = %self.id, "Session verified");
        Ok(())
    }

    /// Closes the session.
    ///
    /// Stops the heartbeat, closes the channel and fails every pending
    /// command. Returns `false` if the session was already closed.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }

        let connection = {
            let mut state = self.state.lock();
            state.status = ConnectionState::Closed;
            state.detach()
        };
        if let Some(connection) = connection {
            connection.close();
        }
        self.router.fail_all();
        self.online.store(false, Ordering::Release);
        self.closed_tx.send_replace(true);

        info!(account = %self.id, "Session closed");
        true
    }

    /// Hands the handshake waiter of `generation` to the connection handler.
    pub(crate) fn take_handshake(&self, generation: u64) -> Option<oneshot::Sender<Value>> {
        if self.generation.load(Ordering::Acquire) != generation {
            return None;
        }
        self.state.lock().handshake.take()
    }

    /// Called by the connection handler when the transport task of
    /// `generation` ends.
    pub(crate) fn connection_lost(&self, generation: u64) {
        if self.generation.load(Ordering::Acquire) != generation {
            trace!(account = %self.id, generation = generation, "Stale connection ended");
            return;
        }

        let was_ready = {
            let mut state = self.state.lock();
            let was_ready = state.status == ConnectionState::Ready;
            if state.status != ConnectionState::Closed {
                state.status = ConnectionState::Disconnected;
            }
            state.detach();
            was_ready
        };
        self.router.fail_all();

        if was_ready && !self.is_closed() {
            warn!(account = %self.id, "Connection to gateway lost");
            if let Some(bot) = self.weak.upgrade() {
                bot.spawn_recovery();
            }
        }
    }

    /// Reconnects in the background after a ready connection dropped.
    ///
    /// The session is closed once the retry attempts are exhausted.
    fn spawn_recovery(self: Arc<Self>) {
        tokio::spawn(async move {
            let result = self
                .retry
                .run("reconnect", || self.reconnect(), || async { Ok(()) })
                .await;

            match result {
                Ok(()) => info!(account = %self.id, "Session recovered"),
                Err(e) if self.is_closed() => {
                    debug!(account = %self.id, error = %e, "Recovery stopped, session closed");
                }
                Err(e) => {
                    error!(account = %self.id, error = %e, "Could not reconnect to gateway, closing session");
                    self.close();
                }
            }
        });
    }

    fn reset_state(&self, generation: u64) {
        if self.generation.load(Ordering::Acquire) != generation {
            return;
        }
        let mut state = self.state.lock();
        if state.status != ConnectionState::Closed {
            state.status = ConnectionState::Disconnected;
        }
        state.detach();
    }

    fn ready_connection(&self) -> ApiResult<ConnectionHandle> {
        let state = self.state.lock();
        match (&state.status, &state.connection) {
            (ConnectionState::Ready, Some(connection)) if !connection.is_closed() => {
                Ok(connection.clone())
            }
            _ => Err(ApiError::NotConnected),
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Issues a command under the retry envelope and returns its unwrapped result.
    ///
    /// Connection failures reconnect and retry the same command; once the
    /// attempts are exhausted the session is closed and the error returned.
    pub async fn call(
        &self,
        command: &str,
        sub_command: Option<&str>,
        content: Value,
    ) -> ApiResult<Value> {
        if self.is_closed() {
            return Err(ApiError::NotConnected);
        }

        let result = self
            .retry
            .run(
                command,
                || self.call_once(command, sub_command, &content),
                || self.reconnect(),
            )
            .await;

        if let Err(e) = &result
            && !self.is_closed()
            && (e.class() == ErrorClass::Connect || matches!(e, ApiError::Verify(_)))
        {
            error!(account = %self.id, command = %command, error = %e, "Giving up on gateway, closing session");
            self.close();
        }
        result
    }

    async fn call_once(
        &self,
        command: &str,
        sub_command: Option<&str>,
        content: &Value,
    ) -> ApiResult<Value> {
        let connection = self.ready_connection()?;
        let sync_id = self.namespace.next();
        let text = OutgoingFrame::new(sync_id.as_str(), command, sub_command, content.clone()).to_text()?;

        debug!(account = %self.id, command = %command, sync_id = %sync_id, "Sending command");
        connection.send(text).await?;

        let frame = self
            .router
            .await_response(&sync_id, self.config.api_timeout())
            .await?;
        trace!(sync_id = %sync_id, response = %frame, "Command response");
        decode_response(&frame)
    }

    async fn reconnect(&self) -> ApiResult<()> {
        info!(account = %self.id, "Reconnecting to gateway");
        self.connect().await
    }
}

fn spawn_heartbeat(account: String, connection: ConnectionHandle, interval: Duration) -> CancellationToken {
    let token = CancellationToken::new();
    let cancelled = token.clone();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancelled.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = connection.ping().await {
                        debug!(account = %account, error = %e, "Heartbeat stopped, connection gone");
                        break;
                    }
                    trace!(account = %account, "Heartbeat sent");
                }
            }
        }
    });

    token
}

// =============================================================================
// Bot Trait Implementation
// =============================================================================

#[async_trait]
impl Bot for MiraiBot {
    fn id(&self) -> &str {
        &self.id
    }

    async fn call_api(
        &self,
        command: &str,
        sub_command: Option<&str>,
        content: Value,
    ) -> ApiResult<Value> {
        self.call(command, sub_command, content).await
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    async fn on_disconnect(&self) {
        self.router.fail_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_session_is_disconnected() {
        let bot = MiraiBot::new(MiraiConfig::new("127.0.0.1", 1, 10001, "key")).unwrap();
        assert_eq!(bot.state(), ConnectionState::Disconnected);
        assert_eq!(bot.id(), "10001");
        assert!(!bot.is_online());
        assert!(bot.session_key().is_none());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let bot = MiraiBot::new(MiraiConfig::default()).unwrap();
        assert!(bot.close());
        assert!(!bot.close());
        assert_eq!(bot.state(), ConnectionState::Closed);
        bot.wait_closed().await;

        assert!(matches!(
            bot.call("friendList", None, Value::Null).await,
            Err(ApiError::NotConnected)
        ));
        assert!(matches!(bot.connect().await, Err(ApiError::SessionInvalid(_))));
    }
}
