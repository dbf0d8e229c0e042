//! WebSocket client transport.

use std::sync::Arc;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info, trace, warn};

use mirai_core::{
    ConnectionHandle, ConnectionHandler, Outgoing, TransportError, TransportResult,
    WsClientConfig,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// WebSocket client.
///
/// Every call to [`connect`](Self::connect) opens a fresh, single-use
/// connection. Reconnecting is up to the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsClient;

impl WsClient {
    /// Creates a new WebSocket client.
    pub fn new() -> Self {
        Self
    }

    /// Opens a connection and spawns its transport task.
    ///
    /// Frames received on the connection are passed to `handler` in arrival
    /// order; `handler.on_disconnect` runs exactly once when the task ends.
    pub async fn connect(
        &self,
        config: &WsClientConfig,
        handler: Arc<dyn ConnectionHandler>,
    ) -> TransportResult<ConnectionHandle> {
        let url = config.url.clone();

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::InvalidConfig(format!("invalid url {url}: {e}")))?;
        for (name, value) in &config.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidConfig(format!("header {name}: {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidConfig(format!("header {name}: {e}")))?;
            request.headers_mut().insert(header_name, header_value);
        }

        info!(url = %url, "Connecting to WebSocket server");

        let (ws_stream, _response) =
            connect_async(request)
                .await
                .map_err(|e| TransportError::ConnectionFailed {
                    url: url.clone(),
                    reason: format!("WebSocket connection failed: {e}"),
                })?;
        let (ws_tx, ws_rx) = ws_stream.split();

        let (message_tx, message_rx) = mpsc::channel::<Outgoing>(config.queue_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let conn_id = format!("ws-{url}");
        info!(conn_id = %conn_id, "WebSocket client connected");

        let handle = ConnectionHandle::new(conn_id.clone(), message_tx, shutdown_tx);

        tokio::spawn(run_client_loop(
            ws_tx,
            ws_rx,
            message_rx,
            shutdown_rx,
            handler,
            conn_id,
        ));

        Ok(handle)
    }
}

/// Runs the WebSocket client loop until shutdown, error or remote close.
async fn run_client_loop(
    mut ws_tx: WsSink,
    mut ws_rx: WsSource,
    mut message_rx: mpsc::Receiver<Outgoing>,
    mut shutdown_rx: watch::Receiver<bool>,
    handler: Arc<dyn ConnectionHandler>,
    conn_id: String,
) {
    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    info!(conn_id = %conn_id, "WebSocket client shutting down");
                    let _ = ws_tx.close().await;
                    break;
                }
            }

            Some(frame) = message_rx.recv() => {
                let msg = match frame {
                    Outgoing::Text(text) => Message::Text(text.into()),
                    Outgoing::Ping => Message::Ping(Default::default()),
                };
                if let Err(e) = ws_tx.send(msg).await {
                    warn!(conn_id = %conn_id, error = %e, "Failed to send frame");
                    handler.on_error(&conn_id, &e.to_string()).await;
                    break;
                }
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        trace!(conn_id = %conn_id, len = text.len(), "Received text");
                        handler.on_message(&conn_id, text.as_str()).await;
                    }
                    Some(Ok(Message::Binary(data))) => {
                        trace!(conn_id = %conn_id, len = data.len(), "Received binary");
                        match std::str::from_utf8(&data) {
                            Ok(text) => handler.on_message(&conn_id, text).await,
                            Err(e) => warn!(conn_id = %conn_id, error = %e, "Invalid UTF-8 in frame"),
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        trace!(conn_id = %conn_id, "Received ping, sending pong");
                        let _ = ws_tx.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) => {
                        trace!(conn_id = %conn_id, "Received pong");
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!(conn_id = %conn_id, frame = ?frame, "Server closed connection");
                        break;
                    }
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => {
                        warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                        handler.on_error(&conn_id, &e.to_string()).await;
                        break;
                    }
                    None => {
                        info!(conn_id = %conn_id, "WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    // Handles observe the closed queue before the disconnect callback runs.
    message_rx.close();
    debug!(conn_id = %conn_id, "Transport task finished");
    handler.on_disconnect(&conn_id).await;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::net::TcpListener;
    use tokio::sync::{mpsc, oneshot};
    use tokio_tungstenite::accept_hdr_async;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    use super::*;

    struct Recorder {
        frames: mpsc::UnboundedSender<String>,
        disconnects: mpsc::UnboundedSender<()>,
    }

    #[async_trait]
    impl ConnectionHandler for Recorder {
        async fn on_message(&self, _conn_id: &str, data: &str) {
            let _ = self.frames.send(data.to_string());
        }

        async fn on_disconnect(&self, _conn_id: &str) {
            let _ = self.disconnects.send(());
        }

        async fn on_error(&self, _conn_id: &str, _error: &str) {}
    }

    #[tokio::test]
    async fn test_headers_and_echo() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (header_tx, header_rx) = oneshot::channel::<Option<String>>();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let callback = move |req: &Request, resp: Response| {
                let key = req
                    .headers()
                    .get("verifyKey")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let _ = header_tx.send(key);
                Ok::<_, ErrorResponse>(resp)
            };
            let mut ws = accept_hdr_async(stream, callback).await.unwrap();
            while let Some(Ok(msg)) = ws.next().await {
                if msg.is_text() {
                    ws.send(msg).await.unwrap();
                }
            }
        });

        let (frames_tx, mut frames_rx) = mpsc::unbounded_channel();
        let (disc_tx, mut disc_rx) = mpsc::unbounded_channel();
        let handler = Arc::new(Recorder {
            frames: frames_tx,
            disconnects: disc_tx,
        });

        let config = WsClientConfig::new(format!("ws://{addr}/all")).with_header("verifyKey", "secret");
        let handle = WsClient::new().connect(&config, handler).await.unwrap();

        assert_eq!(header_rx.await.unwrap().as_deref(), Some("secret"));

        handle.ping().await.unwrap();
        handle.send("hello".into()).await.unwrap();
        let echoed = tokio::time::timeout(Duration::from_secs(5), frames_rx.recv())
            .await
            .unwrap();
        assert_eq!(echoed.as_deref(), Some("hello"));

        assert!(handle.close());
        assert!(!handle.close());
        tokio::time::timeout(Duration::from_secs(5), disc_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_failed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (frames_tx, _frames_rx) = mpsc::unbounded_channel();
        let (disc_tx, _disc_rx) = mpsc::unbounded_channel();
        let handler = Arc::new(Recorder {
            frames: frames_tx,
            disconnects: disc_tx,
        });

        let result = WsClient::new()
            .connect(&WsClientConfig::new(format!("ws://{addr}/all")), handler)
            .await;
        assert!(matches!(result, Err(TransportError::ConnectionFailed { .. })));
    }
}
