//! Connection handling and lifecycle types.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::error::{TransportError, TransportResult};

// =============================================================================
// Connection Handler
// =============================================================================

/// A handler for connection lifecycle events.
///
/// The transport task calls these in the order frames arrive on the wire.
#[async_trait]
pub trait ConnectionHandler: Send + Sync {
    /// Called for every text frame received from the connection.
    async fn on_message(&self, conn_id: &str, data: &str);

    /// Called exactly once when the connection has ended, for any reason.
    async fn on_disconnect(&self, conn_id: &str);

    /// Called when a connection error occurs.
    async fn on_error(&self, conn_id: &str, error: &str);
}

/// Boxed connection handler.
pub type BoxedConnectionHandler = Arc<dyn ConnectionHandler>;

// =============================================================================
// Handles
// =============================================================================

/// A frame queued for the transport task.
#[derive(Debug, Clone)]
pub enum Outgoing {
    /// A text frame.
    Text(String),
    /// A keep-alive ping.
    Ping,
}

/// Handle to a client connection.
///
/// Cloning the handle shares the same underlying connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    /// Unique identifier for this connection.
    pub id: String,
    /// Sender for outgoing frames.
    message_tx: mpsc::Sender<Outgoing>,
    /// Shutdown signal sender.
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl ConnectionHandle {
    /// Creates a new connection handle.
    pub fn new(
        id: impl Into<String>,
        message_tx: mpsc::Sender<Outgoing>,
        shutdown_tx: watch::Sender<bool>,
    ) -> Self {
        Self {
            id: id.into(),
            message_tx,
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    /// Sends a text frame through this connection.
    pub async fn send(&self, text: String) -> TransportResult<()> {
        self.enqueue(Outgoing::Text(text)).await
    }

    /// Queues a keep-alive ping.
    pub async fn ping(&self) -> TransportResult<()> {
        self.enqueue(Outgoing::Ping).await
    }

    async fn enqueue(&self, frame: Outgoing) -> TransportResult<()> {
        if self.is_closed() {
            return Err(TransportError::ConnectionClosed {
                reason: "connection already closed".into(),
            });
        }
        self.message_tx
            .send(frame)
            .await
            .map_err(|_| TransportError::ConnectionClosed {
                reason: "transport task has exited".into(),
            })
    }

    /// Closes this connection.
    ///
    /// Returns `true` if this call initiated the close, `false` if the
    /// connection was already closing.
    pub fn close(&self) -> bool {
        self.shutdown_tx.send_if_modified(|closed| {
            if *closed {
                false
            } else {
                *closed = true;
                true
            }
        })
    }

    /// Returns `true` once the connection was closed locally or the transport task exited.
    pub fn is_closed(&self) -> bool {
        *self.shutdown_tx.borrow() || self.message_tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (tx, mut rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = ConnectionHandle::new("conn", tx, shutdown_tx);

        handle.send("hello".into()).await.unwrap();
        assert!(matches!(rx.recv().await, Some(Outgoing::Text(t)) if t == "hello"));

        assert!(handle.close());
        assert!(!handle.close());
        assert!(*shutdown_rx.borrow());
        assert!(handle.is_closed());
        assert!(handle.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_send_after_task_exit_fails() {
        let (tx, rx) = mpsc::channel(4);
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        let handle = ConnectionHandle::new("conn", tx, shutdown_tx);
        drop(rx);

        assert!(handle.is_closed());
        assert!(matches!(
            handle.send("{}".into()).await,
            Err(TransportError::ConnectionClosed { .. })
        ));
    }
}
