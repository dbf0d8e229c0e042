//! # Mirai Transport
//!
//! Network transport implementations for the mirai SDK.
//!
//! ## Features
//!
//! - `ws-client` (default): WebSocket client used for the `/all` channel
//! - `http-client`: HTTP client used for multipart media uploads
//! - `full`: Both
//!
//! ```text
//! ┌─────────────────────┐
//! │  Adapter Layer      │  (api-http)
//! ├─────────────────────┤
//! │  mirai-core         │  (ConnectionHandle, ConnectionHandler)
//! ├─────────────────────┤
//! │  mirai-transport    │  <- This crate
//! ├─────────────────────┤
//! │  Network (TCP/HTTP) │
//! └─────────────────────┘
//! ```
//!
//! ```rust,ignore
//! use mirai_transport::WsClient;
//! use mirai_core::WsClientConfig;
//!
//! let config = WsClientConfig::new("ws://127.0.0.1:8080/all")
//!     .with_header("verifyKey", "key")
//!     .with_header("qq", "10000");
//! let handle = WsClient::new().connect(&config, handler).await?;
//! handle.send(frame.to_string()).await?;
//! ```

#[cfg(feature = "http-client")]
pub mod http;

#[cfg(feature = "ws-client")]
pub mod ws_client;

#[cfg(feature = "http-client")]
pub use http::{FilePart, HttpClient, MultipartBody};

#[cfg(feature = "ws-client")]
pub use ws_client::WsClient;
