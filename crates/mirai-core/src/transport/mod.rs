//! Transport abstractions shared by the transport implementations and adapters.

pub mod config;
pub mod connection;

pub use config::{HttpClientConfig, WsClientConfig};
pub use connection::{BoxedConnectionHandler, ConnectionHandle, ConnectionHandler, Outgoing};
