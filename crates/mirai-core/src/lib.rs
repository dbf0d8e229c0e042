//! # Mirai Core
//!
//! Fundamental building blocks shared by every crate of the mirai SDK:
//!
//! - **Errors**: transport and API error taxonomy with [`ErrorClass`] ([`ApiError`])
//! - **Events**: type-erased events with runtime downcasting ([`Event`], [`BoxedEvent`])
//! - **Bots**: the command surface of a session ([`Bot`])
//! - **Transport**: connection handles and the handler trait transports call into
//! - **Retry**: the fault envelope wrapped around every channel operation ([`RetryPolicy`])
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌───────────┐
//! │  Transport  │────▶│  Adapter   │────▶│ Listener  │
//! │ (WebSocket) │◀────│ (api-http) │────▶│ Listener  │
//! └─────────────┘     └────────────┘     └───────────┘
//! ```

pub mod bot;
pub mod error;
pub mod event;
pub mod retry;
pub mod transport;

pub use bot::{Bot, BoxedBot, downcast_bot};
pub use error::{ApiError, ApiResult, ErrorClass, TransportError, TransportResult};
pub use event::{BoxedEvent, Event};
pub use retry::{ApiResultExt, RetryPolicy};
pub use transport::{
    BoxedConnectionHandler, ConnectionHandle, ConnectionHandler, HttpClientConfig, Outgoing,
    WsClientConfig,
};
