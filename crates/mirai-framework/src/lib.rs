//! # Mirai Framework
//!
//! Listener registration and dispatch for the mirai SDK.
//!
//! - [`ListenerRegistry`] - listeners keyed by payload discriminator
//! - [`FromContext`] - declarative parameter binding
//! - [`Handler`] / [`SyncHandler`] - implemented for plain functions of any arity
//! - [`Dispatcher`] - routes events to listeners and observes their outcome
//!
//! ```rust,ignore
//! let mut registry = ListenerRegistry::new();
//! registry.register("GroupMessage", |bot: Arc<MiraiBot>, group: Group, chain: MessageChain| async move {
//!     bot.send_group_message(&group, chain, None).await.map(|_| ())
//! });
//! ```

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod handler;
pub mod registry;

pub use context::DispatchContext;
pub use dispatcher::Dispatcher;
pub use error::{ExtractError, ExtractResult, HandlerError};
pub use extractor::{FromContext, Raw};
pub use handler::{BoxedHandler, ErasedHandler, Handler, HandlerOutput, SyncHandler};
pub use registry::{Listener, ListenerKeys, ListenerRegistry, SideCallback};
