//! Blocking wrappers for threads that are not running async code.
//!
//! ```rust,ignore
//! let blocking = runtime.blocking()?;
//! std::thread::spawn(move || {
//!     blocking.send_group_message(12345_i64, "tick", None)
//! });
//! ```

use std::sync::Arc;

use serde_json::Value;
use tokio::runtime::Handle;

use crate::error::{RuntimeError, RuntimeResult};
use mirai_adapter_api_http::{ContactId, MessageChain, MiraiBot};
use mirai_core::ApiResult;

/// A [`MiraiBot`] plus the runtime handle its commands are driven on.
///
/// Every method blocks the calling thread until the command completes, so it
/// must not be called from inside an async task of the same runtime.
#[derive(Debug, Clone)]
pub struct BlockingBot {
    bot: Arc<MiraiBot>,
    handle: Handle,
}

impl BlockingBot {
    pub fn new(bot: Arc<MiraiBot>, handle: Handle) -> Self {
        Self { bot, handle }
    }

    /// Binds to the runtime the caller is currently inside.
    pub fn current(bot: Arc<MiraiBot>) -> RuntimeResult<Self> {
        let handle = Handle::try_current().map_err(|e| RuntimeError::NoRuntime(e.to_string()))?;
        Ok(Self::new(bot, handle))
    }

    /// Returns the wrapped async bot.
    pub fn bot(&self) -> &Arc<MiraiBot> {
        &self.bot
    }

    pub fn send_friend_message(
        &self,
        target: impl Into<ContactId>,
        chain: impl Into<MessageChain>,
        quote: Option<i64>,
    ) -> ApiResult<i64> {
        self.handle
            .block_on(self.bot.send_friend_message(target, chain, quote))
    }

    pub fn send_group_message(
        &self,
        target: impl Into<ContactId>,
        chain: impl Into<MessageChain>,
        quote: Option<i64>,
    ) -> ApiResult<i64> {
        self.handle
            .block_on(self.bot.send_group_message(target, chain, quote))
    }

    pub fn send_temp_message(
        &self,
        member_id: impl Into<ContactId>,
        group: impl Into<ContactId>,
        chain: impl Into<MessageChain>,
        quote: Option<i64>,
    ) -> ApiResult<i64> {
        self.handle
            .block_on(self.bot.send_temp_message(member_id, group, chain, quote))
    }

    pub fn recall(&self, target: impl Into<ContactId>, message_id: i64) -> ApiResult<()> {
        self.handle.block_on(self.bot.recall(target, message_id))
    }

    /// Issues a raw command, see [`MiraiBot::call`].
    pub fn call(&self, command: &str, sub_command: Option<&str>, content: Value) -> ApiResult<Value> {
        self.handle
            .block_on(self.bot.call(command, sub_command, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirai_adapter_api_http::MiraiConfig;
    use mirai_core::ApiError;

    #[test]
    fn test_current_requires_runtime() {
        let bot = MiraiBot::new(MiraiConfig::default()).unwrap();
        let err = BlockingBot::current(bot).unwrap_err();
        assert!(matches!(err, RuntimeError::NoRuntime(_)));
    }

    #[test]
    fn test_closed_bot_from_plain_thread() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let bot = rt.block_on(async { MiraiBot::new(MiraiConfig::default()).unwrap() });
        bot.close();

        let blocking = BlockingBot::new(bot, rt.handle().clone());
        let result = std::thread::spawn(move || blocking.recall(1_i64, 2)).join().unwrap();
        assert!(matches!(result, Err(ApiError::NotConnected)));
    }
}
