//! Runtime orchestration: one configured session plus its listeners.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use mirai_runtime::MiraiRuntime;
//!
//! // Loads mirai.toml from the current directory and MIRAI_* variables
//! let runtime = MiraiRuntime::new()?;
//!
//! runtime.register("FriendMessage", on_friend_message);
//! runtime.run().await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::signal;
use tracing::{debug, error, info, warn};

use crate::blocking::BlockingBot;
use crate::config::{ConfigLoader, RuntimeConfig};
use crate::error::RuntimeResult;
use crate::logging;
use mirai_adapter_api_http::MiraiBot;
use mirai_framework::{Dispatcher, Handler, Listener, ListenerKeys, SyncHandler};

/// Owns the session and drives its lifecycle.
pub struct MiraiRuntime {
    config: RuntimeConfig,
    bot: Arc<MiraiBot>,
    running: AtomicBool,
}

impl MiraiRuntime {
    /// Loads configuration from the default locations and creates the runtime.
    pub fn new() -> RuntimeResult<Self> {
        Self::builder().build()
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates the runtime from a loaded configuration.
    ///
    /// Installs the global log subscriber unless one is already set.
    pub fn from_config(config: RuntimeConfig) -> RuntimeResult<Self> {
        logging::init_from_config(&config.logging);

        let bot = MiraiBot::new(config.bot.clone())?;

        info!(
            account = config.bot.account,
            url = %config.bot.ws_url(),
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config,
            bot,
            running: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Returns the session.
    pub fn bot(&self) -> &Arc<MiraiBot> {
        &self.bot
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        self.bot.dispatcher()
    }

    /// Registers an async listener under one or more keys.
    pub fn register<H, T>(&self, keys: impl Into<ListenerKeys>, handler: H) -> &Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.register_with(keys, Listener::new(handler))
    }

    /// Registers a synchronous listener under one or more keys.
    pub fn register_sync<H, T>(&self, keys: impl Into<ListenerKeys>, handler: H) -> &Self
    where
        H: SyncHandler<T>,
        T: 'static,
    {
        self.register_with(keys, Listener::sync(handler))
    }

    /// Registers a prepared [`Listener`] under one or more keys.
    pub fn register_with(&self, keys: impl Into<ListenerKeys>, listener: Listener) -> &Self {
        self.dispatcher().registry_mut(|registry| {
            registry.register_with(keys, listener);
        });
        self
    }

    /// Returns the total number of registered listener entries.
    pub fn listener_count(&self) -> usize {
        self.dispatcher().listener_count()
    }

    /// Returns a blocking facade bound to the current tokio runtime.
    pub fn blocking(&self) -> RuntimeResult<BlockingBot> {
        BlockingBot::current(Arc::clone(&self.bot))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Opens the session, retrying connection failures per `bot.retry`.
    ///
    /// A failed start closes the session.
    pub async fn start(&self) -> RuntimeResult<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            warn!("Runtime is already running");
            return Ok(());
        }

        info!(account = self.config.bot.account, "Starting mirai runtime");

        let policy = self.config.bot.retry.to_policy();
        let result = policy
            .run("connect", || self.bot.connect(), || async { Ok(()) })
            .await;

        if let Err(e) = result {
            error!(error = %e, "Failed to open session");
            self.stop().await;
            return Err(e.into());
        }

        info!("Runtime started");
        Ok(())
    }

    /// Cancels every listener task, then closes the session.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            debug!("Runtime is not running");
        }

        info!("Stopping mirai runtime");
        self.dispatcher().abort_all();
        self.bot.close();
        info!("Runtime stopped");
    }

    /// Runs until Ctrl+C, SIGTERM or the session closing on its own.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.start().await?;

        info!("mirai runtime is now running. Press Ctrl+C to stop.");

        let outcome = tokio::select! {
            signal = wait_for_shutdown() => signal,
            _ = self.bot.wait_closed() => {
                warn!("Session closed, shutting down");
                Ok(())
            }
        };

        self.stop().await;
        outcome
    }

    /// Runs until `shutdown` completes or the session closes.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;

        tokio::select! {
            _ = shutdown => {}
            _ = self.bot.wait_closed() => {
                warn!("Session closed, shutting down");
            }
        }

        self.stop().await;
        Ok(())
    }
}

/// Waits for Ctrl+C, or SIGTERM on unix.
async fn wait_for_shutdown() -> RuntimeResult<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`MiraiRuntime`] with custom configuration sources.
///
/// ```rust,ignore
/// let runtime = MiraiRuntime::builder()
///     .config_file("config/mirai.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration programmatically.
    pub fn merge(mut self, config: RuntimeConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads the configuration and builds the runtime.
    pub fn build(self) -> RuntimeResult<MiraiRuntime> {
        let config = self.config_loader.load()?;
        MiraiRuntime::from_config(config)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
