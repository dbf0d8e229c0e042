//! Configuration types for the api-http adapter.
//!
//! Loaded from the `bot` section of `mirai.toml` / `mirai.yaml`:
//!
//! ```yaml
//! bot:
//!   host: 127.0.0.1
//!   port: 8080
//!   account: 123456789
//!   verify_key: ${MIRAI_VERIFY_KEY}
//!   heartbeat_interval_ms: 3000
//!   api_timeout_ms: 30000
//!   retry:
//!     max_attempts: 10
//!     connect_delay_ms: 8000
//!     unexpected_delay_ms: 5000
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use mirai_core::{HttpClientConfig, RetryPolicy, WsClientConfig};

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiraiConfig {
    /// Gateway host (default: "127.0.0.1").
    pub host: String,

    /// Gateway port (default: 8080).
    pub port: u16,

    /// Bot account id.
    pub account: i64,

    /// Verify key configured on the gateway.
    pub verify_key: String,

    /// Use `wss://` and `https://`.
    pub tls: bool,

    /// Heartbeat ping interval in milliseconds (0 to disable).
    pub heartbeat_interval_ms: u64,

    /// How long a command waits for its response. `None` waits forever.
    pub api_timeout_ms: Option<u64>,

    /// How long to wait for the handshake reply.
    pub handshake_timeout_ms: u64,

    /// Retry envelope settings.
    pub retry: RetryConfig,
}

impl Default for MiraiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            account: 0,
            verify_key: String::new(),
            tls: false,
            heartbeat_interval_ms: 3000,
            api_timeout_ms: Some(30_000),
            handshake_timeout_ms: 10_000,
            retry: RetryConfig::default(),
        }
    }
}

impl MiraiConfig {
    /// Creates a config for the given gateway and account.
    pub fn new(host: impl Into<String>, port: u16, account: i64, verify_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            account,
            verify_key: verify_key.into(),
            ..Default::default()
        }
    }

    /// URL of the combined `/all` channel.
    pub fn ws_url(&self) -> String {
        let scheme = if self.tls { "wss" } else { "ws" };
        format!("{scheme}://{}:{}/all", self.host, self.port)
    }

    /// Base URL of the HTTP side, used for uploads.
    pub fn http_base_url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// WebSocket transport config carrying the handshake headers.
    pub fn ws_client_config(&self) -> WsClientConfig {
        WsClientConfig::new(self.ws_url())
            .with_header("verifyKey", &self.verify_key)
            .with_header("qq", self.account.to_string())
    }

    /// HTTP transport config for uploads.
    pub fn http_client_config(&self) -> HttpClientConfig {
        let config = HttpClientConfig::new(self.http_base_url());
        match self.api_timeout() {
            Some(timeout) => config.with_timeout(timeout),
            None => config,
        }
    }

    /// Heartbeat interval, `None` when disabled.
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        (self.heartbeat_interval_ms > 0).then(|| Duration::from_millis(self.heartbeat_interval_ms))
    }

    /// Command response timeout.
    pub fn api_timeout(&self) -> Option<Duration> {
        self.api_timeout_ms.map(Duration::from_millis)
    }

    /// Handshake timeout.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

/// Retry envelope configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,

    /// Delay after a connection failure, in milliseconds.
    pub connect_delay_ms: u64,

    /// Delay after an unexpected failure while retrying, in milliseconds.
    pub unexpected_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            connect_delay_ms: 8000,
            unexpected_delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    /// Builds the runtime policy.
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            connect_delay: Duration::from_millis(self.connect_delay_ms),
            unexpected_delay: Duration::from_millis(self.unexpected_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MiraiConfig::default();
        assert_eq!(config.ws_url(), "ws://127.0.0.1:8080/all");
        assert_eq!(config.heartbeat_interval(), Some(Duration::from_secs(3)));
        assert_eq!(config.api_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.retry.to_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
host: example.org
port: 443
account: 10001
verify_key: secret
tls: true
heartbeat_interval_ms: 0
api_timeout_ms: null
retry:
  max_attempts: 3
"#;

        let config: MiraiConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.account, 10001);
        assert_eq!(config.ws_url(), "wss://example.org:443/all");
        assert_eq!(config.http_base_url(), "https://example.org:443");
        assert_eq!(config.heartbeat_interval(), None);
        assert_eq!(config.api_timeout(), None);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.connect_delay_ms, 8000);
    }

    #[test]
    fn test_handshake_headers() {
        let ws = MiraiConfig::new("localhost", 8080, 42, "key").ws_client_config();
        assert!(ws.headers.contains(&("verifyKey".to_string(), "key".to_string())));
        assert!(ws.headers.contains(&("qq".to_string(), "42".to_string())));
    }
}
