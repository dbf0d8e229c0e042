//! Configuration types for transport clients.

use std::time::Duration;

// =============================================================================
// WebSocket Client Config
// =============================================================================

/// Configuration for WebSocket client connections.
///
/// Connections are single-use: the client never reconnects on its own, a
/// fresh connection must be opened with the same config instead.
#[derive(Debug, Clone)]
pub struct WsClientConfig {
    /// WebSocket server URL.
    pub url: String,
    /// Extra headers sent with the upgrade request.
    pub headers: Vec<(String, String)>,
    /// Capacity of the outgoing frame queue.
    pub queue_capacity: usize,
}

impl Default for WsClientConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            headers: Vec::new(),
            queue_capacity: 256,
        }
    }
}

impl WsClientConfig {
    /// Creates a new WebSocket client config with the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Adds a header to the upgrade request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

// =============================================================================
// HTTP Client Config
// =============================================================================

/// Configuration for HTTP client connections.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL every request path is appended to.
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
}

impl HttpClientConfig {
    /// Creates a new HTTP client config with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the request timeout duration.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Joins `path` onto the base URL.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for() {
        let config = HttpClientConfig::new("http://127.0.0.1:8080/");
        assert_eq!(config.url_for("/uploadImage"), "http://127.0.0.1:8080/uploadImage");
        assert_eq!(config.url_for("file/upload"), "http://127.0.0.1:8080/file/upload");
    }

    #[test]
    fn test_ws_headers() {
        let config = WsClientConfig::new("ws://localhost/all")
            .with_header("verifyKey", "key")
            .with_header("qq", "10000");
        assert_eq!(config.headers.len(), 2);
        assert_eq!(config.queue_capacity, 256);
    }
}
