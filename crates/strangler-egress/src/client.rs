//! Shared HTTP client utilities

use crate::{EgressError, Result};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Time allowed for an upstream to produce response headers.
    /// Body streaming is not bounded by this deadline.
    pub response_timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Maximum number of idle connections per host
    pub pool_max_idle_per_host: usize,

    /// User agent string, sent only when the caller did not supply one
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            response_timeout_secs: 100,
            connect_timeout_secs: 10,
            pool_max_idle_per_host: 32,
            user_agent: format!("StranglerGateway/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }
}

/// Create a configured HTTP client with connection pooling
///
/// No overall request timeout is set on the client: the forwarder bounds the
/// wait for response headers and leaves long-lived bodies alone.
pub fn create_client(config: &HttpClientConfig) -> Result<Client> {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        // Expire idle connections before upstream servers close them
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(&config.user_agent)
        .tcp_keepalive(Duration::from_secs(60))
        // Pass-through: bodies are relayed exactly as the upstream encoded them
        .no_gzip()
        .no_brotli()
        .no_deflate()
        // Redirects belong to the caller, not the gateway
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| EgressError::ConfigError(format!("Failed to create HTTP client: {}", e)))
}
