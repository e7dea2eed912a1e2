//! Server configuration
//!
//! Every setting is a CLI flag with an environment variable fallback. Values
//! are read once at startup and never reloaded.

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use std::net::SocketAddr;
use strangler_egress::{EgressError, HttpClientConfig, UpstreamSet};
use strangler_ingress::DEFAULT_MAX_BODY_BYTES;
use strangler_routing::MigrationConfig;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Configuration errors surfaced at startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid listen address '{0}'")]
    ListenAddress(String),

    #[error(transparent)]
    Upstream(#[from] strangler_core::Error),

    #[error(transparent)]
    Client(#[from] EgressError),
}

#[derive(Debug, Clone, Parser)]
#[command(name = "strangler-server")]
#[command(about = "Migration gateway routing traffic between a monolith and its replacement services", long_about = None)]
pub struct Cli {
    /// Listen port
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Base URL of the monolith
    #[arg(long, env = "MONOLITH_URL", value_name = "URL")]
    pub monolith_url: String,

    /// Base URL of the new movies service
    #[arg(long, env = "MOVIES_SERVICE_URL", value_name = "URL")]
    pub movies_service_url: String,

    /// Base URL of the events service
    #[arg(long, env = "EVENTS_SERVICE_URL", value_name = "URL")]
    pub events_service_url: String,

    /// Split movies traffic between the monolith and the new service
    /// (true/false, yes/no, on/off, 1/0; any case)
    #[arg(
        long,
        env = "GRADUAL_MIGRATION",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        value_name = "BOOL"
    )]
    pub gradual_migration: bool,

    /// Share of movies traffic (percent) sent to the new service
    #[arg(
        long,
        env = "MOVIES_MIGRATION_PERCENT",
        default_value_t = 50,
        value_parser = clap::value_parser!(u8).range(0..=100)
    )]
    pub movies_migration_percent: u8,

    /// Seconds an upstream has to produce response headers
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 100)]
    pub upstream_timeout_secs: u64,

    /// Seconds allowed to establish an upstream connection
    #[arg(long, env = "UPSTREAM_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub upstream_connect_timeout_secs: u64,

    /// Largest request body relayed upstream, in bytes
    #[arg(long, env = "MAX_REQUEST_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_request_body_bytes: usize,

    /// Base log level (RUST_LOG overrides)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn migration(&self) -> MigrationConfig {
        MigrationConfig {
            enabled: self.gradual_migration,
            target_percent: self.movies_migration_percent,
        }
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::ListenAddress(format!("{}:{}", self.host, self.port)))
    }

    pub fn upstreams(&self) -> Result<UpstreamSet, ConfigError> {
        Ok(UpstreamSet::new(
            &self.monolith_url,
            &self.movies_service_url,
            &self.events_service_url,
        )?)
    }

    pub fn http_client(&self) -> HttpClientConfig {
        HttpClientConfig {
            response_timeout_secs: self.upstream_timeout_secs,
            connect_timeout_secs: self.upstream_connect_timeout_secs,
            ..HttpClientConfig::default()
        }
    }
}
