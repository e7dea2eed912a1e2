//! Strangler Gateway Egress
//!
//! This crate provides the outbound side of the gateway:
//! - Upstream target table
//! - Shared HTTP client construction

pub mod client;
pub mod upstream;

pub use client::{HttpClientConfig, create_client};
pub use upstream::{UpstreamSet, UpstreamTarget};

/// Egress error types
#[derive(Debug, thiserror::Error)]
pub enum EgressError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, EgressError>;
