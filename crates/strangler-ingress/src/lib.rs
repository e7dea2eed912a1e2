//! Strangler Gateway Ingress
//!
//! This crate provides the HTTP surface of the gateway:
//! - Per-prefix proxy routes and the `/health` diagnostics document
//! - The pass-through forwarder relaying requests to upstreams
//! - Header transforms and request-ID middleware

pub mod forward;
pub mod gateway;
pub mod headers;
pub mod middleware;

pub use forward::{DEFAULT_MAX_BODY_BYTES, ForwardError, Forwarder, ProxyOutcome};
pub use gateway::{GatewayInfo, GatewayState, HealthResponse, LivenessResponse, router};
