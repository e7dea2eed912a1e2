//! Pass-through request forwarder
//!
//! Rebuilds an inbound request against an upstream and relays the upstream
//! response back unchanged apart from framing:
//!
//! - method, path and query string are kept verbatim
//! - request headers are copied minus `Host`, `Content-Length` and
//!   `Transfer-Encoding`; body headers travel only with a body
//! - the response status and headers are copied, `Transfer-Encoding` dropped
//! - the response body is streamed, never buffered
//!
//! Dropping the returned future (caller went away) drops the in-flight
//! upstream request with it.

use axum::body::Body;
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use http_body_util::LengthLimitError;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use strangler_core::Upstream;
use strangler_egress::{HttpClientConfig, UpstreamSet};
use strangler_observability::Metrics;
use tracing::{debug, error, info, warn};

use crate::headers::{
    REQUEST_EXCLUDED, RESPONSE_EXCLUDED, declared_content_length, filter_headers,
    should_forward_body, split_request_headers,
};

/// Largest inbound body buffered for forwarding (30 MB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 30_000_000;

/// Why a request could not be relayed
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// Upstream refused the connection or could not be reached
    #[error("Unable to connect to {upstream} service: {source}")]
    Connect {
        upstream: String,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream did not produce response headers in time
    #[error("{upstream} service did not respond within {timeout:?}")]
    Timeout { upstream: String, timeout: Duration },

    /// Inbound body could not be read
    #[error("Failed to read request body: {0}")]
    Body(String),

    /// Inbound body is larger than the configured limit
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Outbound request could not be built
    #[error("Failed to build request for {upstream} service: {source}")]
    Build {
        upstream: String,
        #[source]
        source: reqwest::Error,
    },

    /// Anything else the client reported
    #[error("Request to {upstream} service failed: {source}")]
    Other {
        upstream: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ForwardError {
    /// Classify a client error raised while sending to `upstream` under the
    /// response deadline `timeout`
    fn from_send(upstream: &str, err: reqwest::Error, timeout: Duration) -> Self {
        let upstream = upstream.to_string();
        // Connect timeouts stay 502; reqwest's own request timeout also
        // reports is_request
        if err.is_connect() {
            ForwardError::Connect {
                upstream,
                source: err,
            }
        } else if err.is_timeout() {
            ForwardError::Timeout { upstream, timeout }
        } else if err.is_request() {
            ForwardError::Connect {
                upstream,
                source: err,
            }
        } else {
            ForwardError::Other {
                upstream,
                source: err,
            }
        }
    }

    /// Status code returned to the caller
    pub fn status_code(&self) -> StatusCode {
        match self {
            ForwardError::Connect { .. } => StatusCode::BAD_GATEWAY,
            ForwardError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ForwardError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ForwardError::Body(_) | ForwardError::Build { .. } | ForwardError::Other { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Connect { .. } => "connect",
            ForwardError::Timeout { .. } => "timeout",
            ForwardError::Body(_) => "body",
            ForwardError::PayloadTooLarge { .. } => "payload_too_large",
            ForwardError::Build { .. } => "build",
            ForwardError::Other { .. } => "other",
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let body = match &self {
            ForwardError::Connect { upstream, .. } => {
                format!("Bad Gateway: Unable to connect to {} service", upstream)
            }
            ForwardError::Timeout { .. } => "Gateway Timeout".to_string(),
            ForwardError::PayloadTooLarge { .. } => "Payload Too Large".to_string(),
            _ => "Internal Server Error".to_string(),
        };

        (self.status_code(), body).into_response()
    }
}

/// The per-request result of a forwarding attempt
#[derive(Debug)]
pub struct ProxyOutcome {
    pub upstream: Upstream,
    pub method: Method,
    pub path: String,
    pub elapsed: Duration,
    pub result: Result<Response, ForwardError>,
}

impl ProxyOutcome {
    /// Exactly one response, whatever happened
    pub fn into_response(self) -> Response {
        match self.result {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    }
}

/// Relays requests to upstream services
pub struct Forwarder {
    client: Client,
    upstreams: Arc<UpstreamSet>,
    response_timeout: Duration,
    max_body_bytes: usize,
    metrics: Option<Arc<Metrics>>,
}

impl Forwarder {
    pub fn new(client: Client, upstreams: Arc<UpstreamSet>, config: &HttpClientConfig) -> Self {
        Self {
            client,
            upstreams,
            response_timeout: config.response_timeout(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Cap the inbound body size; larger bodies are answered with 413
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn upstreams(&self) -> &UpstreamSet {
        &self.upstreams
    }

    /// Forward `req` to `upstream`, turning every failure into a response
    pub async fn forward(&self, upstream: Upstream, req: Request) -> Response {
        let outcome = self.execute(upstream, req).await;
        self.observe(&outcome);
        outcome.into_response()
    }

    /// Forward `req` to `upstream` and keep the failure classification
    pub async fn execute(&self, upstream: Upstream, req: Request) -> ProxyOutcome {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let started = Instant::now();

        let result = self.try_forward(upstream, req).await;

        ProxyOutcome {
            upstream,
            method,
            path,
            elapsed: started.elapsed(),
            result,
        }
    }

    async fn try_forward(&self, upstream: Upstream, req: Request) -> Result<Response, ForwardError> {
        let target = self.upstreams.get(upstream);
        let (parts, body) = req.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = target.build_url(path_and_query);

        let headers = split_request_headers(&parts.headers, &REQUEST_EXCLUDED);
        let content_length = declared_content_length(&parts.headers);

        let mut builder = self
            .client
            .request(parts.method.clone(), &url)
            .headers(headers.transport);

        if should_forward_body(&parts.method, content_length) {
            let limit = self.max_body_bytes;
            if content_length.is_some_and(|len| len > limit as u64) {
                return Err(ForwardError::PayloadTooLarge { limit });
            }
            let bytes = axum::body::to_bytes(body, limit).await.map_err(|e| {
                let inner = e.into_inner();
                if inner.is::<LengthLimitError>() {
                    ForwardError::PayloadTooLarge { limit }
                } else {
                    ForwardError::Body(inner.to_string())
                }
            })?;
            // Content-Type and the other body headers ride with the body
            builder = builder.headers(headers.content).body(bytes);
        }

        let request = builder.build().map_err(|e| ForwardError::Build {
            upstream: target.name.clone(),
            source: e,
        })?;

        info!(
            "Forwarding {} {} to {} service",
            parts.method,
            parts.uri.path(),
            target.name
        );
        debug!(url = %url, "outbound request");

        let response = match tokio::time::timeout(self.response_timeout, self.client.execute(request))
            .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(ForwardError::from_send(
                    &target.name,
                    e,
                    self.response_timeout,
                ));
            }
            Err(_) => {
                return Err(ForwardError::Timeout {
                    upstream: target.name.clone(),
                    timeout: self.response_timeout,
                });
            }
        };

        let status = response.status();
        let response_headers = filter_headers(response.headers(), &RESPONSE_EXCLUDED);

        let mut out = Response::new(Body::from_stream(response.bytes_stream()));
        *out.status_mut() = status;
        *out.headers_mut() = response_headers;

        Ok(out)
    }

    fn observe(&self, outcome: &ProxyOutcome) {
        let name = outcome.upstream.name();
        let elapsed = outcome.elapsed.as_secs_f64();

        match &outcome.result {
            Ok(response) => {
                debug!(
                    upstream = name,
                    method = %outcome.method,
                    path = %outcome.path,
                    status = response.status().as_u16(),
                    "upstream responded"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_upstream_response(
                        outcome.upstream.label(),
                        outcome.method.as_str(),
                        response.status().as_u16(),
                        elapsed,
                    );
                }
            }
            Err(err) => {
                match err {
                    ForwardError::Timeout { .. } | ForwardError::PayloadTooLarge { .. } => warn!(
                        upstream = name,
                        method = %outcome.method,
                        path = %outcome.path,
                        error = %err,
                        "Request not relayed to upstream"
                    ),
                    ForwardError::Connect { .. } => error!(
                        upstream = name,
                        method = %outcome.method,
                        path = %outcome.path,
                        error = %err,
                        "Failed to forward request to upstream"
                    ),
                    _ => error!(
                        upstream = name,
                        method = %outcome.method,
                        path = %outcome.path,
                        error = ?err,
                        "Unexpected error while forwarding request"
                    ),
                }
                if let Some(metrics) = &self.metrics {
                    metrics.record_forward_failure(outcome.upstream.label(), err.kind(), elapsed);
                }
            }
        }
    }
}
