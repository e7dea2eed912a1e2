//! Gateway entry point
//!
//! One route pair per route table prefix (`/prefix` and `/prefix/{*rest}`),
//! the `/health` diagnostics document, the `/healthz` liveness check, a stats
//! reset endpoint and, when metrics are attached, the `/metrics` scrape.
//! Anything the prefix routes did not catch goes through the fallback, which
//! resolves the path once more and answers 404 when nothing matches.

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strangler_core::Upstream;
use strangler_egress::UpstreamSet;
use strangler_observability::Metrics;
use strangler_routing::{Dispatcher, DistributionStats, MigrationConfig, RouteEntry};
use tracing::{debug, info};

use crate::forward::Forwarder;
use crate::middleware::request_context_middleware;

/// Static configuration echoed by `/health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayInfo {
    pub gradual_migration: bool,
    pub migration_percent: u8,
    pub monolith_url: String,
    pub movies_service_url: String,
    pub events_service_url: String,
}

impl GatewayInfo {
    pub fn new(migration: MigrationConfig, upstreams: &UpstreamSet) -> Self {
        Self {
            gradual_migration: migration.enabled,
            migration_percent: migration.target_percent,
            monolith_url: upstreams.get(Upstream::Legacy).base_url().to_string(),
            movies_service_url: upstreams.get(Upstream::MoviesNew).base_url().to_string(),
            events_service_url: upstreams.get(Upstream::Events).base_url().to_string(),
        }
    }
}

/// `/health` document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub configuration: GatewayInfo,
    pub distribution_stats: DistributionStats,
}

/// `/healthz` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivenessResponse {
    pub status: String,
    /// Configured route prefixes
    pub routes: usize,
    pub gradual_migration: bool,
}

/// Shared gateway state
#[derive(Clone)]
pub struct GatewayState {
    pub dispatcher: Arc<Dispatcher>,
    pub forwarder: Arc<Forwarder>,
    pub info: Arc<GatewayInfo>,
    pub metrics: Option<Arc<Metrics>>,
}

impl GatewayState {
    pub fn new(dispatcher: Arc<Dispatcher>, forwarder: Arc<Forwarder>) -> Self {
        let info = GatewayInfo::new(dispatcher.migration(), forwarder.upstreams());
        Self {
            dispatcher,
            forwarder,
            info: Arc::new(info),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Build the gateway router
pub fn router(state: GatewayState) -> Router {
    let mut routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(healthz))
        .route("/admin/distribution/reset", post(reset_distribution));
    if state.metrics.is_some() {
        routes = routes.route("/metrics", get(metrics_handler));
    }
    let mut router = routes.with_state(state.clone());

    for entry in state.dispatcher.route_table().entries() {
        let entry = Arc::new(entry.clone());
        let prefix = entry.path_prefix.clone();
        let handler = {
            let state = state.clone();
            move |req: Request| {
                let state = state.clone();
                let entry = entry.clone();
                async move { proxy_entry(state, entry, req).await }
            }
        };

        debug!(prefix = %prefix, "registering route");
        router = router
            .route(&prefix, any(handler.clone()))
            .route(&format!("{}/{{*rest}}", prefix), any(handler));
    }

    let fallback_state = state.clone();
    router
        .fallback(move |req: Request| {
            let state = fallback_state.clone();
            async move { proxy_fallback(state, req).await }
        })
        .layer(middleware::from_fn(request_context_middleware))
}

async fn proxy_entry(state: GatewayState, entry: Arc<RouteEntry>, req: Request) -> Response {
    let dispatch = state.dispatcher.dispatch_entry(&entry);
    state.forwarder.forward(dispatch.upstream, req).await
}

async fn proxy_fallback(state: GatewayState, req: Request) -> Response {
    match state.dispatcher.dispatch(req.uri().path()) {
        Some(dispatch) => state.forwarder.forward(dispatch.upstream, req).await,
        None => {
            debug!("No route matched {} {}", req.method(), req.uri().path());
            if let Some(metrics) = &state.metrics {
                metrics.record_unmatched();
            }
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}

/// Health check handler
async fn health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Healthy".to_string(),
        timestamp: Utc::now(),
        configuration: state.info.as_ref().clone(),
        distribution_stats: state.dispatcher.distributor().stats(),
    })
}

/// Liveness check; answers as long as the router is serving
async fn healthz(State(state): State<GatewayState>) -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "ok".to_string(),
        routes: state.dispatcher.route_table().entries().len(),
        gradual_migration: state.info.gradual_migration,
    })
}

/// Prometheus scrape in text format
async fn metrics_handler(State(state): State<GatewayState>) -> Response {
    let Some(metrics) = &state.metrics else {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };

    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("Content-Type", "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", err),
        )
            .into_response(),
    }
}

/// Zero the distribution counters and return the fresh snapshot
async fn reset_distribution(State(state): State<GatewayState>) -> Json<DistributionStats> {
    state.dispatcher.distributor().reset_stats();
    info!("Distribution statistics reset");
    Json(state.dispatcher.distributor().stats())
}
