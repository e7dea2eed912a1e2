//! Application wiring
//!
//! Builds every long-lived component once and hands back the combined router:
//! gateway routes, `/healthz` and `/metrics`, wrapped in request tracing.

use axum::Router;
use std::sync::Arc;
use strangler_egress::create_client;
use strangler_ingress::{Forwarder, GatewayState};
use strangler_observability::Metrics;
use strangler_routing::{Dispatcher, Distributor, RouteTable};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{Cli, ConfigError};

pub fn build_app(cli: &Cli, metrics: Arc<Metrics>) -> Result<Router, ConfigError> {
    let upstreams = Arc::new(cli.upstreams()?);
    let client_config = cli.http_client();
    let client = create_client(&client_config)?;

    let forwarder = Forwarder::new(client, upstreams, &client_config)
        .with_max_body_bytes(cli.max_request_body_bytes)
        .with_metrics(metrics.clone());

    let table = Arc::new(RouteTable::gateway_default());
    for entry in table.entries() {
        if entry.migration_controlled {
            info!("  {} -> distributor", entry.path_prefix);
        } else {
            info!("  {} -> {}", entry.path_prefix, entry.upstream);
        }
    }

    let dispatcher = Dispatcher::new(table, Arc::new(Distributor::new()), cli.migration())
        .with_metrics(metrics.clone());

    let state =
        GatewayState::new(Arc::new(dispatcher), Arc::new(forwarder)).with_metrics(metrics);

    Ok(strangler_ingress::router(state).layer(TraceLayer::new_for_http()))
}
