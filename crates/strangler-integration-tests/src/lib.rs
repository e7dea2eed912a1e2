//! End-to-end test harness for the Strangler Gateway
//!
//! Wires the gateway router against real upstream sockets (wiremock servers
//! or ad-hoc axum apps) so tests exercise the full request path.

use axum::Router;
use std::sync::Arc;
use strangler_egress::{HttpClientConfig, UpstreamSet, create_client};
use strangler_ingress::{DEFAULT_MAX_BODY_BYTES, Forwarder, GatewayState};
use strangler_observability::Metrics;
use strangler_routing::{Dispatcher, Distributor, MigrationConfig, RouteTable};
use tokio::net::TcpListener;

/// A fully wired gateway plus handles for assertions
pub struct TestGateway {
    pub app: Router,
    pub state: GatewayState,
    pub metrics: Arc<Metrics>,
}

/// Upstream base URLs for a test gateway
pub struct Upstreams<'a> {
    pub monolith: &'a str,
    pub movies: &'a str,
    pub events: &'a str,
}

impl TestGateway {
    pub fn new(upstreams: Upstreams<'_>, migration: MigrationConfig) -> Self {
        Self::with_client_config(upstreams, migration, HttpClientConfig::default())
    }

    pub fn with_client_config(
        upstreams: Upstreams<'_>,
        migration: MigrationConfig,
        client_config: HttpClientConfig,
    ) -> Self {
        Self::build(upstreams, migration, client_config, DEFAULT_MAX_BODY_BYTES)
    }

    pub fn with_max_body_bytes(
        upstreams: Upstreams<'_>,
        migration: MigrationConfig,
        max_body_bytes: usize,
    ) -> Self {
        Self::build(
            upstreams,
            migration,
            HttpClientConfig::default(),
            max_body_bytes,
        )
    }

    fn build(
        upstreams: Upstreams<'_>,
        migration: MigrationConfig,
        client_config: HttpClientConfig,
        max_body_bytes: usize,
    ) -> Self {
        let metrics = Arc::new(Metrics::new().unwrap());
        let set = Arc::new(
            UpstreamSet::new(upstreams.monolith, upstreams.movies, upstreams.events).unwrap(),
        );
        let client = create_client(&client_config).unwrap();
        let forwarder = Forwarder::new(client, set, &client_config)
            .with_max_body_bytes(max_body_bytes)
            .with_metrics(metrics.clone());
        let dispatcher = Dispatcher::new(
            Arc::new(RouteTable::gateway_default()),
            Arc::new(Distributor::new()),
            migration,
        )
        .with_metrics(metrics.clone());

        let state = GatewayState::new(Arc::new(dispatcher), Arc::new(forwarder))
            .with_metrics(metrics.clone());

        Self {
            app: strangler_ingress::router(state.clone()),
            state,
            metrics,
        }
    }
}

/// Serve `app` on an ephemeral local port and return its base URL
pub async fn spawn_stub(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{}", addr.port())
}

/// A base URL nothing is listening on
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    format!("http://127.0.0.1:{}", addr.port())
}

/// Read a whole response body as UTF-8
pub async fn body_string(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}
