//! Strangler Gateway Server
//!
//! Migration gateway fronting a monolith while its functionality moves to new
//! services. Configuration comes from CLI flags or the environment.

mod app;
mod config;

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use strangler_observability::Metrics;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::{Cli, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli)?;

    let addr = cli.listen_addr()?;
    let migration = cli.migration();

    info!("🚀 Starting Strangler Gateway");
    info!("   Monolith:        {}", cli.monolith_url);
    info!("   Movies service:  {}", cli.movies_service_url);
    info!("   Events service:  {}", cli.events_service_url);
    info!(
        "   Gradual migration: {} ({}% to movies service)",
        migration.enabled, migration.target_percent
    );

    let metrics = Arc::new(Metrics::new().context("Failed to create metrics registry")?);
    let app = app::build_app(&cli, metrics)?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("✅ Gateway listening on http://{}", addr);
    info!("   Health:  http://{}/health", addr);
    info!("   Metrics: http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    // RUST_LOG wins over --log-level when set
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("Invalid log level")?;

    match cli.log_format {
        LogFormat::Text => {
            let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Json => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
