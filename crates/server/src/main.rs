//! seoforge-server: HTTP front end for the product enrichment pipeline.
//!
//! Routes:
//! - `GET  /health`
//! - `POST /api/products/enrich`
//! - `GET  /api/products/{id}`
//! - `GET  /api/products/{id}/status`
//! - `POST /api/products/{id}/reprocess?force=true`

mod admission;
mod api;
mod error;
mod router;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info};

use seoforge_admission::AdmissionController;
use seoforge_core::config::{self, Config};
use seoforge_enrich::{EnrichmentOrchestrator, JsonFileProductStore};

use crate::state::AppState;

/// Product enrichment server.
#[derive(Parser, Debug)]
#[command(name = "seoforge-server", version, about)]
struct Cli {
    /// Bind address (overrides HOST).
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Directory for product records (overrides DATA_DIR).
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Interval between rate-limit bucket sweeps, in seconds.
    #[arg(long, env = "RATE_LIMIT_SWEEP_INTERVAL", default_value_t = 60)]
    sweep_interval: u64,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    config::load_dotenv();
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(dir) = cli.data_dir {
        config.server.data_dir = dir;
    }
    config.log_summary();

    let store = JsonFileProductStore::open(&config.server.data_dir).await?;
    let orchestrator = EnrichmentOrchestrator::builder(Arc::new(store))
        .config(config.pipeline.clone())
        .build();

    let state = Arc::new(AppState {
        orchestrator,
        admission: AdmissionController::new(&config.rate_limit),
        client_headers: config.rate_limit.client_headers.clone(),
    });

    if cli.sweep_interval > 0 {
        let sweeper = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(cli.sweep_interval));
            loop {
                interval.tick().await;
                let swept = sweeper.admission.sweep();
                debug!(swept, tracked = sweeper.admission.tracked_counters(), "rate-limit sweep");
            }
        });
    }

    let app = router::build_router(state, &config.server.cors_origin);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
