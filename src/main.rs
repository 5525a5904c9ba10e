mod config;

use clap::Parser as _;
use config::Config;
use nvrelay::{AppState, build_metrics_layer_and_handle, build_metrics_router, build_router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, instrument};

#[tokio::main]
#[instrument]
pub async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment (RUST_LOG included)
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let config = Config::parse().validate()?;
    info!("Starting relay with config: {:?}", config);

    let app_state = AppState::new(config.upstream_url.clone(), config.pool());
    let mut router = build_router(app_state);

    if config.metrics {
        let (prometheus_layer, handle) =
            build_metrics_layer_and_handle(config.metrics_prefix.clone());
        router = router.layer(prometheus_layer);

        let metrics_addr = SocketAddr::new(config.host, config.metrics_port);
        let metrics_listener = TcpListener::bind(metrics_addr).await?;
        info!("Metrics endpoint listening on {}", metrics_addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(metrics_listener, build_metrics_router(handle)).await {
                tracing::error!("Metrics server stopped: {}", e);
            }
        });
    }

    let bind_addr = SocketAddr::new(config.host, config.port);
    let listener = TcpListener::bind(bind_addr).await?;
    info!("Relay listening on {}", bind_addr);

    axum::serve(listener, router).await?;

    Ok(())
}
