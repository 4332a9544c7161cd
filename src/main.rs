mod adapters;
mod application;
mod config;
mod domain;
mod interface;
mod ports;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adapters::{JsonHostsFile, SystemPingProber};
use application::{HostService, MonitoringRegistry};
use config::Config;
use interface::http::create_router;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("pingmon={},tower_http=info", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting PingMon v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    // Initialize adapters
    let prober = Arc::new(SystemPingProber::new());
    let hosts_file = Arc::new(JsonHostsFile::new(config.hosts_file.clone()));
    info!("✓ Host list at {}", hosts_file.path().display());

    // Create monitoring engine
    let registry = Arc::new(MonitoringRegistry::new(prober, config.monitor_settings()));
    let host_service = Arc::new(HostService::new(registry.clone(), hosts_file, config.max_hosts));

    match host_service.bootstrap().await {
        Ok(started) => info!("✓ Monitoring {} persisted host(s)", started),
        Err(e) => warn!("⚠ Failed to read host list: {}. Starting with no hosts.", e),
    }

    // Create HTTP server
    let app = create_router(host_service);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("✓ PingMon listening on {}", addr);
    info!("  → API: http://localhost:{}/api/data", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    registry.stop_all().await;
    info!("PingMon stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠ Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
