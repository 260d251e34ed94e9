//! SNMP Telemetry Daemon
//!
//! Main entry point. Loads configuration, starts the trap listener and
//! serves the HTTP API until interrupted.

use snmp_telemetryd::api::{self, AppState};
use snmp_telemetryd::config::TelemetryConfig;
use snmp_telemetryd::polling::poller::Poller;
use snmp_telemetryd::polling::strategy::StrategyRegistry;
use snmp_telemetryd::transport::Snmp2Transport;
use snmp_telemetryd::trapping::receiver::start_trap_listener;
use snmp_telemetryd::trapping::store::TrapStore;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config_path =
        std::env::var("TELEMETRYD_CONFIG").unwrap_or_else(|_| "/etc/telemetryd.toml".to_string());
    let config = TelemetryConfig::load_or_default(&config_path)?;
    info!(config = %config_path, "telemetryd starting");

    let store = Arc::new(TrapStore::new());

    // The trap listener is core functionality; failing to bind is fatal.
    let listener = start_trap_listener(
        &config.trap.bind,
        config.trap.port,
        config.trap.community.clone(),
        store.clone(),
    )
    .await?;
    info!(addr = %listener.local_addr(), "trap listener running");

    let poller = Arc::new(Poller::new(
        Arc::new(Snmp2Transport::new()),
        StrategyRegistry::with_defaults(),
        config.poll.clone(),
    ));

    let app = api::router(AppState { poller, store });
    let tcp = tokio::net::TcpListener::bind(&config.api.bind).await?;
    info!(addr = %config.api.bind, "HTTP API listening");

    axum::serve(tcp, app)
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    listener.shutdown();
    info!("telemetryd exiting");
    Ok(())
}
