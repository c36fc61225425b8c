//! # GPS Bridge
//!
//! Ingest GPS telemetry from a serial-connected receiver and serve it over HTTP.
//!
//! The binary wires the pipeline together: one telemetry store shared by
//! the background serial ingestion loop and the HTTP request path.

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber;

use gps_bridge::config::Config;
use gps_bridge::export::SnapshotExporter;
use gps_bridge::http::{self, AppState};
use gps_bridge::ingest;
use gps_bridge::store::TelemetryStore;

/// Main entry point for GPS Bridge
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (`GPS_BRIDGE_CONFIG` or `config/default.toml`)
///    - Open the record log and the snapshot exporter
///
/// 2. **Steady state**
///    - Background task reads the serial side channel and appends to the store
///    - Axum serves `/`, `/update`, `/history`, `/download`
///    - Both sides share the same store; appends are serialized inside it
///
/// 3. **Graceful Shutdown**
///    - Ctrl+C stops the HTTP server; the process exits and takes the
///      ingestion task with it
///
/// # Errors
///
/// Returns error if the configuration is invalid, the record log cannot be
/// opened, or the HTTP listener cannot bind. A missing serial device is
/// NOT fatal to the process: the ingestion component logs the failure and
/// the HTTP surface keeps serving whatever is already stored.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("GPS Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::load_from_env()?;

    let store = Arc::new(TelemetryStore::open(&config.store.data_dir)?);
    let exporter = Arc::new(SnapshotExporter::new(&config.store.data_dir));
    info!(
        "Record log ready at {} ({} records)",
        config.store.data_dir.display(),
        store.len()
    );

    // Background ingestion loop, bound to the process lifetime. It talks
    // to the same store instance as the request path; if the device is
    // absent the component dies alone and the server keeps serving.
    {
        let serial_config = config.serial.clone();
        let store = Arc::clone(&store);
        let exporter = Arc::clone(&exporter);
        tokio::spawn(async move {
            if let Err(e) = ingest::run(serial_config, store, exporter).await {
                error!("Ingestion loop terminated: {}", e);
            }
        });
    }

    let state = Arc::new(AppState::new(Arc::clone(&store), exporter));
    let app = http::create_router(state);

    let address = config.server_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("HTTP server listening on {}", address);
    info!("Press Ctrl+C to exit");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down with {} records stored", store.len());
    Ok(())
}

/// Resolve when the process receives Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    info!("Received Ctrl+C, shutting down...");
}
