//! # HTTP Module
//!
//! Axum router exposing the telemetry surface:
//! - `POST /update` - ingest one sample (used by devices without a serial link)
//! - `GET /history` - full record set as JSON, oldest first
//! - `GET /download` - the rendered export artifact as a file download
//! - `GET /` - live dashboard polling `/history`
//! - `GET /health` - liveness probe

pub mod dashboard;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, warn};

use crate::error::GpsBridgeError;
use crate::export::SnapshotExporter;
use crate::record::{TelemetryReading, TelemetryRecord};
use crate::store::TelemetryStore;

/// Shared state handed to every handler
pub struct AppState {
    pub store: Arc<TelemetryStore>,
    pub exporter: Arc<SnapshotExporter>,
}

impl AppState {
    pub fn new(store: Arc<TelemetryStore>, exporter: Arc<SnapshotExporter>) -> Self {
        Self { store, exporter }
    }
}

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration - allow all origins for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/update", post(update))
        .route("/history", get(history))
        .route("/download", get(download))
        .route("/health", get(health_check))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// GET / - live dashboard
async fn index() -> Html<&'static str> {
    Html(dashboard::DASHBOARD_HTML)
}

/// POST /update - validate and store one telemetry sample
///
/// The body must be a JSON object carrying all five data fields; the
/// timestamp is never client-supplied. On success the export snapshot is
/// re-rendered so `/download` stays consistent with the newest record.
async fn update(State(state): State<Arc<AppState>>, body: String) -> Response {
    let value: serde_json::Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(_) => return (StatusCode::BAD_REQUEST, "Invalid JSON data").into_response(),
    };

    let reading = match TelemetryReading::from_value(&value) {
        Ok(reading) => reading,
        Err(e) => {
            warn!("Rejected update: {}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let record = match state.store.append(reading) {
        Ok(record) => record,
        Err(e) => {
            error!("Failed to store update: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error processing request: {}", e),
            )
                .into_response();
        }
    };

    // Keep the artifact in step with the newest record; a render failure
    // does not undo the already-durable append
    if let Err(e) = state.exporter.write_snapshot(&state.store.list_all()) {
        warn!("Export snapshot re-render failed: {}", e);
    }

    debug!("Stored record {} via /update", record.id);
    (StatusCode::OK, "Data updated").into_response()
}

/// One record as served on the wire; the store-internal id stays internal
#[derive(Debug, Serialize)]
struct HistoryEntry {
    timestamp: String,
    latitude: f64,
    longitude: f64,
    altitude: f64,
    speed: f64,
    satellites: u32,
}

impl From<TelemetryRecord> for HistoryEntry {
    fn from(record: TelemetryRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            latitude: record.latitude,
            longitude: record.longitude,
            altitude: record.altitude,
            speed: record.speed,
            satellites: record.satellites,
        }
    }
}

/// GET /history - all records, oldest first
async fn history(State(state): State<Arc<AppState>>) -> Json<Vec<HistoryEntry>> {
    let entries = state
        .store
        .list_all()
        .into_iter()
        .map(HistoryEntry::from)
        .collect();
    Json(entries)
}

/// GET /download - the most recently rendered export artifact
async fn download(State(state): State<Arc<AppState>>) -> Response {
    match state.exporter.read_snapshot() {
        Ok(artifact) => (
            [
                (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"gps_history.html\"",
                ),
            ],
            artifact,
        )
            .into_response(),
        Err(GpsBridgeError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg).into_response(),
        Err(e) => {
            error!("Failed to read export artifact: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
