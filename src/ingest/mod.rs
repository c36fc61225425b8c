//! # Ingestion Module
//!
//! Background loop pulling telemetry from the serial side channel.
//!
//! The device writes newline-delimited JSON objects at a fixed baud rate.
//! This module handles:
//! - Opening the serial port (8N1) at the configured baud rate
//! - Reading lines under a poll timeout
//! - Parsing and validating each line as a telemetry sample
//! - Forwarding accepted samples to the store and re-rendering the export
//!
//! Every per-line failure (malformed JSON, missing field, handoff failure)
//! is logged and the sample dropped; the loop keeps running. The only
//! fatal condition is failing to open the channel at startup, and that is
//! fatal to this component alone. There is no acknowledgement path back
//! to the device.

pub mod line_source;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::config::SerialConfig;
use crate::error::{GpsBridgeError, Result};
use crate::export::SnapshotExporter;
use crate::record::{TelemetryReading, TelemetryRecord};
use crate::store::TelemetryStore;

use line_source::{LineSource, SerialLineSource};

/// Open the serial side channel with 8N1 framing
///
/// # Errors
///
/// Returns `Serial` if the device cannot be opened. This is the one
/// startup failure the ingestion component does not survive.
pub fn open_channel(config: &SerialConfig) -> Result<SerialLineSource> {
    let port = tokio_serial::new(&config.port, config.baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| {
            GpsBridgeError::Serial(format!("Failed to open {}: {}", config.port, e))
        })?;

    Ok(SerialLineSource::new(port))
}

/// Store + exporter handoff used for each accepted sample
///
/// The same pair is shared with the HTTP state; the ingestion side talks
/// to it through this pipeline so a handoff failure surfaces with the
/// side channel's fire-and-forget semantics.
#[derive(Clone)]
pub struct IngestPipeline {
    store: Arc<TelemetryStore>,
    exporter: Arc<SnapshotExporter>,
}

impl IngestPipeline {
    pub fn new(store: Arc<TelemetryStore>, exporter: Arc<SnapshotExporter>) -> Self {
        Self { store, exporter }
    }

    /// Append one accepted reading and re-render the export snapshot
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the sample could not be handed off to the
    /// store; the sample is dropped, no retry. A snapshot render failure
    /// after a successful append is logged but does not fail the ingest —
    /// the record is already durable.
    pub fn ingest(&self, reading: TelemetryReading) -> Result<TelemetryRecord> {
        let record = self.store.append(reading).map_err(|e| {
            GpsBridgeError::Transport(format!("failed to hand off sample to store: {}", e))
        })?;

        if let Err(e) = self.exporter.write_snapshot(&self.store.list_all()) {
            warn!("Export snapshot re-render failed: {}", e);
        }

        Ok(record)
    }
}

/// Open the configured channel and run the ingestion loop until the
/// channel closes
pub async fn run(
    config: SerialConfig,
    store: Arc<TelemetryStore>,
    exporter: Arc<SnapshotExporter>,
) -> Result<()> {
    let source = open_channel(&config)?;
    info!(
        "Serial channel open at {} ({} baud)",
        config.port, config.baud_rate
    );

    let pipeline = IngestPipeline::new(store, exporter);
    let poll_timeout = Duration::from_millis(config.poll_timeout_ms);
    run_loop(source, pipeline, poll_timeout).await
}

/// Drive the ingestion loop over any line source
///
/// Returns when the source reports end of stream. Read errors, parse
/// failures, validation failures, and handoff failures are all non-fatal:
/// the offending line is dropped and the loop continues with the next one.
pub async fn run_loop<S: LineSource>(
    mut source: S,
    pipeline: IngestPipeline,
    poll_timeout: Duration,
) -> Result<()> {
    loop {
        let line = match timeout(poll_timeout, source.next_line()).await {
            // No data inside the poll window; nothing to do
            Err(_) => continue,
            Ok(Err(e)) => {
                warn!("Serial read failed: {}", e);
                continue;
            }
            Ok(Ok(None)) => {
                info!("Serial channel closed, ingestion loop stopping");
                return Ok(());
            }
            Ok(Ok(Some(line))) => line,
        };

        if line.is_empty() {
            continue;
        }
        debug!("Received raw line: {}", line);

        let reading = match TelemetryReading::from_json(&line) {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Discarding line: {}", e);
                continue;
            }
        };

        match pipeline.ingest(reading) {
            Ok(record) => debug!("Stored record {}", record.id),
            Err(e) => warn!("Dropping sample: {}", e),
        }
    }
}
