//! # Telemetry Records
//!
//! Data model for ingested GPS samples.
//!
//! A sample arrives as a JSON object with five required fields (latitude,
//! longitude, altitude, speed, satellites). Validation of those fields is
//! the single gate shared by the HTTP ingest endpoint and the serial loop:
//! a [`TelemetryReading`] can only be constructed from a fully-populated
//! submission. The store turns an accepted reading into a
//! [`TelemetryRecord`] by assigning the id and the server-side timestamp.

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::{GpsBridgeError, Result};

/// Fields a submission must carry; everything else is ignored
pub const REQUIRED_FIELDS: [&str; 5] =
    ["latitude", "longitude", "altitude", "speed", "satellites"];

/// Server-side timestamp format (`YYYY-MM-DD HH:MM:SS`, local time)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One persisted telemetry sample
///
/// Immutable once appended; `id` ordering equals insertion ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub id: u64,
    pub timestamp: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub speed: f64,
    pub satellites: u32,
}

/// An externally-supplied sample that has passed field validation
///
/// Carries everything a [`TelemetryRecord`] has except the id and the
/// timestamp, which are assigned by the store at append time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryReading {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub speed: f64,
    pub satellites: u32,
}

impl TelemetryReading {
    /// Validate a decoded JSON payload into a reading
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the payload is not an object, if any of the
    /// five required fields is absent, or if a value has the wrong type.
    /// The submission is rejected as a whole; nothing partial survives.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            GpsBridgeError::Validation("payload must be a JSON object".to_string())
        })?;

        for key in REQUIRED_FIELDS {
            if !obj.contains_key(key) {
                return Err(GpsBridgeError::Validation(format!(
                    "missing required field: {}",
                    key
                )));
            }
        }

        Ok(Self {
            latitude: float_field(obj, "latitude")?,
            longitude: float_field(obj, "longitude")?,
            altitude: float_field(obj, "altitude")?,
            speed: float_field(obj, "speed")?,
            satellites: int_field(obj, "satellites")?,
        })
    }

    /// Parse and validate a raw JSON string into a reading
    pub fn from_json(input: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(input)
            .map_err(|e| GpsBridgeError::Parse(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Promote this reading into a full record
    ///
    /// The timestamp is synthesized here, server-side, at insert time.
    /// Called only by the store while it holds the writer lock, so ids
    /// and timestamps both follow insertion order.
    pub fn into_record(self, id: u64) -> TelemetryRecord {
        TelemetryRecord {
            id,
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            altitude: self.altitude,
            speed: self.speed,
            satellites: self.satellites,
        }
    }
}

fn float_field(obj: &serde_json::Map<String, serde_json::Value>, key: &str) -> Result<f64> {
    obj[key].as_f64().ok_or_else(|| {
        GpsBridgeError::Validation(format!("field {} must be numeric", key))
    })
}

fn int_field(obj: &serde_json::Map<String, serde_json::Value>, key: &str) -> Result<u32> {
    obj[key]
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            GpsBridgeError::Validation(format!("field {} must be a non-negative integer", key))
        })
}
