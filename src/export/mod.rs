//! # Export Module
//!
//! Renders the full record set into a self-contained HTML document and
//! persists it as the downloadable snapshot artifact.
//!
//! The artifact is rewritten after every successful ingest, so it is
//! consistent with the latest record as of render time. Writes go through
//! a temp file + fsync + rename sequence: a reader either sees the old
//! artifact or the new one, never a partial document.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{GpsBridgeError, Result};
use crate::record::TelemetryRecord;

/// File name of the export artifact inside the data directory
pub const ARTIFACT_FILE_NAME: &str = "gps_history.html";

/// Renders and persists the export snapshot
#[derive(Debug, Clone)]
pub struct SnapshotExporter {
    artifact_path: PathBuf,
}

impl SnapshotExporter {
    /// Exporter writing its artifact into `data_dir`
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            artifact_path: data_dir.as_ref().join(ARTIFACT_FILE_NAME),
        }
    }

    /// Path of the export artifact
    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Render the record set and overwrite the artifact
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the artifact cannot be written; the previous
    /// artifact (if any) is left untouched in that case.
    pub fn write_snapshot(&self, records: &[TelemetryRecord]) -> Result<()> {
        let html = render_html(records);
        let temp_path = self.artifact_path.with_extension("tmp");

        if let Some(parent) = self.artifact_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                GpsBridgeError::Storage(format!("failed to create export directory: {}", e))
            })?;
        }

        let mut file = File::create(&temp_path)
            .map_err(|e| GpsBridgeError::Storage(format!("failed to write snapshot: {}", e)))?;
        file.write_all(html.as_bytes())
            .map_err(|e| GpsBridgeError::Storage(format!("failed to write snapshot: {}", e)))?;
        file.sync_all()
            .map_err(|e| GpsBridgeError::Storage(format!("failed to sync snapshot: {}", e)))?;

        fs::rename(&temp_path, &self.artifact_path)
            .map_err(|e| GpsBridgeError::Storage(format!("failed to publish snapshot: {}", e)))?;

        Ok(())
    }

    /// Read back the most recently written artifact verbatim
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no snapshot has ever been written,
    /// `Storage` if the artifact exists but cannot be read.
    pub fn read_snapshot(&self) -> Result<String> {
        if !self.artifact_path.exists() {
            return Err(GpsBridgeError::NotFound(
                "no export has been generated yet".to_string(),
            ));
        }

        fs::read_to_string(&self.artifact_path)
            .map_err(|e| GpsBridgeError::Storage(format!("failed to read snapshot: {}", e)))
    }
}

/// Render records into a standalone HTML table, one row per record
fn render_html(records: &[TelemetryRecord]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <title>GPS Data Export</title>\n\
         </head>\n\
         <body>\n\
         <h1>GPS Data History</h1>\n\
         <table border=\"1\">\n\
         <tr>\n\
         <th>Timestamp</th>\n\
         <th>Latitude</th>\n\
         <th>Longitude</th>\n\
         <th>Altitude</th>\n\
         <th>Speed</th>\n\
         <th>Satellites</th>\n\
         </tr>\n",
    );

    for record in records {
        html.push_str(&format!(
            "<tr>\n\
             <td>{}</td>\n\
             <td>{}</td>\n\
             <td>{}</td>\n\
             <td>{}</td>\n\
             <td>{}</td>\n\
             <td>{}</td>\n\
             </tr>\n",
            record.timestamp,
            record.latitude,
            record.longitude,
            record.altitude,
            record.speed,
            record.satellites,
        ));
    }

    html.push_str("</table>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: u64, lat: f64) -> TelemetryRecord {
        TelemetryRecord {
            id,
            timestamp: format!("2026-08-06 12:00:0{}", id),
            latitude: lat,
            longitude: 2.3522,
            altitude: 35.0,
            speed: 1.2,
            satellites: 7,
        }
    }

    #[test]
    fn test_render_contains_header_and_rows() {
        let html = render_html(&[record(1, 48.8566), record(2, 48.8570)]);

        assert!(html.contains("<th>Timestamp</th>"));
        assert!(html.contains("<th>Satellites</th>"));
        assert!(html.contains("48.8566"));
        assert!(html.contains("48.857"));
        assert!(html.contains("2026-08-06 12:00:01"));
        assert_eq!(html.matches("<tr>").count(), 3, "header row + 2 data rows");
    }

    #[test]
    fn test_render_empty_set_is_header_only() {
        let html = render_html(&[]);
        assert!(html.contains("<th>Timestamp</th>"));
        assert_eq!(html.matches("<tr>").count(), 1);
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = SnapshotExporter::new(temp_dir.path());

        exporter.write_snapshot(&[record(1, 48.8566)]).unwrap();

        let artifact = exporter.read_snapshot().unwrap();
        assert!(artifact.contains("48.8566"));

        // No temp file left behind
        assert!(!exporter.artifact_path().with_extension("tmp").exists());
    }

    #[test]
    fn test_read_before_any_write_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = SnapshotExporter::new(temp_dir.path());

        match exporter.read_snapshot() {
            Err(GpsBridgeError::NotFound(_)) => {}
            other => panic!("expected NotFound, got: {:?}", other),
        }
    }

    #[test]
    fn test_rewrite_overwrites_previous_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = SnapshotExporter::new(temp_dir.path());

        exporter.write_snapshot(&[record(1, 1.0)]).unwrap();
        exporter
            .write_snapshot(&[record(1, 1.0), record(2, 2.0)])
            .unwrap();

        let artifact = exporter.read_snapshot().unwrap();
        assert_eq!(artifact.matches("<tr>").count(), 3);
    }
}
