//! # Telemetry Store
//!
//! Durable, append-only record log with a stable schema.
//!
//! Records are persisted as JSON Lines (one record per line) in
//! `telemetry.jsonl` under the configured data directory, fsynced per
//! append, and mirrored in an in-memory snapshot for reads. The store is
//! the single owner of the log: appends are serialized behind an internal
//! writer lock (single-writer discipline), and readers clone the snapshot
//! under a read lock so they can never observe a half-written record.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use tracing::{info, warn};

use crate::error::{GpsBridgeError, Result};
use crate::record::{TelemetryReading, TelemetryRecord};

/// File name of the record log inside the data directory
pub const LOG_FILE_NAME: &str = "telemetry.jsonl";

/// Append-only telemetry record log
pub struct TelemetryStore {
    /// Writer state: open log handle plus the next id to assign.
    /// Held only while appending.
    writer: Mutex<LogWriter>,
    /// In-memory snapshot of every persisted record, insertion order
    records: RwLock<Vec<TelemetryRecord>>,
}

struct LogWriter {
    file: File,
    next_id: u64,
}

impl std::fmt::Debug for TelemetryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryStore")
            .field("records", &self.len())
            .finish_non_exhaustive()
    }
}

impl TelemetryStore {
    /// Open (or create) the record log in `data_dir`
    ///
    /// Replays any existing log into the in-memory snapshot. Lines that
    /// fail to parse are skipped with a warning so one corrupt line does
    /// not take the rest of the history with it. Id assignment resumes at
    /// max(id) + 1.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the data directory or log file cannot be
    /// created or read.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir).map_err(|e| {
            GpsBridgeError::Storage(format!(
                "failed to create data directory {}: {}",
                data_dir.display(),
                e
            ))
        })?;

        let log_path = data_dir.join(LOG_FILE_NAME);
        let records = Self::replay(&log_path)?;
        let next_id = records.last().map(|r| r.id + 1).unwrap_or(1);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| {
                GpsBridgeError::Storage(format!(
                    "failed to open record log {}: {}",
                    log_path.display(),
                    e
                ))
            })?;

        if !records.is_empty() {
            info!(
                "Loaded {} records from {}, resuming at id {}",
                records.len(),
                log_path.display(),
                next_id
            );
        }

        Ok(Self {
            writer: Mutex::new(LogWriter { file, next_id }),
            records: RwLock::new(records),
        })
    }

    /// Path of the record log for a given data directory
    pub fn log_path(data_dir: &Path) -> PathBuf {
        data_dir.join(LOG_FILE_NAME)
    }

    /// Append a validated reading as a new record
    ///
    /// Assigns the next id, synthesizes the server-side timestamp, and
    /// persists the record durably (write + fsync) before it becomes
    /// visible to readers. Returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the log cannot be written or synced; nothing
    /// is published to readers in that case.
    pub fn append(&self, reading: TelemetryReading) -> Result<TelemetryRecord> {
        let mut writer = self.writer.lock().expect("store writer lock poisoned");

        let record = reading.into_record(writer.next_id);
        let line = serde_json::to_string(&record)
            .map_err(|e| GpsBridgeError::Storage(format!("failed to encode record: {}", e)))?;

        writeln!(writer.file, "{}", line)
            .map_err(|e| GpsBridgeError::Storage(format!("failed to append record: {}", e)))?;
        writer
            .file
            .sync_all()
            .map_err(|e| GpsBridgeError::Storage(format!("failed to sync record log: {}", e)))?;

        writer.next_id += 1;

        // Publish only after the record is durable. Readers either see the
        // whole record or none of it.
        self.records
            .write()
            .expect("store records lock poisoned")
            .push(record.clone());

        Ok(record)
    }

    /// All records in insertion order
    ///
    /// Snapshot-consistent: a call racing an in-flight append may return
    /// with or without that record, never a partial one. An empty store
    /// yields an empty vec, not an error.
    pub fn list_all(&self) -> Vec<TelemetryRecord> {
        self.records
            .read()
            .expect("store records lock poisoned")
            .clone()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records
            .read()
            .expect("store records lock poisoned")
            .len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn replay(log_path: &Path) -> Result<Vec<TelemetryRecord>> {
        if !log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(log_path).map_err(|e| {
            GpsBridgeError::Storage(format!(
                "failed to read record log {}: {}",
                log_path.display(),
                e
            ))
        })?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.map_err(|e| {
                GpsBridgeError::Storage(format!(
                    "failed to read record log {}: {}",
                    log_path.display(),
                    e
                ))
            })?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<TelemetryRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Skipping unparseable record at line {}: {}", line_num + 1, e);
                }
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn reading(lat: f64, satellites: u32) -> TelemetryReading {
        TelemetryReading {
            latitude: lat,
            longitude: 2.0,
            altitude: 30.0,
            speed: 0.5,
            satellites,
        }
    }

    #[test]
    fn test_append_assigns_increasing_ids() {
        let temp_dir = TempDir::new().unwrap();
        let store = TelemetryStore::open(temp_dir.path()).unwrap();

        let a = store.append(reading(1.0, 4)).unwrap();
        let b = store.append(reading(2.0, 5)).unwrap();
        let c = store.append(reading(3.0, 6)).unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(c.id, 3);
    }

    #[test]
    fn test_list_all_preserves_insertion_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = TelemetryStore::open(temp_dir.path()).unwrap();

        store.append(reading(1.0, 4)).unwrap();
        store.append(reading(2.0, 5)).unwrap();
        store.append(reading(3.0, 6)).unwrap();

        let all = store.list_all();
        let latitudes: Vec<f64> = all.iter().map(|r| r.latitude).collect();
        assert_eq!(latitudes, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_empty_store_lists_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = TelemetryStore::open(temp_dir.path()).unwrap();

        assert!(store.is_empty());
        assert!(store.list_all().is_empty());
    }

    #[test]
    fn test_consecutive_reads_are_identical() {
        let temp_dir = TempDir::new().unwrap();
        let store = TelemetryStore::open(temp_dir.path()).unwrap();

        store.append(reading(1.0, 4)).unwrap();
        store.append(reading(2.0, 5)).unwrap();

        assert_eq!(store.list_all(), store.list_all());
    }

    #[test]
    fn test_reopen_preserves_records_and_resumes_ids() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = TelemetryStore::open(temp_dir.path()).unwrap();
            store.append(reading(1.0, 4)).unwrap();
            store.append(reading(2.0, 5)).unwrap();
        }

        let store = TelemetryStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.len(), 2);

        let c = store.append(reading(3.0, 6)).unwrap();
        assert_eq!(c.id, 3);

        let all = store.list_all();
        assert_eq!(all[0].latitude, 1.0);
        assert_eq!(all[2].latitude, 3.0);
    }

    #[test]
    fn test_reopen_skips_corrupt_lines() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = TelemetryStore::open(temp_dir.path()).unwrap();
            store.append(reading(1.0, 4)).unwrap();
        }

        // Simulate a torn write at the tail of the log
        let log_path = TelemetryStore::log_path(temp_dir.path());
        let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
        writeln!(file, "{{\"id\": 99, \"truncat").unwrap();

        let store = TelemetryStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.list_all()[0].latitude, 1.0);
    }

    #[test]
    fn test_records_survive_on_disk_as_json_lines() {
        let temp_dir = TempDir::new().unwrap();
        let store = TelemetryStore::open(temp_dir.path()).unwrap();
        store.append(reading(48.85, 7)).unwrap();

        let contents =
            std::fs::read_to_string(TelemetryStore::log_path(temp_dir.path())).unwrap();
        let line = contents.lines().next().unwrap();
        let parsed: TelemetryRecord = serde_json::from_str(line).unwrap();
        assert_eq!(parsed.latitude, 48.85);
        assert_eq!(parsed.satellites, 7);
        assert!(!parsed.timestamp.is_empty());
    }

    #[test]
    fn test_concurrent_appends_and_reads() {
        use std::sync::Arc;
        use std::thread;

        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(TelemetryStore::open(temp_dir.path()).unwrap());

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..50 {
                    store.append(reading(i as f64, 4)).unwrap();
                }
            })
        };

        let reader = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..50 {
                    let snapshot = store.list_all();
                    // Every visible record is complete and in order
                    for (i, record) in snapshot.iter().enumerate() {
                        assert_eq!(record.id, i as u64 + 1);
                        assert!(!record.timestamp.is_empty());
                    }
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();

        let all = store.list_all();
        assert_eq!(all.len(), 50);
        let ids: Vec<u64> = all.iter().map(|r| r.id).collect();
        assert_eq!(ids, (1..=50).collect::<Vec<u64>>());
    }
}
