//! JSON Lines telemetry files with rotation.
//!
//! Files are named `telemetry_<session>_<seq>.jsonl`. A file is closed after
//! `max_records_per_file` records and only the newest `max_files_to_keep`
//! files are left on disk.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::TelemetryConfig;
use crate::error::Result;

const FILE_PREFIX: &str = "telemetry_";
const FILE_EXTENSION: &str = "jsonl";

/// One line of a telemetry file.
#[derive(Serialize)]
struct Record<'a, T> {
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    data: &'a T,
}

/// Rotating JSONL writer.
pub struct TelemetryLogger {
    dir: PathBuf,
    session: String,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    sequence: u32,
    records_in_file: usize,
    writer: Option<BufWriter<File>>,
}

impl std::fmt::Debug for TelemetryLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryLogger")
            .field("dir", &self.dir)
            .field("sequence", &self.sequence)
            .field("records_in_file", &self.records_in_file)
            .finish_non_exhaustive()
    }
}

impl TelemetryLogger {
    /// Creates the log directory if needed. No file is opened until the first
    /// record.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created
    pub fn new<P: AsRef<Path>>(dir: P, max_records_per_file: usize, max_files_to_keep: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            session: Utc::now().format("%Y%m%d_%H%M%S").to_string(),
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            sequence: 0,
            records_in_file: 0,
            writer: None,
        })
    }

    /// # Errors
    ///
    /// Returns error if the configured directory cannot be created
    pub fn from_config(config: &TelemetryConfig) -> Result<Self> {
        Self::new(&config.log_dir, config.max_records_per_file, config.max_files_to_keep)
    }

    /// Appends one record, rotating first when the current file is full.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or any file operation fails
    pub fn write<T: Serialize>(&mut self, data: &T) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let line = serde_json::to_string(&Record {
            timestamp: Utc::now(),
            data,
        })?;

        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{}", line)?;
            writer.flush()?;
        }
        self.records_in_file += 1;
        Ok(())
    }

    /// Path of the file currently being written, if any.
    #[must_use]
    pub fn current_path(&self) -> Option<PathBuf> {
        self.writer.as_ref().map(|_| self.path_for(self.sequence))
    }

    fn path_for(&self, sequence: u32) -> PathBuf {
        self.dir.join(format!(
            "{}{}_{:04}.{}",
            FILE_PREFIX, self.session, sequence, FILE_EXTENSION
        ))
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        self.sequence += 1;
        let path = self.path_for(self.sequence);
        let file = File::create(&path)?;
        debug!("Opened telemetry file {}", path.display());
        self.writer = Some(BufWriter::new(file));
        self.records_in_file = 0;
        self.prune()
    }

    /// Deletes the oldest telemetry files beyond the retention limit.
    fn prune(&self) -> Result<()> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_telemetry_file(path))
            .collect();
        files.sort();

        let excess = files.len().saturating_sub(self.max_files_to_keep);
        for path in files.into_iter().take(excess) {
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed old telemetry file {}", path.display()),
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
        Ok(())
    }
}

fn is_telemetry_file(path: &Path) -> bool {
    let named = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| n.starts_with(FILE_PREFIX));
    named && path.extension().map_or(false, |ext| ext == FILE_EXTENSION)
}

/// Samples `snapshots` every `interval` and writes each sample to `logger`.
///
/// Runs until the snapshot sender is dropped. Write errors are logged and the
/// loop keeps going.
pub async fn run_logger<T>(mut logger: TelemetryLogger, mut snapshots: watch::Receiver<T>, interval: Duration)
where
    T: Serialize + Clone,
{
    info!("Telemetry logging to {}", logger.dir.display());
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if snapshots.has_changed().is_err() {
            break;
        }
        let sample = snapshots.borrow_and_update().clone();
        if let Err(e) = logger.write(&sample) {
            warn!("Failed to write telemetry record: {}", e);
        }
    }
    debug!("Snapshot channel closed, telemetry logger stopping");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Clone, Serialize)]
    struct Sample {
        ticks: u64,
    }

    fn telemetry_files(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| is_telemetry_file(p))
            .collect();
        files.sort();
        files
    }

    fn lines(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    // ==================== Writer Tests ====================

    #[test]
    fn test_no_file_before_first_record() {
        let temp_dir = TempDir::new().unwrap();
        let logger = TelemetryLogger::new(temp_dir.path(), 10, 3).unwrap();
        assert!(logger.current_path().is_none());
        assert!(telemetry_files(temp_dir.path()).is_empty());
    }

    #[test]
    fn test_records_are_json_lines() {
        let temp_dir = TempDir::new().unwrap();
        let mut logger = TelemetryLogger::new(temp_dir.path(), 10, 3).unwrap();
        logger.write(&Sample { ticks: 1 }).unwrap();
        logger.write(&Sample { ticks: 2 }).unwrap();

        let path = logger.current_path().unwrap();
        let records = lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["ticks"], 2);
        assert!(records[0]["timestamp"].is_string());
    }

    #[test]
    fn test_rotates_after_max_records() {
        let temp_dir = TempDir::new().unwrap();
        let mut logger = TelemetryLogger::new(temp_dir.path(), 2, 10).unwrap();
        for ticks in 0..5 {
            logger.write(&Sample { ticks }).unwrap();
        }

        let files = telemetry_files(temp_dir.path());
        assert_eq!(files.len(), 3);
        assert_eq!(lines(&files[0]).len(), 2);
        assert_eq!(lines(&files[2]).len(), 1);
        assert_eq!(lines(&files[2])[0]["ticks"], 4);
    }

    #[test]
    fn test_keeps_only_newest_files() {
        let temp_dir = TempDir::new().unwrap();
        let mut logger = TelemetryLogger::new(temp_dir.path(), 1, 2).unwrap();
        for ticks in 0..5 {
            logger.write(&Sample { ticks }).unwrap();
        }

        let files = telemetry_files(temp_dir.path());
        assert_eq!(files.len(), 2);
        assert_eq!(lines(&files[0])[0]["ticks"], 3);
        assert_eq!(lines(&files[1])[0]["ticks"], 4);
    }

    #[test]
    fn test_ignores_unrelated_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "keep me").unwrap();
        let mut logger = TelemetryLogger::new(temp_dir.path(), 1, 1).unwrap();
        for ticks in 0..3 {
            logger.write(&Sample { ticks }).unwrap();
        }
        assert!(temp_dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let mut logger = TelemetryLogger::new(&nested, 10, 1).unwrap();
        logger.write(&Sample { ticks: 0 }).unwrap();
        assert_eq!(telemetry_files(&nested).len(), 1);
    }

    // ==================== Sampling Loop Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_run_logger_samples_until_sender_dropped() {
        let temp_dir = TempDir::new().unwrap();
        let logger = TelemetryLogger::new(temp_dir.path(), 100, 1).unwrap();
        let (tx, rx) = watch::channel(Sample { ticks: 0 });

        let task = tokio::spawn(run_logger(logger, rx, Duration::from_millis(100)));

        tokio::time::sleep(Duration::from_millis(250)).await;
        tx.send_replace(Sample { ticks: 42 });
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(tx);
        task.await.unwrap();

        let files = telemetry_files(temp_dir.path());
        let records = lines(&files[0]);
        assert!(records.len() >= 3);
        assert_eq!(records.last().unwrap()["ticks"], 42);
    }
}
