//! # Summary Storage
//!
//! Minimal projection of the latest scan, written by the caller after each
//! scan and read independently by status displays.
//!
//! Storage is an injected port ([`SummaryStore`]); there is no process-wide
//! store. [`JsonFileStore`] persists to a JSON file and [`MemoryStore`] keeps
//! the summary in memory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::report::DetectionReport;

/// Persisted projection of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub is_jailbroken: bool,
    pub threats_detected: usize,
    pub last_scan: DateTime<Utc>,
}

impl ScanSummary {
    pub fn from_report(report: &DetectionReport) -> Self {
        Self {
            is_jailbroken: report.is_jailbroken(),
            threats_detected: report.threats_detected(),
            last_scan: report.timestamp(),
        }
    }

    /// Whether the last scan is older than `max_age` at `now`
    pub fn is_stale(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_scan) > max_age
    }

    fn is_consistent(&self) -> bool {
        self.is_jailbroken == (self.threats_detected > 0)
    }
}

/// Errors raised by a summary store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize summary: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt summary in {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stored summary is inconsistent: is_jailbroken={is_jailbroken}, threats_detected={threats_detected}")]
    Inconsistent {
        is_jailbroken: bool,
        threats_detected: usize,
    },
}

/// Storage port for the latest scan summary
pub trait SummaryStore: Send + Sync {
    /// Replace the stored summary
    fn save(&self, summary: &ScanSummary) -> Result<(), StoreError>;

    /// Latest stored summary, or `None` if no scan was recorded yet
    fn load(&self) -> Result<Option<ScanSummary>, StoreError>;
}

fn checked(summary: ScanSummary) -> Result<ScanSummary, StoreError> {
    if summary.is_consistent() {
        Ok(summary)
    } else {
        Err(StoreError::Inconsistent {
            is_jailbroken: summary.is_jailbroken,
            threats_detected: summary.threats_detected,
        })
    }
}

// ============================================================================
// JSON File Store
// ============================================================================

/// Summary persisted as a JSON document
///
/// Writes go to a sibling temporary file that is renamed into place, so a
/// reader never observes a partial document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl SummaryStore for JsonFileStore {
    fn save(&self, summary: &ScanSummary) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Self::io_error(parent, e))?;
        }

        let json = serde_json::to_string_pretty(summary)?;
        let temp = self.temp_path();
        let written = fs::write(&temp, json)
            .map_err(|e| Self::io_error(&temp, e))
            .and_then(|()| fs::rename(&temp, &self.path).map_err(|e| Self::io_error(&self.path, e)));
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Could not remove {}: {}", temp.display(), cleanup);
                }
            }
            return Err(e);
        }

        log::debug!("Saved scan summary to {}", self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<Option<ScanSummary>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_error(&self.path, e)),
        };

        let summary: ScanSummary =
            serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        checked(summary).map(Some)
    }
}

// ============================================================================
// Memory Store
// ============================================================================

/// In-memory summary store
#[derive(Debug, Default)]
pub struct MemoryStore {
    summary: Mutex<Option<ScanSummary>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SummaryStore for MemoryStore {
    fn save(&self, summary: &ScanSummary) -> Result<(), StoreError> {
        let summary = checked(summary.clone())?;
        *self.summary.lock().unwrap_or_else(|e| e.into_inner()) = Some(summary);
        Ok(())
    }

    fn load(&self) -> Result<Option<ScanSummary>, StoreError> {
        Ok(self
            .summary
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
