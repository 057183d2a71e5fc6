//! Sandbox Integrity Collector
//!
//! Attempts to create a marker file outside the application sandbox. A refused
//! write is the secure outcome and is reported as a negative verdict, not as a
//! probe failure.
//!
//! The marker is created exclusively, so an entry already at the marker path
//! (a planted link or someone else's file) is never written through or
//! removed. That case is a probe fault.

use super::{Finding, TechniqueCollector};
use crate::catalog::TechniqueId;
use crate::host::{HostEnvironment, ProbeError};

/// Restricted location the marker is written to
pub const MARKER_PATH: &str = "/private/jailbreak_test.txt";

/// Marker file contents
pub const MARKER_CONTENTS: &[u8] = b"jailbreak_test";

/// Collector for sandbox escape
pub struct SandboxIntegrityCollector {
    id: String,
    marker_path: String,
}

impl SandboxIntegrityCollector {
    pub fn new() -> Self {
        Self::with_marker_path(MARKER_PATH)
    }

    /// Probe a different restricted location
    pub fn with_marker_path(path: &str) -> Self {
        Self {
            id: "sandbox_integrity_collector".to_string(),
            marker_path: path.to_string(),
        }
    }
}

impl Default for SandboxIntegrityCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl TechniqueCollector for SandboxIntegrityCollector {
    fn technique(&self) -> TechniqueId {
        TechniqueId::SandboxIntegrity
    }

    fn collector_id(&self) -> &str {
        &self.id
    }

    fn probe(&self, host: &dyn HostEnvironment) -> Result<Finding, ProbeError> {
        match host.create_file(&self.marker_path, MARKER_CONTENTS) {
            Ok(()) => {}
            Err(e @ ProbeError::AlreadyExists(_)) => return Err(e),
            Err(e) => {
                log::debug!("{}: marker write refused: {}", self.id, e);
                return Ok(Finding::clean(
                    "Sandbox integrity intact - cannot write to restricted paths",
                ));
            }
        }

        // The marker is ours to remove
        if let Err(e) = host.remove_file(&self.marker_path) {
            log::warn!(
                "{}: could not remove marker {}: {}",
                self.id,
                self.marker_path,
                e
            );
        }

        Ok(Finding::detected(format!(
            "Successfully wrote to {} - sandbox compromised",
            self.marker_path
        )))
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
