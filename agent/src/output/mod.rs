//! Output generation module
//!
//! Provides builders for different output formats:
//! - Full report with evidence
//! - Attestation (verdicts without evidence text, plus evidence hash)
//! - Summary (persisted-summary projection)
//! - Console (human-readable)
//!
//! ## Hash Architecture
//!
//! The attestation carries a SHA-256 over the evidence strings in catalog
//! order. A verifier holding the full report recomputes the same hash with
//! [`compute_evidence_hash`] to confirm both documents describe one scan.

mod attestation;
mod console;
mod full;
mod summary;

pub use attestation::build_attestation;
pub use console::{print_report, print_status};
pub use full::build_full_result;
pub use summary::build_summary;

use detection_kit::report::ExportError;
use detection_kit::DetectionReport;
use sha2::{Digest, Sha256};

use crate::config::OutputFormat;

/// Build output in the specified format
pub fn build_output(report: &DetectionReport, format: OutputFormat) -> Result<String, OutputError> {
    let json = match format {
        OutputFormat::Full => build_full_result(report)?,
        OutputFormat::Attestation => {
            let result = build_attestation(report);
            serde_json::to_string_pretty(&result)
                .map_err(|e| OutputError::Serialization(e.to_string()))?
        }
        OutputFormat::Summary => {
            let result = build_summary(report);
            serde_json::to_string_pretty(&result)
                .map_err(|e| OutputError::Serialization(e.to_string()))?
        }
    };
    Ok(json)
}

// ============================================================================
// Hash Helpers
// ============================================================================

/// Hash the evidence strings of a report in catalog order
///
/// Each evidence string is followed by a `|` separator before hashing.
pub fn compute_evidence_hash(report: &DetectionReport) -> String {
    let mut hasher = Sha256::new();
    for result in report.results() {
        hasher.update(result.evidence().as_bytes());
        hasher.update(b"|");
    }
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur during output generation
#[derive(Debug)]
pub enum OutputError {
    /// Failed to serialize result
    Serialization(String),
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputError::Serialization(msg) => write!(f, "Failed to serialize output: {}", msg),
        }
    }
}

impl std::error::Error for OutputError {}

impl From<ExportError> for OutputError {
    fn from(e: ExportError) -> Self {
        OutputError::Serialization(e.to_string())
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use detection_kit::host::SimulatedHost;
    use detection_kit::registry::create_default_registry;
    use detection_kit::{ExecutionMode, ScanEngine};
    use std::sync::Arc;

    /// Scan a simulated host with a Cydia bundle and an injected library
    pub(crate) fn compromised_report() -> DetectionReport {
        let host = SimulatedHost::new()
            .with_directory("/Applications/Cydia.app")
            .with_env("DYLD_INSERT_LIBRARIES", "/tmp/evil.dylib")
            .with_device("iPhone14,2", "iOS 17.2");
        ScanEngine::new(create_default_registry().unwrap(), Arc::new(host))
            .unwrap()
            .with_mode(ExecutionMode::Sequential)
            .perform_scan()
    }

    #[test]
    fn test_evidence_hash_format_and_stability() {
        let report = compromised_report();
        let hash = compute_evidence_hash(&report);
        assert!(hash.starts_with("sha256:"));
        assert_eq!(hash.len(), "sha256:".len() + 64);
        assert_eq!(hash, compute_evidence_hash(&report));

        // Same host state, same evidence, same hash
        assert_eq!(hash, compute_evidence_hash(&compromised_report()));
    }

    #[test]
    fn test_every_format_is_valid_json() {
        let report = compromised_report();
        for format in [
            OutputFormat::Full,
            OutputFormat::Summary,
            OutputFormat::Attestation,
        ] {
            let json = build_output(&report, format).unwrap();
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["is_jailbroken"], true, "format {}", format);
            assert_eq!(value["threats_detected"], 2, "format {}", format);
        }
    }
}
