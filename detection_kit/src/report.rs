//! # Report Model
//!
//! Immutable value types produced by a scan:
//!
//! - [`DetectionResult`] - the verdict of one technique
//! - [`DetectionReport`] - all eight results plus device context
//!
//! `threats_detected` and `is_jailbroken` are always derived from the results
//! and never stored on the report, so the summary can not drift from the data.
//!
//! ## Export Format
//!
//! ```json
//! {
//!   "timestamp": "2026-01-05T10:00:00Z",
//!   "device_model": "iPhone14,2",
//!   "platform_version": "Darwin 23.1.0",
//!   "is_jailbroken": true,
//!   "threats_detected": 1,
//!   "total_checks": 8,
//!   "results": [
//!     {
//!       "id": "7f0c...",
//!       "technique": "File System Check",
//!       "detected": true,
//!       "evidence": "Found 1 suspicious files: /Applications/Cydia.app",
//!       "timestamp": "2026-01-05T10:00:00Z",
//!       "mstg_reference": "MSTG-RESILIENCE-1",
//!       "mitre_reference": "T1426",
//!       "severity": "HIGH"
//!     }
//!   ]
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{describe, Severity, TechniqueId, TECHNIQUE_COUNT};
use crate::evidence;

// ============================================================================
// Detection Result
// ============================================================================

/// Verdict of a single technique, created once per technique per scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionResult {
    id: Uuid,
    technique: TechniqueId,
    detected: bool,
    evidence: String,
    timestamp: DateTime<Utc>,
}

impl DetectionResult {
    /// Create a result stamped with a fresh id and the current time
    pub fn new(technique: TechniqueId, detected: bool, evidence: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            technique,
            detected,
            evidence: evidence::clip(evidence.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn technique(&self) -> TechniqueId {
        self.technique
    }

    pub fn detected(&self) -> bool {
        self.detected
    }

    pub fn evidence(&self) -> &str {
        &self.evidence
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn severity(&self) -> Severity {
        describe(self.technique).severity
    }

    pub fn mstg_reference(&self) -> &'static str {
        describe(self.technique).resilience_reference
    }

    pub fn mitre_reference(&self) -> &'static str {
        describe(self.technique).attack_reference
    }

    pub fn to_export(&self) -> ResultExport {
        ResultExport {
            id: self.id,
            technique: self.technique,
            detected: self.detected,
            evidence: self.evidence.clone(),
            timestamp: self.timestamp,
            mstg_reference: self.mstg_reference().to_string(),
            mitre_reference: self.mitre_reference().to_string(),
            severity: self.severity(),
        }
    }

    /// Rebuild a result, checking the catalog fields the export repeats
    fn from_export(export: ResultExport) -> Result<Self, ReportError> {
        let technique = describe(export.technique);
        let mismatch = if export.severity != technique.severity {
            Some("severity")
        } else if export.mstg_reference != technique.resilience_reference {
            Some("mstg_reference")
        } else if export.mitre_reference != technique.attack_reference {
            Some("mitre_reference")
        } else {
            None
        };
        if let Some(field) = mismatch {
            return Err(ReportError::CatalogMismatch {
                technique: export.technique,
                field,
            });
        }

        Ok(Self {
            id: export.id,
            technique: export.technique,
            detected: export.detected,
            evidence: evidence::clip(export.evidence),
            timestamp: export.timestamp,
        })
    }
}

/// Exported form of a [`DetectionResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultExport {
    pub id: Uuid,
    pub technique: TechniqueId,
    pub detected: bool,
    pub evidence: String,
    pub timestamp: DateTime<Utc>,
    pub mstg_reference: String,
    pub mitre_reference: String,
    pub severity: Severity,
}

// ============================================================================
// Detection Report
// ============================================================================

/// Record of one complete scan across all techniques
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionReport {
    timestamp: DateTime<Utc>,
    device_model: String,
    platform_version: String,
    results: Vec<DetectionResult>,
}

impl DetectionReport {
    /// Build a report from a completed result set
    ///
    /// The results must hold exactly one entry per technique, in catalog order.
    pub fn from_results(
        results: Vec<DetectionResult>,
        device_model: impl Into<String>,
        platform_version: impl Into<String>,
    ) -> Result<Self, ReportError> {
        validate_results(&results)?;
        Ok(Self {
            timestamp: Utc::now(),
            device_model: device_model.into(),
            platform_version: platform_version.into(),
            results,
        })
    }

    /// Assemble a report from results the engine produced in catalog order
    pub(crate) fn assemble(
        results: Vec<DetectionResult>,
        device_model: String,
        platform_version: String,
    ) -> Self {
        debug_assert!(validate_results(&results).is_ok());
        Self {
            timestamp: Utc::now(),
            device_model,
            platform_version,
            results,
        }
    }

    /// Rebuild a report from a previously exported document
    ///
    /// Nothing recorded in the document is taken on trust: `total_checks`,
    /// `threats_detected` and `is_jailbroken` must agree with the exported
    /// results, and each result's severity and control references must match
    /// the catalog entry of its technique.
    pub fn from_export(export: ReportExport) -> Result<Self, ReportError> {
        let results = export
            .results
            .into_iter()
            .map(DetectionResult::from_export)
            .collect::<Result<Vec<_>, _>>()?;
        validate_results(&results)?;
        if export.total_checks != results.len() {
            return Err(ReportError::InconsistentTotal {
                recorded: export.total_checks,
                computed: results.len(),
            });
        }

        let report = Self {
            timestamp: export.timestamp,
            device_model: export.device_model,
            platform_version: export.platform_version,
            results,
        };

        if report.threats_detected() != export.threats_detected
            || report.is_jailbroken() != export.is_jailbroken
        {
            return Err(ReportError::InconsistentSummary {
                recorded: export.threats_detected,
                computed: report.threats_detected(),
            });
        }
        Ok(report)
    }

    /// Parse an exported JSON document
    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        let export: ReportExport = serde_json::from_str(json)?;
        Self::from_export(export)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn device_model(&self) -> &str {
        &self.device_model
    }

    pub fn platform_version(&self) -> &str {
        &self.platform_version
    }

    /// Results in catalog order
    pub fn results(&self) -> &[DetectionResult] {
        &self.results
    }

    pub fn result_for(&self, technique: TechniqueId) -> Option<&DetectionResult> {
        self.results.iter().find(|r| r.technique == technique)
    }

    /// Number of techniques that reported a detection
    pub fn threats_detected(&self) -> usize {
        self.results.iter().filter(|r| r.detected).count()
    }

    /// A single positive result of any severity flips the verdict
    pub fn is_jailbroken(&self) -> bool {
        self.threats_detected() > 0
    }

    pub fn total_checks(&self) -> usize {
        self.results.len()
    }

    /// Stable rendering of the per-technique verdicts
    ///
    /// Two scans of an unchanged host produce the same fingerprint even though
    /// ids, timestamps and volatile evidence differ.
    pub fn verdict_fingerprint(&self) -> String {
        self.results
            .iter()
            .map(|r| format!("{:?}={}", r.technique, u8::from(r.detected)))
            .collect::<Vec<_>>()
            .join(";")
    }

    pub fn to_export(&self) -> ReportExport {
        ReportExport {
            timestamp: self.timestamp,
            device_model: self.device_model.clone(),
            platform_version: self.platform_version.clone(),
            is_jailbroken: self.is_jailbroken(),
            threats_detected: self.threats_detected(),
            total_checks: self.total_checks(),
            results: self.results.iter().map(DetectionResult::to_export).collect(),
        }
    }

    /// Serialize the export document as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(&self.to_export())?)
    }
}

/// Exported form of a [`DetectionReport`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportExport {
    pub timestamp: DateTime<Utc>,
    pub device_model: String,
    #[serde(alias = "ios_version")]
    pub platform_version: String,
    pub is_jailbroken: bool,
    pub threats_detected: usize,
    pub total_checks: usize,
    pub results: Vec<ResultExport>,
}

fn validate_results(results: &[DetectionResult]) -> Result<(), ReportError> {
    if results.len() != TECHNIQUE_COUNT {
        return Err(ReportError::WrongResultCount {
            expected: TECHNIQUE_COUNT,
            found: results.len(),
        });
    }

    for (position, (result, expected)) in results.iter().zip(TechniqueId::ALL).enumerate() {
        if result.technique != expected {
            return Err(ReportError::OutOfOrder {
                position,
                expected,
                found: result.technique,
            });
        }
    }
    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

/// A result set that violates the report invariants
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Report requires {expected} results, found {found}")]
    WrongResultCount { expected: usize, found: usize },

    #[error("Result {position} should be '{expected}', found '{found}'")]
    OutOfOrder {
        position: usize,
        expected: TechniqueId,
        found: TechniqueId,
    },

    #[error("Recorded threat count {recorded} does not match results ({computed})")]
    InconsistentSummary { recorded: usize, computed: usize },

    #[error("Recorded check count {recorded} does not match results ({computed})")]
    InconsistentTotal { recorded: usize, computed: usize },

    #[error("Result '{technique}' carries a {field} that differs from the catalog")]
    CatalogMismatch {
        technique: TechniqueId,
        field: &'static str,
    },

    #[error("Failed to decode report: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure to encode a report; the report itself stays valid
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
