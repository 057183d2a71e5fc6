//! Attestation builder
//!
//! Builds evidence-free attestations for network transport. Evidence text can
//! hold local paths and environment values, so only its hash is carried.

use chrono::{DateTime, Utc};
use detection_kit::catalog::Severity;
use detection_kit::{DetectionReport, TechniqueId};
use serde::Serialize;

use super::compute_evidence_hash;

/// Agent identity stamped on attestations
#[derive(Debug, Serialize)]
pub struct AgentInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// Verdict of one technique without evidence
#[derive(Debug, Serialize)]
pub struct CheckAttestation {
    pub technique: TechniqueId,
    pub detected: bool,
    pub severity: Severity,
    pub mstg_reference: &'static str,
    pub mitre_reference: &'static str,
}

/// Evidence-free scan attestation
#[derive(Debug, Serialize)]
pub struct AttestationResult {
    pub agent: AgentInfo,
    pub timestamp: DateTime<Utc>,
    pub device_model: String,
    pub platform_version: String,
    pub is_jailbroken: bool,
    pub threats_detected: usize,
    pub total_checks: usize,
    pub checks: Vec<CheckAttestation>,
    pub evidence_hash: String,
}

/// Build an attestation from a report
pub fn build_attestation(report: &DetectionReport) -> AttestationResult {
    let checks = report
        .results()
        .iter()
        .map(|result| CheckAttestation {
            technique: result.technique(),
            detected: result.detected(),
            severity: result.severity(),
            mstg_reference: result.mstg_reference(),
            mitre_reference: result.mitre_reference(),
        })
        .collect();

    AttestationResult {
        agent: AgentInfo {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        },
        timestamp: report.timestamp(),
        device_model: report.device_model().to_string(),
        platform_version: report.platform_version().to_string(),
        is_jailbroken: report.is_jailbroken(),
        threats_detected: report.threats_detected(),
        total_checks: report.total_checks(),
        checks,
        evidence_hash: compute_evidence_hash(report),
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
