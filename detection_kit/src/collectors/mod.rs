//! # Evidence Collectors
//!
//! One collector per catalog technique. A collector runs a single synchronous
//! probe against a [`HostEnvironment`] and turns the outcome into exactly one
//! [`DetectionResult`].
//!
//! Collectors never fail a scan. `probe` may return a [`ProbeError`], and the
//! provided `collect` folds it into a negative verdict with evidence that
//! explains the benign interpretation.

pub mod dynamic_libraries;
pub mod environment_variables;
pub mod file_system;
pub mod fork_restriction;
pub mod sandbox_integrity;
pub mod symbolic_links;
pub mod system_calls;
pub mod url_schemes;

pub use dynamic_libraries::DynamicLibrariesCollector;
pub use environment_variables::EnvironmentVariablesCollector;
pub use file_system::FileSystemCollector;
pub use fork_restriction::ForkRestrictionCollector;
pub use sandbox_integrity::SandboxIntegrityCollector;
pub use symbolic_links::SymbolicLinksCollector;
pub use system_calls::SystemCallsCollector;
pub use url_schemes::UrlSchemesCollector;

use crate::catalog::TechniqueId;
use crate::host::{HostEnvironment, ProbeError};
use crate::report::DetectionResult;

/// Verdict of one probe before it is stamped into a [`DetectionResult`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub detected: bool,
    pub evidence: String,
}

impl Finding {
    pub fn detected(evidence: impl Into<String>) -> Self {
        Self {
            detected: true,
            evidence: evidence.into(),
        }
    }

    pub fn clean(evidence: impl Into<String>) -> Self {
        Self {
            detected: false,
            evidence: evidence.into(),
        }
    }
}

/// Runnable implementation of one technique
pub trait TechniqueCollector: Send + Sync {
    /// Technique this collector reports on
    fn technique(&self) -> TechniqueId;

    /// Stable collector identifier used in logs
    fn collector_id(&self) -> &str;

    /// Run the probe
    fn probe(&self, host: &dyn HostEnvironment) -> Result<Finding, ProbeError>;

    /// Run the probe and produce the technique's result
    ///
    /// A probe fault degrades to "no evidence of compromise".
    fn collect(&self, host: &dyn HostEnvironment) -> DetectionResult {
        let finding = match self.probe(host) {
            Ok(finding) => finding,
            Err(e) => {
                log::warn!(
                    "{}: probe failed, reporting not detected: {}",
                    self.collector_id(),
                    e
                );
                Finding::clean(format!(
                    "Probe unavailable ({}) - no evidence of compromise",
                    e
                ))
            }
        };

        log::debug!(
            "{}: detected={} evidence=\"{}\"",
            self.collector_id(),
            finding.detected,
            finding.evidence
        );
        DetectionResult::new(self.technique(), finding.detected, finding.evidence)
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::simulated::SimulatedFault;
    use crate::host::SimulatedHost;

    #[test]
    fn test_probe_error_degrades_to_negative_verdict() {
        let host = SimulatedHost::new()
            .with_module("/usr/lib/frida-agent.dylib")
            .fail_probe(SimulatedFault::ModuleList);

        let result = DynamicLibrariesCollector::new().collect(&host);
        assert_eq!(result.technique(), TechniqueId::DynamicLibraries);
        assert!(!result.detected());
        assert!(result.evidence().starts_with("Probe unavailable"));
        assert!(result.evidence().contains("no evidence of compromise"));
    }

    #[test]
    fn test_collect_stamps_technique() {
        let host = SimulatedHost::new();
        let result = FileSystemCollector::new().collect(&host);
        assert_eq!(result.technique(), TechniqueId::FileSystem);
        assert_eq!(result.evidence(), "No suspicious files found");
    }
}
