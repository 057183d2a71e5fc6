//! System Calls Collector
//!
//! Issues a raw stat(2) on paths the sandbox should hide. Hooked file APIs may
//! lie about existence while the system call still succeeds.

use super::{Finding, TechniqueCollector};
use crate::catalog::TechniqueId;
use crate::evidence::{summarize_list, MAX_EVIDENCE_ITEMS};
use crate::host::{HostEnvironment, ProbeError};

/// Paths that stat(2) must not reach under normal sandboxing
pub const RESTRICTED_PATHS: &[&str] = &["/bin/bash", "/usr/sbin/sshd", "/etc/apt"];

/// Collector for stat(2) visibility of restricted paths
pub struct SystemCallsCollector {
    id: String,
}

impl SystemCallsCollector {
    pub fn new() -> Self {
        Self {
            id: "system_calls_collector".to_string(),
        }
    }
}

impl Default for SystemCallsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl TechniqueCollector for SystemCallsCollector {
    fn technique(&self) -> TechniqueId {
        TechniqueId::SystemCalls
    }

    fn collector_id(&self) -> &str {
        &self.id
    }

    fn probe(&self, host: &dyn HostEnvironment) -> Result<Finding, ProbeError> {
        let accessible: Vec<&str> = RESTRICTED_PATHS
            .iter()
            .copied()
            .filter(|path| host.stat(path).is_ok())
            .collect();

        if accessible.is_empty() {
            return Ok(Finding::clean(
                "System calls behave normally - restricted paths inaccessible",
            ));
        }

        Ok(Finding::detected(format!(
            "stat() succeeded on restricted paths: {}",
            summarize_list(&accessible, MAX_EVIDENCE_ITEMS)
        )))
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
    use crate::host::SimulatedHost;

    #[test]
    fn test_restricted_paths_inaccessible() {
        let finding = SystemCallsCollector::new()
            .probe(&SimulatedHost::new())
            .unwrap();
        assert!(!finding.detected);
        assert_eq!(
            finding.evidence,
            "System calls behave normally - restricted paths inaccessible"
        );
    }

    #[test]
    fn test_stat_success_detected() {
        let host = SimulatedHost::new()
            .with_file("/usr/sbin/sshd")
            .with_directory("/etc/apt/");
        let finding = SystemCallsCollector::new().probe(&host).unwrap();
        assert!(finding.detected);
        assert_eq!(
            finding.evidence,
            "stat() succeeded on restricted paths: /usr/sbin/sshd, /etc/apt"
        );
    }
}
