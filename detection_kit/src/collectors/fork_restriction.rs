//! Fork Restriction Collector
//!
//! Stock devices do not ship a shell interpreter. Its presence is the only
//! signal that flips this verdict; the spawn-attribute check is recorded in
//! the evidence but is available on unmodified systems too.

use super::{Finding, TechniqueCollector};
use crate::catalog::TechniqueId;
use crate::host::{HostEnvironment, ProbeError};

/// Shell interpreter that must be absent on a stock device
pub const SHELL_PATH: &str = "/bin/sh";

/// Collector for process-spawn restrictions
pub struct ForkRestrictionCollector {
    id: String,
}

impl ForkRestrictionCollector {
    pub fn new() -> Self {
        Self {
            id: "fork_restriction_collector".to_string(),
        }
    }
}

impl Default for ForkRestrictionCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl TechniqueCollector for ForkRestrictionCollector {
    fn technique(&self) -> TechniqueId {
        TechniqueId::ForkRestriction
    }

    fn collector_id(&self) -> &str {
        &self.id
    }

    fn probe(&self, host: &dyn HostEnvironment) -> Result<Finding, ProbeError> {
        if host.path_exists(SHELL_PATH) {
            return Ok(Finding::detected(format!(
                "Found {} - process spawning available",
                SHELL_PATH
            )));
        }

        // informational only
        let evidence = match host.spawn_attributes_available() {
            Ok(true) => "Process spawning properly restricted",
            Ok(false) => "System correctly restricts process creation",
            Err(e) => {
                log::debug!("{}: spawn attribute check unavailable: {}", self.id, e);
                "System correctly restricts process creation"
            }
        };
        Ok(Finding::clean(evidence))
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
    fn test_shell_present_is_detected() {
        let host = SimulatedHost::new().with_file("/bin/sh");
        let finding = ForkRestrictionCollector::new().probe(&host).unwrap();
        assert!(finding.detected);
        assert_eq!(finding.evidence, "Found /bin/sh - process spawning available");
    }

    #[test]
    fn test_spawn_attributes_never_flip_verdict() {
        for available in [true, false] {
            let host = SimulatedHost::new().with_spawn_attributes(available);
            let finding = ForkRestrictionCollector::new().probe(&host).unwrap();
            assert!(!finding.detected, "spawn attributes {}", available);
        }

        let host = SimulatedHost::new().fail_probe(SimulatedFault::SpawnAttributes);
        let finding = ForkRestrictionCollector::new().probe(&host).unwrap();
        assert!(!finding.detected);
    }

    #[test]
    fn test_evidence_reflects_spawn_check() {
        let host = SimulatedHost::new();
        let finding = ForkRestrictionCollector::new().probe(&host).unwrap();
        assert_eq!(finding.evidence, "Process spawning properly restricted");

        let host = SimulatedHost::new().with_spawn_attributes(false);
        let finding = ForkRestrictionCollector::new().probe(&host).unwrap();
        assert_eq!(finding.evidence, "System correctly restricts process creation");
    }
}
