//! Symbolic Links Collector
//!
//! Jailbreaks relocate system directories to the data partition and leave a
//! symbolic link behind. Stock devices keep these as real directories.

use super::{Finding, TechniqueCollector};
use crate::catalog::TechniqueId;
use crate::evidence::{summarize_list, MAX_EVIDENCE_ITEMS};
use crate::host::{EntryKind, HostEnvironment, ProbeError};

/// System directories that must not be symbolic links
pub const SYSTEM_DIRECTORIES: &[&str] = &["/Applications", "/Library", "/usr/bin", "/usr/sbin"];

/// Collector for relocated system directories
pub struct SymbolicLinksCollector {
    id: String,
}

impl SymbolicLinksCollector {
    pub fn new() -> Self {
        Self {
            id: "symbolic_links_collector".to_string(),
        }
    }
}

impl Default for SymbolicLinksCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl TechniqueCollector for SymbolicLinksCollector {
    fn technique(&self) -> TechniqueId {
        TechniqueId::SymbolicLinks
    }

    fn collector_id(&self) -> &str {
        &self.id
    }

    fn probe(&self, host: &dyn HostEnvironment) -> Result<Finding, ProbeError> {
        let mut links = Vec::new();

        for path in SYSTEM_DIRECTORIES {
            match host.entry_kind(path) {
                Ok(EntryKind::Symlink) => links.push(*path),
                Ok(_) => {}
                // missing or unreadable is normal on a stock device
                Err(e) => log::trace!("{}: {}: {}", self.id, path, e),
            }
        }

        if links.is_empty() {
            return Ok(Finding::clean("No abnormal symbolic links detected"));
        }

        Ok(Finding::detected(format!(
            "Suspicious symbolic links found: {}",
            summarize_list(&links, MAX_EVIDENCE_ITEMS)
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
    fn test_real_directories_are_clean() {
        let host = SimulatedHost::new()
            .with_directory("/Applications")
            .with_directory("/Library")
            .with_directory("/usr/bin");
        let finding = SymbolicLinksCollector::new().probe(&host).unwrap();
        assert!(!finding.detected);
        assert_eq!(finding.evidence, "No abnormal symbolic links detected");
    }

    #[test]
    fn test_relocated_directories_detected() {
        let host = SimulatedHost::new()
            .with_symlink("/Applications")
            .with_directory("/Library")
            .with_symlink("/usr/sbin");
        let finding = SymbolicLinksCollector::new().probe(&host).unwrap();
        assert!(finding.detected);
        assert_eq!(
            finding.evidence,
            "Suspicious symbolic links found: /Applications, /usr/sbin"
        );
    }

    #[test]
    fn test_unreadable_entry_is_ignored() {
        let host = SimulatedHost::new()
            .with_symlink("/Library")
            .deny_path("/Library");
        let finding = SymbolicLinksCollector::new().probe(&host).unwrap();
        assert!(!finding.detected);
    }
}
