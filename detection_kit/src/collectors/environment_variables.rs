//! Environment Variables Collector
//!
//! Inspects the loader-injection variable and the substrate safe-mode flags.
//!
//! `DYLD_INSERT_LIBRARIES` is a colon-separated list. Each entry is accepted
//! when a path component names a known debugging-tool library or the entry
//! lives under a system library prefix; any other entry is flagged, as is
//! any entry containing a `..` component. The safe-mode variables are
//! flagged whenever they hold a non-empty value.

use std::path::{Component, Path};

use super::{Finding, TechniqueCollector};
use crate::catalog::TechniqueId;
use crate::evidence::{summarize_list, MAX_EVIDENCE_ITEMS};
use crate::host::{HostEnvironment, ProbeError};

/// Loader code-injection variable
pub const INJECTION_VARIABLE: &str = "DYLD_INSERT_LIBRARIES";

/// Substrate safe-mode variables
pub const SAFE_MODE_VARIABLES: &[&str] = &["_MSSafeMode", "_SafeMode"];

/// Debugging-tool libraries injected by the IDE and test harness
pub const ALLOWED_INJECTED_LIBRARIES: &[&str] = &[
    "libViewDebuggerSupport.dylib",
    "libMainThreadChecker.dylib",
    "libBacktraceRecording.dylib",
    "libMallocStackLogging.dylib",
    "libggdb.dylib",
    "libXCTTargetBootstrap.dylib",
    "IDEBundleInjection.framework",
];

/// System library directories
pub const ALLOWED_LIBRARY_PREFIXES: &[&str] = &["/usr/lib/", "/System/Library/"];

/// Collector for injection-related environment variables
pub struct EnvironmentVariablesCollector {
    id: String,
}

impl EnvironmentVariablesCollector {
    pub fn new() -> Self {
        Self {
            id: "environment_variables_collector".to_string(),
        }
    }
}

impl Default for EnvironmentVariablesCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether one injected library entry is a legitimate debugging library
///
/// Entries that climb with `..` are never allowed, since the textual prefix
/// would no longer say where the library lives.
fn is_allowed_injection(entry: &str) -> bool {
    let path = Path::new(entry);
    if path
        .components()
        .any(|component| component == Component::ParentDir)
    {
        return false;
    }

    let names_allowed_library = path.components().any(|component| {
        ALLOWED_INJECTED_LIBRARIES
            .iter()
            .any(|library| component.as_os_str() == *library)
    });
    names_allowed_library
        || ALLOWED_LIBRARY_PREFIXES
            .iter()
            .any(|prefix| entry.starts_with(prefix))
}

/// Whether an injection variable value contains an entry outside the allow-lists
fn has_foreign_injection(value: &str) -> bool {
    value
        .split(':')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .any(|entry| !is_allowed_injection(entry))
}

impl TechniqueCollector for EnvironmentVariablesCollector {
    fn technique(&self) -> TechniqueId {
        TechniqueId::EnvironmentVariables
    }

    fn collector_id(&self) -> &str {
        &self.id
    }

    fn probe(&self, host: &dyn HostEnvironment) -> Result<Finding, ProbeError> {
        let mut flagged = Vec::new();

        if let Some(value) = host.env_var(INJECTION_VARIABLE) {
            if has_foreign_injection(&value) {
                flagged.push(format!("{}={}", INJECTION_VARIABLE, value));
            } else if !value.is_empty() {
                log::debug!("{}: allow-listed injection: {}", self.id, value);
            }
        }

        for name in SAFE_MODE_VARIABLES {
            match host.env_var(name) {
                Some(value) if !value.is_empty() => flagged.push(format!("{}={}", name, value)),
                _ => {}
            }
        }

        if flagged.is_empty() {
            return Ok(Finding::clean("No suspicious environment variables detected"));
        }

        Ok(Finding::detected(format!(
            "Suspicious environment variables: {}",
            summarize_list(&flagged, MAX_EVIDENCE_ITEMS)
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

    fn probe_with(name: &str, value: &str) -> Finding {
        let host = SimulatedHost::new().with_env(name, value);
        EnvironmentVariablesCollector::new().probe(&host).unwrap()
    }

    #[test]
    fn test_unset_variables_are_clean() {
        let finding = EnvironmentVariablesCollector::new()
            .probe(&SimulatedHost::new())
            .unwrap();
        assert!(!finding.detected);
        assert_eq!(finding.evidence, "No suspicious environment variables detected");
    }

    #[test]
    fn test_main_thread_checker_is_allowed() {
        let finding = probe_with(
            "DYLD_INSERT_LIBRARIES",
            "/usr/lib/libMainThreadChecker.dylib",
        );
        assert!(!finding.detected);
    }

    #[test]
    fn test_debugger_library_outside_system_prefix_is_allowed() {
        let finding = probe_with(
            "DYLD_INSERT_LIBRARIES",
            "/Applications/Xcode.app/Contents/Developer/usr/lib/libViewDebuggerSupport.dylib",
        );
        assert!(!finding.detected);
    }

    #[test]
    fn test_foreign_library_detected() {
        let finding = probe_with("DYLD_INSERT_LIBRARIES", "/tmp/evil.dylib");
        assert!(finding.detected);
        assert_eq!(
            finding.evidence,
            "Suspicious environment variables: DYLD_INSERT_LIBRARIES=/tmp/evil.dylib"
        );
    }

    #[test]
    fn test_foreign_entry_hidden_behind_allowed_entry_detected() {
        let finding = probe_with(
            "DYLD_INSERT_LIBRARIES",
            "/usr/lib/libMainThreadChecker.dylib:/tmp/evil.dylib",
        );
        assert!(finding.detected);
    }

    #[test]
    fn test_parent_dir_escape_from_system_prefix_detected() {
        let finding = probe_with("DYLD_INSERT_LIBRARIES", "/usr/lib/../../tmp/evil.dylib");
        assert!(finding.detected);

        let finding = probe_with(
            "DYLD_INSERT_LIBRARIES",
            "/System/Library/../../tmp/libMainThreadChecker.dylib",
        );
        assert!(finding.detected);
    }

    #[test]
    fn test_allowed_name_must_be_a_whole_component() {
        let finding = probe_with(
            "DYLD_INSERT_LIBRARIES",
            "/tmp/evil_libMainThreadChecker.dylib.bak",
        );
        assert!(finding.detected);

        let finding = probe_with(
            "DYLD_INSERT_LIBRARIES",
            "/Applications/Xcode.app/IDEBundleInjection.framework/IDEBundleInjection",
        );
        assert!(!finding.detected);
    }

    #[test]
    fn test_empty_injection_value_is_clean() {
        assert!(!probe_with("DYLD_INSERT_LIBRARIES", "").detected);
    }

    #[test]
    fn test_safe_mode_flags() {
        let finding = probe_with("_MSSafeMode", "1");
        assert!(finding.detected);
        assert_eq!(
            finding.evidence,
            "Suspicious environment variables: _MSSafeMode=1"
        );

        assert!(probe_with("_SafeMode", "0").detected);
        assert!(!probe_with("_SafeMode", "").detected);
    }
}
