//! File System Collector
//!
//! Tests for the presence of jailbreak artifacts: tool bundles, substrate
//! libraries, package-manager state, injection binaries and bootstrap markers.

use super::{Finding, TechniqueCollector};
use crate::catalog::TechniqueId;
use crate::host::{HostEnvironment, ProbeError};

/// Paths that must not exist on a stock device
pub const SUSPICIOUS_PATHS: &[&str] = &[
    "/Applications/Cydia.app",
    "/Applications/blackra1n.app",
    "/Applications/FakeCarrier.app",
    "/Applications/Icy.app",
    "/Applications/IntelliScreen.app",
    "/Applications/MxTube.app",
    "/Applications/RockApp.app",
    "/Applications/SBSettings.app",
    "/Applications/WinterBoard.app",
    "/Applications/Sileo.app",
    "/Applications/Zebra.app",
    "/Library/MobileSubstrate/MobileSubstrate.dylib",
    "/Library/MobileSubstrate/DynamicLibraries/",
    "/bin/bash",
    "/bin/sh",
    "/usr/sbin/sshd",
    "/usr/libexec/ssh-keysign",
    "/usr/sbin/frida-server",
    "/usr/bin/cycript",
    "/usr/local/bin/cycript",
    "/usr/lib/libcycript.dylib",
    "/etc/apt",
    "/etc/ssh/sshd_config",
    "/private/var/lib/apt/",
    "/private/var/lib/cydia",
    "/private/var/mobile/Library/SBSettings/Themes",
    "/private/var/stash",
    "/private/var/tmp/cydia.log",
    "/System/Library/LaunchDaemons/com.ikey.bbot.plist",
    "/System/Library/LaunchDaemons/com.saurik.Cydia.Startup.plist",
    "/var/cache/apt",
    "/var/lib/cydia",
    "/var/log/syslog",
    "/.bootstrapped_electra",
    "/.installed_unc0ver",
    "/jb/lzma",
    "/jb/offsets.plist",
    "/.cydia_no_stash",
];

/// Matched paths shown in evidence; the total is always reported
const SHOWN_MATCHES: usize = 3;

/// Collector for jailbreak file-system artifacts
pub struct FileSystemCollector {
    id: String,
}

impl FileSystemCollector {
    pub fn new() -> Self {
        Self {
            id: "file_system_collector".to_string(),
        }
    }
}

impl Default for FileSystemCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl TechniqueCollector for FileSystemCollector {
    fn technique(&self) -> TechniqueId {
        TechniqueId::FileSystem
    }

    fn collector_id(&self) -> &str {
        &self.id
    }

    fn probe(&self, host: &dyn HostEnvironment) -> Result<Finding, ProbeError> {
        let found: Vec<&str> = SUSPICIOUS_PATHS
            .iter()
            .copied()
            .filter(|path| host.path_exists(path))
            .collect();

        if found.is_empty() {
            return Ok(Finding::clean("No suspicious files found"));
        }

        let shown: Vec<&str> = found.iter().take(SHOWN_MATCHES).copied().collect();
        Ok(Finding::detected(format!(
            "Found {} suspicious files: {}",
            found.len(),
            shown.join(", ")
        )))
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
