//! Dynamic Libraries Collector
//!
//! Enumerates the images loaded into this process and flags substrate,
//! instrumentation and TLS-pinning-bypass libraries.

use super::{Finding, TechniqueCollector};
use crate::catalog::TechniqueId;
use crate::evidence::{summarize_list, MAX_EVIDENCE_ITEMS};
use crate::host::{HostEnvironment, ProbeError};

/// Case-insensitive substrings of injected tooling
pub const SUSPICIOUS_MODULE_NAMES: &[&str] = &[
    "MobileSubstrate",
    "substrate",
    "cycript",
    "frida",
    "SSLKillSwitch",
];

/// Collector for injected dynamic libraries
pub struct DynamicLibrariesCollector {
    id: String,
}

impl DynamicLibrariesCollector {
    pub fn new() -> Self {
        Self {
            id: "dynamic_libraries_collector".to_string(),
        }
    }
}

impl Default for DynamicLibrariesCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn is_suspicious(module: &str) -> bool {
    let lowered = module.to_lowercase();
    SUSPICIOUS_MODULE_NAMES
        .iter()
        .any(|name| lowered.contains(&name.to_lowercase()))
}

impl TechniqueCollector for DynamicLibrariesCollector {
    fn technique(&self) -> TechniqueId {
        TechniqueId::DynamicLibraries
    }

    fn collector_id(&self) -> &str {
        &self.id
    }

    fn probe(&self, host: &dyn HostEnvironment) -> Result<Finding, ProbeError> {
        let modules = host.loaded_modules()?;
        log::trace!("{}: {} loaded modules", self.id, modules.len());

        let suspicious: Vec<&str> = modules
            .iter()
            .map(String::as_str)
            .filter(|m| is_suspicious(m))
            .collect();

        if suspicious.is_empty() {
            return Ok(Finding::clean("No suspicious dynamic libraries detected"));
        }

        Ok(Finding::detected(format!(
            "Suspicious libraries loaded: {}",
            summarize_list(&suspicious, MAX_EVIDENCE_ITEMS)
        )))
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
