//! # Technique Catalog
//!
//! Static registry of the detection techniques. The catalog is closed: exactly
//! eight techniques, declared in canonical order. That order is used everywhere
//! results are listed, assembled into reports or exported.
//!
//! Compliance references map each technique to OWASP MSTG (resilience
//! guideline) and MITRE ATT&CK Mobile (attack framework) identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of techniques in the catalog
pub const TECHNIQUE_COUNT: usize = 8;

/// Stable identifier of a detection technique
///
/// `Ord` follows declaration order, which is the canonical catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TechniqueId {
    FileSystem,
    UrlSchemes,
    SandboxIntegrity,
    DynamicLibraries,
    ForkRestriction,
    SymbolicLinks,
    SystemCalls,
    EnvironmentVariables,
}

impl TechniqueId {
    /// All techniques in catalog order
    pub const ALL: [TechniqueId; TECHNIQUE_COUNT] = [
        TechniqueId::FileSystem,
        TechniqueId::UrlSchemes,
        TechniqueId::SandboxIntegrity,
        TechniqueId::DynamicLibraries,
        TechniqueId::ForkRestriction,
        TechniqueId::SymbolicLinks,
        TechniqueId::SystemCalls,
        TechniqueId::EnvironmentVariables,
    ];

    /// Position of this technique in catalog order (0-based)
    pub fn position(self) -> usize {
        match self {
            TechniqueId::FileSystem => 0,
            TechniqueId::UrlSchemes => 1,
            TechniqueId::SandboxIntegrity => 2,
            TechniqueId::DynamicLibraries => 3,
            TechniqueId::ForkRestriction => 4,
            TechniqueId::SymbolicLinks => 5,
            TechniqueId::SystemCalls => 6,
            TechniqueId::EnvironmentVariables => 7,
        }
    }

    /// Human-readable display name (also the exported `technique` value)
    pub fn display_name(self) -> &'static str {
        describe(self).name
    }
}

impl fmt::Display for TechniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for TechniqueId {
    type Err = UnknownTechnique;

    /// Parse a technique from its display name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TechniqueId::ALL
            .into_iter()
            .find(|id| id.display_name() == s)
            .ok_or_else(|| UnknownTechnique(s.to_string()))
    }
}

impl Serialize for TechniqueId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

impl<'de> Deserialize<'de> for TechniqueId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// A technique display name that is not in the catalog
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown detection technique: '{0}'")]
pub struct UnknownTechnique(pub String);

/// Severity tier, fixed per technique
///
/// Severity is informational. It never weights the aggregate verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog entry for one detection technique
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Technique {
    pub id: TechniqueId,
    pub name: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    /// OWASP MSTG reference
    pub resilience_reference: &'static str,
    /// MITRE ATT&CK Mobile reference
    pub attack_reference: &'static str,
}

// ============================================================================
// Catalog Entries
// ============================================================================

static FILE_SYSTEM: Technique = Technique {
    id: TechniqueId::FileSystem,
    name: "File System Check",
    description: "Checks for suspicious files and directories commonly found on jailbroken devices",
    severity: Severity::High,
    resilience_reference: "MSTG-RESILIENCE-1",
    attack_reference: "T1426",
};

static URL_SCHEMES: Technique = Technique {
    id: TechniqueId::UrlSchemes,
    name: "URL Schemes",
    description: "Attempts to open URL schemes of jailbreak tools (Cydia, Sileo, etc.)",
    severity: Severity::High,
    resilience_reference: "MSTG-RESILIENCE-1",
    attack_reference: "T1426, T1575",
};

static SANDBOX_INTEGRITY: Technique = Technique {
    id: TechniqueId::SandboxIntegrity,
    name: "Sandbox Integrity",
    description: "Verifies sandbox integrity by attempting unauthorized file operations",
    severity: Severity::Critical,
    resilience_reference: "MSTG-RESILIENCE-1, MSTG-STORAGE-2",
    attack_reference: "T1575",
};

static DYNAMIC_LIBRARIES: Technique = Technique {
    id: TechniqueId::DynamicLibraries,
    name: "Dynamic Libraries",
    description: "Detects suspicious dynamic libraries loaded at runtime",
    severity: Severity::Critical,
    resilience_reference: "MSTG-RESILIENCE-1, MSTG-RESILIENCE-2",
    attack_reference: "T1407",
};

static FORK_RESTRICTION: Technique = Technique {
    id: TechniqueId::ForkRestriction,
    name: "Fork Restriction",
    description: "Tests process spawning restrictions (unavailable on stock platforms)",
    severity: Severity::Critical,
    resilience_reference: "MSTG-RESILIENCE-1, MSTG-RESILIENCE-2",
    attack_reference: "T1575",
};

static SYMBOLIC_LINKS: Technique = Technique {
    id: TechniqueId::SymbolicLinks,
    name: "Symbolic Links",
    description: "Checks for abnormal symbolic links in system directories",
    severity: Severity::Medium,
    resilience_reference: "MSTG-RESILIENCE-1",
    attack_reference: "T1426",
};

static SYSTEM_CALLS: Technique = Technique {
    id: TechniqueId::SystemCalls,
    name: "System Calls",
    description: "Verifies system call behavior on restricted paths",
    severity: Severity::Medium,
    resilience_reference: "MSTG-RESILIENCE-1, MSTG-STORAGE-2",
    attack_reference: "T1426",
};

static ENVIRONMENT_VARIABLES: Technique = Technique {
    id: TechniqueId::EnvironmentVariables,
    name: "Environment Variables",
    description: "Detects suspicious environment variables used for code injection",
    severity: Severity::High,
    resilience_reference: "MSTG-RESILIENCE-1",
    attack_reference: "T1426",
};

/// Look up the catalog entry for a technique
pub fn describe(id: TechniqueId) -> &'static Technique {
    match id {
        TechniqueId::FileSystem => &FILE_SYSTEM,
        TechniqueId::UrlSchemes => &URL_SCHEMES,
        TechniqueId::SandboxIntegrity => &SANDBOX_INTEGRITY,
        TechniqueId::DynamicLibraries => &DYNAMIC_LIBRARIES,
        TechniqueId::ForkRestriction => &FORK_RESTRICTION,
        TechniqueId::SymbolicLinks => &SYMBOLIC_LINKS,
        TechniqueId::SystemCalls => &SYSTEM_CALLS,
        TechniqueId::EnvironmentVariables => &ENVIRONMENT_VARIABLES,
    }
}

/// Iterate the full catalog in canonical order
pub fn techniques() -> impl Iterator<Item = &'static Technique> {
    TechniqueId::ALL.into_iter().map(describe)
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
