//! URL Scheme Collector
//!
//! Asks the platform whether a handler is registered for the URL schemes of
//! jailbreak package managers and tweak tools.

use super::{Finding, TechniqueCollector};
use crate::catalog::TechniqueId;
use crate::evidence::{summarize_list, MAX_EVIDENCE_ITEMS};
use crate::host::{url_scheme, HostEnvironment, ProbeError};

/// URLs probed for a registered handler
pub const SUSPICIOUS_URLS: &[&str] = &[
    "cydia://package/com.example.package",
    "sileo://package/com.example.package",
    "zbra://package/com.example.package",
    "filza://",
    "activator://",
];

/// Collector for jailbreak URL scheme handlers
pub struct UrlSchemesCollector {
    id: String,
}

impl UrlSchemesCollector {
    pub fn new() -> Self {
        Self {
            id: "url_schemes_collector".to_string(),
        }
    }
}

impl Default for UrlSchemesCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl TechniqueCollector for UrlSchemesCollector {
    fn technique(&self) -> TechniqueId {
        TechniqueId::UrlSchemes
    }

    fn collector_id(&self) -> &str {
        &self.id
    }

    fn probe(&self, host: &dyn HostEnvironment) -> Result<Finding, ProbeError> {
        let mut handled = Vec::new();

        for url in SUSPICIOUS_URLS.iter().copied() {
            if host.can_open_url(url)? {
                handled.push(url_scheme(url).unwrap_or(url));
            }
        }

        if handled.is_empty() {
            return Ok(Finding::clean("No jailbreak URL schemes detected"));
        }

        Ok(Finding::detected(format!(
            "Detected URL schemes: {}",
            summarize_list(&handled, MAX_EVIDENCE_ITEMS)
        )))
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
