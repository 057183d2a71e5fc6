//! # Scan Orchestrator
//!
//! High-level API for running a device integrity scan.
//!
//! A [`ScanEngine`] owns a validated collector plan and a host environment.
//! `perform_scan()` runs every collector exactly once, waits for all of them
//! and returns the [`DetectionReport`]. Probe faults never surface here; they
//! are already folded into negative verdicts by the collectors.
//!
//! ## Example
//!
//! ```
//! use detection_kit::execution_api::{format_summary, ScanEngine};
//! use detection_kit::host::SimulatedHost;
//! use detection_kit::registry::create_default_registry;
//! use std::sync::Arc;
//!
//! let host = Arc::new(SimulatedHost::new().with_directory("/Applications/Cydia.app"));
//! let engine = ScanEngine::new(create_default_registry()?, host)?;
//!
//! let report = engine.perform_scan();
//! assert!(report.is_jailbroken());
//! println!("{}", format_summary(&report));
//! # Ok::<(), detection_kit::registry::RegistryError>(())
//! ```

use std::sync::Arc;

use crate::catalog::TECHNIQUE_COUNT;
use crate::collectors::TechniqueCollector;
use crate::host::{HostEnvironment, SystemHost};
use crate::registry::{create_default_registry, CollectorRegistry, RegistryError};
use crate::report::{DetectionReport, DetectionResult};

// ============================================================================
// Execution Mode
// ============================================================================

/// How collectors are scheduled within one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Run collectors one after another on the calling thread
    Sequential,
    /// Run collectors on a scoped worker pool
    Parallel { workers: usize },
}

impl ExecutionMode {
    /// Parallel mode with one worker per CPU, capped at the technique count
    pub fn parallel() -> Self {
        ExecutionMode::Parallel {
            workers: num_cpus::get().clamp(1, TECHNIQUE_COUNT),
        }
    }
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::parallel()
    }
}

// ============================================================================
// Scan Engine
// ============================================================================

/// Runs the collector plan against a host environment
pub struct ScanEngine {
    plan: Vec<Box<dyn TechniqueCollector>>,
    host: Arc<dyn HostEnvironment>,
    mode: ExecutionMode,
}

impl ScanEngine {
    /// Build an engine from a registry
    ///
    /// Fails if the registry does not cover every technique.
    pub fn new(
        registry: CollectorRegistry,
        host: Arc<dyn HostEnvironment>,
    ) -> Result<Self, RegistryError> {
        let plan = registry.into_plan()?;
        Ok(Self {
            plan,
            host,
            mode: ExecutionMode::default(),
        })
    }

    /// Default collectors against the running system
    pub fn with_system_host() -> Result<Self, RegistryError> {
        Self::new(create_default_registry()?, Arc::new(SystemHost::new()))
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn host(&self) -> &dyn HostEnvironment {
        self.host.as_ref()
    }

    /// Run all collectors and build the report
    ///
    /// # Panics
    ///
    /// Panics if a collector returns a result for a technique other than its
    /// own, or if a worker thread panics. Both are wiring defects.
    pub fn perform_scan(&self) -> DetectionReport {
        log::info!(
            "Starting integrity scan ({} techniques, {:?})",
            self.plan.len(),
            self.mode
        );

        let results = match self.mode {
            ExecutionMode::Sequential => self.run_sequential(),
            ExecutionMode::Parallel { workers } => self.run_parallel(workers),
        };

        let report = DetectionReport::assemble(
            results,
            self.host.device_model(),
            self.host.platform_version(),
        );

        if report.is_jailbroken() {
            log::warn!(
                "Integrity scan complete: {} of {} techniques detected compromise",
                report.threats_detected(),
                report.total_checks()
            );
        } else {
            log::info!(
                "Integrity scan complete: device secure ({} checks)",
                report.total_checks()
            );
        }
        report
    }

    fn run_one(&self, collector: &dyn TechniqueCollector) -> DetectionResult {
        let result = collector.collect(self.host.as_ref());
        assert_eq!(
            result.technique(),
            collector.technique(),
            "collector '{}' reported the wrong technique",
            collector.collector_id()
        );
        result
    }

    fn run_sequential(&self) -> Vec<DetectionResult> {
        self.plan.iter().map(|c| self.run_one(c.as_ref())).collect()
    }

    fn run_parallel(&self, workers: usize) -> Vec<DetectionResult> {
        let workers = workers.clamp(1, self.plan.len().max(1));
        let chunk_size = self.plan.len().div_ceil(workers).max(1);
        log::debug!("Running collectors on {} workers", workers);

        let mut slots: Vec<Option<DetectionResult>> = vec![None; self.plan.len()];

        std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .plan
                .chunks(chunk_size)
                .enumerate()
                .map(|(chunk_index, chunk)| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .enumerate()
                            .map(|(offset, collector)| {
                                (chunk_index * chunk_size + offset, self.run_one(collector.as_ref()))
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            // Full barrier: every worker is joined before the report is built
            for handle in handles {
                match handle.join() {
                    Ok(chunk_results) => {
                        for (position, result) in chunk_results {
                            if let Some(slot) = slots.get_mut(position) {
                                *slot = Some(result);
                            }
                        }
                    }
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
        });

        slots.into_iter().flatten().collect()
    }
}

impl std::fmt::Debug for ScanEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanEngine")
            .field("techniques", &self.plan.len())
            .field("mode", &self.mode)
            .finish()
    }
}

// ============================================================================
// Public API Functions
// ============================================================================

/// Scan the running system with the default collectors
pub fn perform_scan() -> Result<DetectionReport, RegistryError> {
    Ok(ScanEngine::with_system_host()?.perform_scan())
}

/// Format a report as a one-line summary
pub fn format_summary(report: &DetectionReport) -> String {
    let status = if report.is_jailbroken() {
        "JAILBROKEN"
    } else {
        "SECURE"
    };

    format!(
        "Status: {} | Threats: {}/{} | Device: {} ({})",
        status,
        report.threats_detected(),
        report.total_checks(),
        report.device_model(),
        report.platform_version()
    )
}

/// Format a report as a detailed multi-line listing
pub fn format_report(report: &DetectionReport) -> String {
    let mut out = String::new();

    out.push_str("=== DEVICE INTEGRITY SCAN ===\n");
    out.push_str(&format!("Timestamp: {}\n", report.timestamp().to_rfc3339()));
    out.push_str(&format!("Device: {}\n", report.device_model()));
    out.push_str(&format!("Platform: {}\n", report.platform_version()));
    out.push_str(&format!("Jailbroken: {}\n", report.is_jailbroken()));
    out.push_str(&format!(
        "Threats: {}/{}\n",
        report.threats_detected(),
        report.total_checks()
    ));
    out.push_str("=============================\n");

    for result in report.results() {
        let status = if result.detected() {
            "DETECTED"
        } else {
            "SECURE"
        };
        out.push_str(&format!("[{}] {}\n", status, result.technique()));
        out.push_str(&format!("  Evidence: {}\n", result.evidence()));
        out.push_str(&format!("  MSTG: {}\n", result.mstg_reference()));
        out.push_str(&format!("  MITRE: {}\n", result.mitre_reference()));
    }

    out
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
#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TechniqueId;
    use crate::host::simulated::SimulatedFault;
    use crate::host::SimulatedHost;

    fn engine_for(host: SimulatedHost, mode: ExecutionMode) -> ScanEngine {
        ScanEngine::new(create_default_registry().unwrap(), Arc::new(host))
            .unwrap()
            .with_mode(mode)
    }

    fn scan(host: SimulatedHost) -> DetectionReport {
        engine_for(host, ExecutionMode::Sequential).perform_scan()
    }

    fn detected_techniques(report: &DetectionReport) -> Vec<TechniqueId> {
        report
            .results()
            .iter()
            .filter(|r| r.detected())
            .map(|r| r.technique())
            .collect()
    }

    #[test]
    fn test_every_technique_reported_once_in_order() {
        for mode in [
            ExecutionMode::Sequential,
            ExecutionMode::Parallel { workers: 3 },
            ExecutionMode::Parallel { workers: 64 },
        ] {
            let report = engine_for(SimulatedHost::new(), mode).perform_scan();
            assert_eq!(report.total_checks(), 8);
            let order: Vec<TechniqueId> = report.results().iter().map(|r| r.technique()).collect();
            assert_eq!(order, TechniqueId::ALL.to_vec(), "mode {:?}", mode);
        }
    }

    #[test]
    fn test_clean_host_is_secure() {
        let report = scan(SimulatedHost::new());
        assert!(!report.is_jailbroken());
        assert_eq!(report.threats_detected(), 0);
        assert!(report.results().iter().all(|r| !r.detected()));
    }

    #[test]
    fn test_cydia_bundle_flags_only_file_system() {
        let report = scan(SimulatedHost::new().with_directory("/Applications/Cydia.app"));
        assert_eq!(detected_techniques(&report), vec![TechniqueId::FileSystem]);
        assert_eq!(report.threats_detected(), 1);
        assert!(report.is_jailbroken());
    }

    #[test]
    fn test_allow_listed_injection_is_secure() {
        let report = scan(
            SimulatedHost::new()
                .with_env("DYLD_INSERT_LIBRARIES", "/usr/lib/libMainThreadChecker.dylib"),
        );
        assert!(detected_techniques(&report).is_empty());
    }

    #[test]
    fn test_foreign_injection_is_detected() {
        let report = scan(SimulatedHost::new().with_env("DYLD_INSERT_LIBRARIES", "/tmp/evil.dylib"));
        assert_eq!(
            detected_techniques(&report),
            vec![TechniqueId::EnvironmentVariables]
        );
    }

    #[test]
    fn test_verdicts_are_idempotent_across_scans_and_modes() {
        let host = SimulatedHost::new()
            .with_directory("/Applications/Sileo.app")
            .with_url_scheme("sileo")
            .with_writable_prefix("/private/")
            .with_module("/usr/lib/frida-agent.dylib")
            .with_symlink("/usr/bin");
        let engine = engine_for(host, ExecutionMode::Parallel { workers: 4 });

        let first = engine.perform_scan();
        let second = engine.perform_scan();
        assert_eq!(first.verdict_fingerprint(), second.verdict_fingerprint());

        let sequential = engine.with_mode(ExecutionMode::Sequential).perform_scan();
        assert_eq!(first.verdict_fingerprint(), sequential.verdict_fingerprint());
        assert_eq!(first.threats_detected(), 5);
    }

    #[test]
    fn test_probe_faults_degrade_to_secure() {
        let report = scan(
            SimulatedHost::new()
                .with_url_scheme("cydia")
                .with_module("/usr/lib/substrate.dylib")
                .fail_probe(SimulatedFault::UrlRegistry)
                .fail_probe(SimulatedFault::ModuleList)
                .fail_probe(SimulatedFault::SpawnAttributes),
        );
        assert!(!report.is_jailbroken());
        assert_eq!(report.total_checks(), 8);
    }

    #[test]
    fn test_incomplete_registry_rejected_at_construction() {
        let registry = CollectorRegistry::new();
        let err = ScanEngine::new(registry, Arc::new(SimulatedHost::new())).unwrap_err();
        assert_eq!(err, RegistryError::MissingTechnique(TechniqueId::FileSystem));
    }

    #[test]
    fn test_report_carries_device_context() {
        let report = scan(SimulatedHost::new().with_device("iPhone14,2", "iOS 17.2"));
        assert_eq!(report.device_model(), "iPhone14,2");
        assert_eq!(report.platform_version(), "iOS 17.2");
        assert_eq!(
            format_summary(&report),
            "Status: SECURE | Threats: 0/8 | Device: iPhone14,2 (iOS 17.2)"
        );
    }

    #[test]
    fn test_format_report_lists_every_technique() {
        let report = scan(SimulatedHost::new().with_file("/bin/sh"));
        let text = format_report(&report);
        assert!(text.contains("Threats: 2/8"));
        assert!(text.contains("[DETECTED] Fork Restriction"));
        assert!(text.contains("[SECURE] Sandbox Integrity"));
        assert_eq!(text.matches("  MITRE: ").count(), 8);
    }

    #[test]
    fn test_default_parallel_mode_is_bounded() {
        match ExecutionMode::parallel() {
            ExecutionMode::Parallel { workers } => assert!((1..=8).contains(&workers)),
            ExecutionMode::Sequential => panic!("expected parallel mode"),
        }
    }
}
