//! Core scanning logic
//!
//! Runs the integrity scan, prints and writes results, and records the
//! summary for `status`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use detection_kit::registry::RegistryError;
use detection_kit::store::{JsonFileStore, ScanSummary, StoreError, SummaryStore};
use detection_kit::{DetectionReport, ScanEngine};

use crate::config::{ScanConfig, EXIT_COMPROMISED, EXIT_ERROR, EXIT_SECURE};
use crate::output;

/// Run a scan of this device with the given configuration
pub fn run_scan(config: &ScanConfig) -> Result<i32, ScanError> {
    let engine = ScanEngine::with_system_host()
        .map_err(|e| {
            log::error!("Failed to build scan engine: {}", e);
            ScanError::Registry(e)
        })?
        .with_mode(config.execution);

    let store = JsonFileStore::new(&config.store_path);
    run_scan_with(config, &engine, &store)
}

/// Run a scan with an explicit engine and summary store
pub fn run_scan_with(
    config: &ScanConfig,
    engine: &ScanEngine,
    store: &dyn SummaryStore,
) -> Result<i32, ScanError> {
    let start = Instant::now();

    if !config.quiet {
        println!();
        println!("Device Integrity Agent v{}", env!("CARGO_PKG_VERSION"));
        println!("Running integrity checks...");
    }

    let report = engine.perform_scan();
    let duration = start.elapsed();

    if !config.quiet {
        output::print_report(&report);
    }

    // The verdict is already decided; persistence failures are reported
    // without discarding it.
    let mut persisted = true;

    if let Err(e) = store
        .save(&ScanSummary::from_report(&report))
        .map_err(ScanError::Store)
    {
        log::error!("{}", e);
        persisted = false;
    }

    let written = match &config.output_file {
        Some(path) => match save_output(&report, config, path) {
            Ok(written) => Some(written),
            Err(e) => {
                log::error!("{}", e);
                persisted = false;
                None
            }
        },
        None => None,
    };

    if !config.quiet {
        print_execution_info(duration, config, written.as_deref());
    }

    log::info!(
        "Scan completed: {} of {} techniques detected compromise",
        report.threats_detected(),
        report.total_checks()
    );

    Ok(exit_code(&report, persisted))
}

/// Exit code for a completed scan
///
/// A compromised verdict always wins; a secure scan whose results could not
/// be recorded is an error.
pub fn exit_code(report: &DetectionReport, persisted: bool) -> i32 {
    if report.is_jailbroken() {
        EXIT_COMPROMISED
    } else if persisted {
        EXIT_SECURE
    } else {
        EXIT_ERROR
    }
}

/// A directory target receives the format's default filename
fn resolve_output_path(config: &ScanConfig, path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(config.output_format.default_filename())
    } else {
        path.to_path_buf()
    }
}

/// Save output to file
fn save_output(
    report: &DetectionReport,
    config: &ScanConfig,
    path: &Path,
) -> Result<PathBuf, ScanError> {
    let output_path = resolve_output_path(config, path);
    let json = output::build_output(report, config.output_format).map_err(ScanError::Output)?;

    std::fs::write(&output_path, &json)
        .map_err(|e| ScanError::WriteFile(output_path.display().to_string(), e))?;

    log::debug!("Wrote {} output to {}", config.output_format, output_path.display());
    Ok(output_path)
}

/// Print execution information
fn print_execution_info(
    duration: std::time::Duration,
    config: &ScanConfig,
    output_path: Option<&Path>,
) {
    println!("────────────────────────────────────────────────────────────────────────────────");
    println!("  Duration:     {:.2}s", duration.as_secs_f64());
    println!("  Execution:    {:?}", config.execution);
    if let Some(output_path) = output_path {
        println!(
            "  Output:       {} ({})",
            output_path.display(),
            config.output_format
        );
    }
    println!("  Summary:      {}", config.store_path.display());
    println!("────────────────────────────────────────────────────────────────────────────────");
    println!();
}

/// Errors that can occur during scanning
#[derive(Debug)]
pub enum ScanError {
    /// Collector wiring is incomplete
    Registry(RegistryError),
    /// Failed to generate output
    Output(output::OutputError),
    /// Failed to write output file
    WriteFile(String, std::io::Error),
    /// Failed to record the scan summary
    Store(StoreError),
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::Registry(e) => write!(f, "Registry creation failed: {}", e),
            ScanError::Output(e) => write!(f, "Output generation failed: {}", e),
            ScanError::WriteFile(path, e) => write!(f, "Failed to write {}: {}", path, e),
            ScanError::Store(e) => write!(f, "Failed to record scan summary: {}", e),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Registry(e) => Some(e),
            ScanError::Output(e) => Some(e),
            ScanError::WriteFile(_, e) => Some(e),
            ScanError::Store(e) => Some(e),
        }
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
    use crate::config::OutputFormat;
    use detection_kit::host::SimulatedHost;
    use detection_kit::registry::create_default_registry;
    use detection_kit::store::MemoryStore;
    use detection_kit::ExecutionMode;
    use std::sync::Arc;

    fn engine(host: SimulatedHost) -> ScanEngine {
        ScanEngine::new(create_default_registry().unwrap(), Arc::new(host))
            .unwrap()
            .with_mode(ExecutionMode::Sequential)
    }

    fn quiet_config() -> ScanConfig {
        ScanConfig {
            quiet: true,
            ..ScanConfig::default()
        }
    }

    #[test]
    fn test_clean_scan_exits_secure_and_records_summary() {
        let store = MemoryStore::new();
        let code = run_scan_with(&quiet_config(), &engine(SimulatedHost::new()), &store).unwrap();

        assert_eq!(code, EXIT_SECURE);
        let summary = store.load().unwrap().unwrap();
        assert!(!summary.is_jailbroken);
        assert_eq!(summary.threats_detected, 0);
    }

    #[test]
    fn test_compromised_scan_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let output_file = dir.path().join("report.json");
        let config = ScanConfig {
            output_file: Some(output_file.clone()),
            output_format: OutputFormat::Full,
            store_path: dir.path().join("summary.json"),
            ..quiet_config()
        };
        let store = JsonFileStore::new(&config.store_path);
        let host = SimulatedHost::new().with_file("/usr/sbin/frida-server");

        let code = run_scan_with(&config, &engine(host), &store).unwrap();
        assert_eq!(code, EXIT_COMPROMISED);

        let report = DetectionReport::from_json(&std::fs::read_to_string(&output_file).unwrap())
            .unwrap();
        assert_eq!(report.threats_detected(), 1);
        assert_eq!(store.load().unwrap().unwrap().threats_detected, 1);
    }

    #[test]
    fn test_directory_output_uses_default_filename() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfig {
            output_file: Some(dir.path().to_path_buf()),
            output_format: OutputFormat::Attestation,
            ..quiet_config()
        };

        run_scan_with(&config, &engine(SimulatedHost::new()), &MemoryStore::new()).unwrap();
        assert!(dir.path().join("attestation.json").exists());
    }

    /// Store whose writes always fail
    struct ReadOnlyStore;

    impl SummaryStore for ReadOnlyStore {
        fn save(&self, _summary: &ScanSummary) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: PathBuf::from("summary.json"),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        }

        fn load(&self) -> Result<Option<ScanSummary>, StoreError> {
            Ok(None)
        }
    }

    fn unwritable_output(dir: &Path) -> ScanConfig {
        ScanConfig {
            output_file: Some(dir.join("missing").join("report.json")),
            ..quiet_config()
        }
    }

    #[test]
    fn test_unwritable_output_on_secure_scan_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();

        let config = unwritable_output(dir.path());
        let code = run_scan_with(&config, &engine(SimulatedHost::new()), &store).unwrap();
        assert_eq!(code, EXIT_ERROR);
        // Summary is recorded before the output file is attempted
        assert!(store.load().unwrap().is_some());
    }

    #[test]
    fn test_unwritable_output_keeps_compromised_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        let host = SimulatedHost::new().with_file("/usr/sbin/frida-server");

        let code = run_scan_with(&unwritable_output(dir.path()), &engine(host), &store).unwrap();
        assert_eq!(code, EXIT_COMPROMISED);
        assert!(store.load().unwrap().unwrap().is_jailbroken);
    }

    #[test]
    fn test_store_failure_keeps_compromised_verdict_and_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let output_file = dir.path().join("report.json");
        let config = ScanConfig {
            output_file: Some(output_file.clone()),
            ..quiet_config()
        };
        let host = SimulatedHost::new().with_file("/usr/sbin/frida-server");

        let code = run_scan_with(&config, &engine(host), &ReadOnlyStore).unwrap();
        assert_eq!(code, EXIT_COMPROMISED);
        assert!(output_file.exists());

        let code = run_scan_with(&quiet_config(), &engine(SimulatedHost::new()), &ReadOnlyStore)
            .unwrap();
        assert_eq!(code, EXIT_ERROR);
    }
}
