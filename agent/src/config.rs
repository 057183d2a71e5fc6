//! Configuration types for the integrity agent
//!
//! Settings come from three layers: built-in defaults, an optional TOML file
//! and command-line flags. Later layers override earlier ones.
//!
//! ```toml
//! store_path = "/var/lib/integrity/summary.json"
//! execution = "parallel"
//! workers = 4
//! format = "attestation"
//! quiet = false
//! ```

use std::path::{Path, PathBuf};

use detection_kit::logging::DEFAULT_FILTER;
use detection_kit::ExecutionMode;
use serde::Deserialize;

/// Summary file used when none is configured
pub const DEFAULT_STORE_PATH: &str = "integrity_summary.json";

/// Device shows no evidence of compromise
pub const EXIT_SECURE: i32 = 0;
/// At least one technique detected compromise
pub const EXIT_COMPROMISED: i32 = 1;
/// The agent could not complete
pub const EXIT_ERROR: i32 = 2;

/// Output format for scan results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Complete report with evidence
    #[default]
    Full,
    /// Verdict projection only
    Summary,
    /// Verdicts without evidence text, plus an evidence hash
    Attestation,
}

impl OutputFormat {
    /// Get the default output filename for this format
    pub fn default_filename(&self) -> &'static str {
        match self {
            OutputFormat::Summary => "summary.json",
            OutputFormat::Full => "report.json",
            OutputFormat::Attestation => "attestation.json",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Summary => write!(f, "summary"),
            OutputFormat::Full => write!(f, "full"),
            OutputFormat::Attestation => write!(f, "attestation"),
        }
    }
}

/// Collector scheduling as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionSetting {
    Parallel,
    Sequential,
}

/// Contents of the optional TOML config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub store_path: Option<PathBuf>,
    pub execution: Option<ExecutionSetting>,
    pub workers: Option<usize>,
    pub format: Option<OutputFormat>,
    pub quiet: Option<bool>,
}

impl FileConfig {
    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::parse(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Configuration for a scan run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Output file path (None means console-only output)
    pub output_file: Option<PathBuf>,

    /// Output format
    pub output_format: OutputFormat,

    /// Suppress console output
    pub quiet: bool,

    /// Collector scheduling
    pub execution: ExecutionMode,

    /// Where the scan summary is persisted
    pub store_path: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            output_file: None,
            output_format: OutputFormat::default(),
            quiet: false,
            execution: ExecutionMode::default(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

impl ScanConfig {
    /// Apply the config file layer on top of the defaults
    pub fn from_file_config(file: &FileConfig) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = &file.store_path {
            config.store_path = path.clone();
        }
        if let Some(format) = file.format {
            config.output_format = format;
        }
        if let Some(quiet) = file.quiet {
            config.quiet = quiet;
        }
        config.execution = resolve_execution(file.execution, file.workers)?;

        Ok(config)
    }

    /// Default log filter; a quiet run only reports errors
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            DEFAULT_FILTER
        }
    }
}

/// Combine an execution setting and worker count into an execution mode
pub fn resolve_execution(
    setting: Option<ExecutionSetting>,
    workers: Option<usize>,
) -> Result<ExecutionMode, ConfigError> {
    match (setting, workers) {
        (_, Some(0)) => Err(ConfigError::Invalid(
            "workers must be at least 1".to_string(),
        )),
        (Some(ExecutionSetting::Sequential), Some(_)) => Err(ConfigError::Invalid(
            "workers cannot be combined with sequential execution".to_string(),
        )),
        (Some(ExecutionSetting::Sequential), None) => Ok(ExecutionMode::Sequential),
        (_, Some(workers)) => Ok(ExecutionMode::Parallel { workers }),
        (_, None) => Ok(ExecutionMode::parallel()),
    }
}

/// Errors that can occur while loading configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file
    Read(PathBuf, std::io::Error),
    /// Failed to parse the config file
    Parse(PathBuf, toml::de::Error),
    /// Settings are contradictory or out of range
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read(path, e) => write!(f, "Failed to read {}: {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Invalid config file {}: {}", path.display(), e)
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read(_, e) => Some(e),
            ConfigError::Parse(_, e) => Some(e),
            ConfigError::Invalid(_) => None,
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

    #[test]
    fn test_parse_full_config_file() {
        let file = FileConfig::parse(
            r#"
            store_path = "/var/lib/integrity/summary.json"
            execution = "parallel"
            workers = 4
            format = "attestation"
            quiet = true
            "#,
        )
        .unwrap();

        let config = ScanConfig::from_file_config(&file).unwrap();
        assert_eq!(
            config.store_path,
            PathBuf::from("/var/lib/integrity/summary.json")
        );
        assert_eq!(config.execution, ExecutionMode::Parallel { workers: 4 });
        assert_eq!(config.output_format, OutputFormat::Attestation);
        assert!(config.quiet);
    }

    #[test]
    fn test_quiet_from_config_file_lowers_log_filter() {
        let config =
            ScanConfig::from_file_config(&FileConfig::parse("quiet = true").unwrap()).unwrap();
        assert_eq!(config.log_filter(), "error");
        assert_eq!(ScanConfig::default().log_filter(), DEFAULT_FILTER);
    }

    #[test]
    fn test_empty_config_file_uses_defaults() {
        let config = ScanConfig::from_file_config(&FileConfig::parse("").unwrap()).unwrap();
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(FileConfig::parse("colour = true").is_err());
    }

    #[test]
    fn test_execution_resolution() {
        assert_eq!(
            resolve_execution(Some(ExecutionSetting::Sequential), None).unwrap(),
            ExecutionMode::Sequential
        );
        assert_eq!(
            resolve_execution(None, Some(2)).unwrap(),
            ExecutionMode::Parallel { workers: 2 }
        );
        assert!(resolve_execution(None, Some(0)).is_err());
        assert!(resolve_execution(Some(ExecutionSetting::Sequential), Some(2)).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_, _)));
    }
}
