//! Command-line interface parsing
//!
//! Handles argument parsing and merges flags over the config file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{
    resolve_execution, ConfigError, ExecutionSetting, FileConfig, OutputFormat, ScanConfig,
    DEFAULT_STORE_PATH,
};

const AFTER_HELP: &str = "\
EXIT CODES:
    0    Device secure
    1    Compromise detected
    2    Execution error

EXAMPLES:
    integrity_agent                                   # Console output only
    integrity_agent --output report.json              # Console + file
    integrity_agent -f attestation -o out.json -q     # Attestation to file
    integrity_agent status --max-age-minutes 30       # Check the last scan";

/// Device integrity (jailbreak) scanning agent
#[derive(Debug, Parser)]
#[command(
    name = "integrity_agent",
    version,
    about,
    after_help = AFTER_HELP,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub scan: ScanArgs,
}

impl Cli {
    /// The command to run; a bare invocation scans
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Scan(self.scan))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan this device (default)
    Scan(ScanArgs),
    /// Show the last recorded scan summary
    Status(StatusArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct ScanArgs {
    /// Output format for --output
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write results to this JSON file (or directory)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Suppress console output
    #[arg(short, long)]
    pub quiet: bool,

    /// Run collectors one at a time
    #[arg(long, conflicts_with = "workers")]
    pub sequential: bool,

    /// Number of collector worker threads
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Summary file updated after the scan
    #[arg(long, value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct StatusArgs {
    /// Treat a summary older than this as stale
    #[arg(long, default_value_t = 60, value_name = "MINUTES")]
    pub max_age_minutes: i64,

    /// Summary file to read
    #[arg(long, value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

fn load_file_config(path: Option<&PathBuf>) -> Result<FileConfig, ConfigError> {
    match path {
        Some(path) => FileConfig::load(path),
        None => Ok(FileConfig::default()),
    }
}

/// Build the scan configuration: defaults, then config file, then flags
pub fn build_scan_config(args: &ScanArgs) -> Result<ScanConfig, ConfigError> {
    let file = load_file_config(args.config.as_ref())?;
    let mut config = ScanConfig::from_file_config(&file)?;

    if let Some(format) = args.format {
        config.output_format = format;
    }
    if args.quiet {
        config.quiet = true;
    }
    if let Some(store) = &args.store {
        config.store_path = store.clone();
    }
    if args.sequential || args.workers.is_some() {
        let setting = args.sequential.then_some(ExecutionSetting::Sequential);
        config.execution = resolve_execution(setting, args.workers)?;
    }
    config.output_file = args.output.clone();

    Ok(config)
}

/// Resolve the summary file for `status`
pub fn resolve_store_path(args: &StatusArgs) -> Result<PathBuf, ConfigError> {
    if let Some(store) = &args.store {
        return Ok(store.clone());
    }
    let file = load_file_config(args.config.as_ref())?;
    Ok(file
        .store_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH)))
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
