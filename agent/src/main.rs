//! # Device Integrity Agent
//!
//! Scans the running device for signs of compromise (jailbreak) and records
//! the verdict for later status checks.
//!
//! ## Usage
//!
//! ```bash
//! # Scan with console output
//! integrity_agent
//!
//! # Specify output format
//! integrity_agent --format attestation -o attestation.json
//!
//! # Check the last recorded scan
//! integrity_agent status --max-age-minutes 30
//! ```
//!
//! ## Output Formats
//!
//! - **full** (default): Complete report with evidence
//! - **summary**: Verdict and threat count only
//! - **attestation**: Verdicts without evidence text, plus an evidence hash

mod cli;
mod config;
mod output;
mod scanner;
mod status;

use clap::Parser;
use detection_kit::logging;
use detection_kit::store::JsonFileStore;

use cli::{Cli, Command, StatusArgs};
use config::{ConfigError, ScanConfig, EXIT_ERROR};

/// A command with its configuration resolved
enum Invocation {
    Scan(ScanConfig),
    Status(StatusArgs),
}

fn main() {
    let invocation = match prepare(Cli::parse().into_command()) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_ERROR);
        }
    };

    // Initialize logging
    let default_filter = match &invocation {
        Invocation::Scan(config) => config.log_filter(),
        Invocation::Status(_) => logging::DEFAULT_FILTER,
    };
    if let Err(e) = logging::init_with_default_filter(default_filter) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(EXIT_ERROR);
    }

    let exit_code = match run(invocation) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}

/// Resolve configuration layers before anything is logged
fn prepare(command: Command) -> Result<Invocation, ConfigError> {
    match command {
        Command::Scan(args) => Ok(Invocation::Scan(cli::build_scan_config(&args)?)),
        Command::Status(args) => Ok(Invocation::Status(args)),
    }
}

/// Dispatch the prepared command
fn run(invocation: Invocation) -> Result<i32, Box<dyn std::error::Error>> {
    match invocation {
        Invocation::Scan(config) => {
            log::debug!("Scan configuration: {:?}", config);
            Ok(scanner::run_scan(&config)?)
        }
        Invocation::Status(args) => run_status(&args),
    }
}

fn run_status(args: &StatusArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let store = JsonFileStore::new(cli::resolve_store_path(args)?);
    let max_age = chrono::Duration::try_minutes(args.max_age_minutes)
        .filter(|age| *age >= chrono::Duration::zero())
        .ok_or_else(|| {
            ConfigError::Invalid(format!(
                "max-age-minutes out of range: {}",
                args.max_age_minutes
            ))
        })?;
    let outcome = status::check_status(&store, max_age, chrono::Utc::now(), false)?;
    Ok(outcome.exit_code())
}
