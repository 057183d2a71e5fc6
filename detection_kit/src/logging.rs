//! Process-wide logging setup
//!
//! The kit logs through the `log` facade. Binaries call
//! [`init_global_logging`] once at startup to install an `env_logger` backend.
//! `RUST_LOG` overrides the default filter.

use env_logger::Env;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "warn";

/// Logging backend could not be installed
#[derive(Debug, thiserror::Error)]
#[error("Logger already initialized: {0}")]
pub struct LoggingError(#[from] log::SetLoggerError);

/// Install the global logger with the default filter
pub fn init_global_logging() -> Result<(), LoggingError> {
    init_with_default_filter(DEFAULT_FILTER)
}

/// Install the global logger, falling back to `filter` when `RUST_LOG` is unset
pub fn init_with_default_filter(filter: &str) -> Result<(), LoggingError> {
    env_logger::Builder::from_env(Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .try_init()?;
    log::debug!("Logging initialized (default filter '{}')", filter);
    Ok(())
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
