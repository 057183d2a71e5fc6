//! # Host Environment Port
//!
//! Every collector reaches the operating environment through
//! [`HostEnvironment`]. `SystemHost` talks to the real platform, while
//! `SimulatedHost` holds an in-memory host state for tests.
//!
//! Probe methods return [`ProbeResult`]; collectors interpret any
//! [`ProbeError`] as "no evidence of compromise".

mod platform;
pub mod simulated;
pub mod system;

pub(crate) use platform::url_scheme;
pub use simulated::SimulatedHost;
pub use system::SystemHost;

/// Result type for host probes
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors raised by a single host probe
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The host refused access to a path
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The path does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// An entry (possibly a symbolic link) already occupies the path
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The platform offers no API for this probe
    #[error("Unsupported on this platform: {0}")]
    Unsupported(String),

    /// The probe input cannot be handed to the platform (e.g. interior NUL)
    #[error("Invalid probe input: {0}")]
    InvalidInput(String),

    /// Any other I/O failure
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProbeError {
    /// Classify an I/O error raised while probing `path`
    pub fn from_io(path: &str, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => ProbeError::PermissionDenied(path.to_string()),
            std::io::ErrorKind::NotFound => ProbeError::NotFound(path.to_string()),
            std::io::ErrorKind::AlreadyExists => ProbeError::AlreadyExists(path.to_string()),
            _ => ProbeError::Io {
                path: path.to_string(),
                source: error,
            },
        }
    }
}

/// Filesystem entry type as reported without following links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Other,
}

/// Access to the host signals inspected by the collectors
///
/// Implementations must be thread-safe (`Send + Sync`) so the orchestrator can
/// run collectors on a worker pool.
pub trait HostEnvironment: Send + Sync {
    /// Whether a filesystem entry exists at `path` (links are followed)
    fn path_exists(&self, path: &str) -> bool;

    /// Whether the platform reports a registered handler for `url`
    fn can_open_url(&self, url: &str) -> ProbeResult<bool>;

    /// Create a new file at `path` holding `contents`
    ///
    /// Never follows a link at `path` and never touches an existing entry:
    /// anything already at `path` yields [`ProbeError::AlreadyExists`].
    fn create_file(&self, path: &str, contents: &[u8]) -> ProbeResult<()>;

    /// Remove the file at `path`
    fn remove_file(&self, path: &str) -> ProbeResult<()>;

    /// Paths of all executable images currently loaded into this process
    fn loaded_modules(&self) -> ProbeResult<Vec<String>>;

    /// Entry type at `path`, without following a trailing symbolic link
    fn entry_kind(&self, path: &str) -> ProbeResult<EntryKind>;

    /// Low-level stat(2) probe; `Ok` means the path is visible to this process
    fn stat(&self, path: &str) -> ProbeResult<()>;

    /// Value of an environment variable, if set
    fn env_var(&self, name: &str) -> Option<String>;

    /// Whether process-spawn attribute initialization succeeds
    fn spawn_attributes_available(&self) -> ProbeResult<bool>;

    /// Hardware model identifier (e.g. `iPhone14,2`, `x86_64`)
    fn device_model(&self) -> String;

    /// Operating system version string
    fn platform_version(&self) -> String;
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
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_from_io_classification() {
        let denied = ProbeError::from_io("/private", Error::from(ErrorKind::PermissionDenied));
        assert!(matches!(denied, ProbeError::PermissionDenied(p) if p == "/private"));

        let missing = ProbeError::from_io("/jb", Error::from(ErrorKind::NotFound));
        assert!(matches!(missing, ProbeError::NotFound(_)));

        let taken = ProbeError::from_io("/private/x", Error::from(ErrorKind::AlreadyExists));
        assert!(matches!(taken, ProbeError::AlreadyExists(_)));

        let other = ProbeError::from_io("/etc", Error::from(ErrorKind::Interrupted));
        assert!(matches!(other, ProbeError::Io { .. }));
        assert!(other.to_string().starts_with("I/O error on /etc"));
    }
}
