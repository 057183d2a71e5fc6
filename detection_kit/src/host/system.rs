//! # System Host
//!
//! `HostEnvironment` backed by the real operating system.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use super::{platform, EntryKind, HostEnvironment, ProbeError, ProbeResult};

/// Host environment of the running process
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl SystemHost {
    pub fn new() -> Self {
        Self
    }
}

impl HostEnvironment for SystemHost {
    fn path_exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }

    fn can_open_url(&self, url: &str) -> ProbeResult<bool> {
        platform::can_open_url(url)
    }

    fn create_file(&self, path: &str, contents: &[u8]) -> ProbeResult<()> {
        // O_CREAT | O_EXCL: fails on any existing entry, dangling links included
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| ProbeError::from_io(path, e))?;
        if let Err(e) = file.write_all(contents) {
            drop(file);
            let _ = fs::remove_file(path);
            return Err(ProbeError::from_io(path, e));
        }
        Ok(())
    }

    fn remove_file(&self, path: &str) -> ProbeResult<()> {
        fs::remove_file(path).map_err(|e| ProbeError::from_io(path, e))
    }

    fn loaded_modules(&self) -> ProbeResult<Vec<String>> {
        platform::loaded_modules()
    }

    fn entry_kind(&self, path: &str) -> ProbeResult<EntryKind> {
        let metadata = fs::symlink_metadata(path).map_err(|e| ProbeError::from_io(path, e))?;
        let file_type = metadata.file_type();

        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };
        Ok(kind)
    }

    fn stat(&self, path: &str) -> ProbeResult<()> {
        platform::stat(path)
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var_os(name).map(|v| v.to_string_lossy().into_owned())
    }

    fn spawn_attributes_available(&self) -> ProbeResult<bool> {
        platform::spawn_attributes_available()
    }

    fn device_model(&self) -> String {
        platform::device_model()
    }

    fn platform_version(&self) -> String {
        platform::platform_version()
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
