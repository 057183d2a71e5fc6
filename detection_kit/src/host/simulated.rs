//! # Simulated Host
//!
//! In-memory `HostEnvironment` for tests and dry runs. A fresh
//! `SimulatedHost::new()` models a clean, stock device: nothing denylisted is
//! present, every write is refused, no URL handlers are registered and no
//! injection variables are set.
//!
//! ```
//! use detection_kit::host::SimulatedHost;
//!
//! let host = SimulatedHost::new()
//!     .with_directory("/Applications/Cydia.app")
//!     .with_env("DYLD_INSERT_LIBRARIES", "/tmp/evil.dylib");
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use super::{url_scheme, EntryKind, HostEnvironment, ProbeError, ProbeResult};

/// A probe that can be forced to fail as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SimulatedFault {
    /// `can_open_url` reports the registry as unavailable
    UrlRegistry,
    /// `loaded_modules` reports the image list as unavailable
    ModuleList,
    /// `spawn_attributes_available` reports the API as unavailable
    SpawnAttributes,
}

/// Simulated host state
#[derive(Debug)]
pub struct SimulatedHost {
    entries: BTreeMap<String, EntryKind>,
    denied: BTreeSet<String>,
    writable_prefixes: Vec<String>,
    url_schemes: BTreeSet<String>,
    modules: Vec<String>,
    env: BTreeMap<String, String>,
    spawn_attributes: bool,
    faults: BTreeSet<SimulatedFault>,
    device_model: String,
    platform_version: String,
    written: Mutex<BTreeSet<String>>,
}

/// Strip a trailing `/` so `/etc/apt/` and `/etc/apt` name the same entry
fn normalize(path: &str) -> String {
    if path.len() > 1 {
        path.trim_end_matches('/').to_string()
    } else {
        path.to_string()
    }
}

impl SimulatedHost {
    /// A clean, stock host
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            denied: BTreeSet::new(),
            writable_prefixes: Vec::new(),
            url_schemes: BTreeSet::new(),
            modules: Vec::new(),
            env: BTreeMap::new(),
            // stock platforms can initialise spawn attributes
            spawn_attributes: true,
            faults: BTreeSet::new(),
            device_model: "SimulatedDevice1,1".to_string(),
            platform_version: "SimOS 1.0".to_string(),
            written: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn with_file(mut self, path: &str) -> Self {
        self.entries.insert(normalize(path), EntryKind::File);
        self
    }

    pub fn with_directory(mut self, path: &str) -> Self {
        self.entries.insert(normalize(path), EntryKind::Directory);
        self
    }

    pub fn with_symlink(mut self, path: &str) -> Self {
        self.entries.insert(normalize(path), EntryKind::Symlink);
        self
    }

    /// Allow writes below `prefix` (a compromised sandbox)
    pub fn with_writable_prefix(mut self, prefix: &str) -> Self {
        self.writable_prefixes.push(prefix.to_string());
        self
    }

    /// Register a handler for `scheme` (text before `://`)
    pub fn with_url_scheme(mut self, scheme: &str) -> Self {
        self.url_schemes.insert(scheme.to_string());
        self
    }

    pub fn with_module(mut self, path: &str) -> Self {
        self.modules.push(path.to_string());
        self
    }

    pub fn with_env(mut self, name: &str, value: &str) -> Self {
        self.env.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_spawn_attributes(mut self, available: bool) -> Self {
        self.spawn_attributes = available;
        self
    }

    pub fn with_device(mut self, model: &str, version: &str) -> Self {
        self.device_model = model.to_string();
        self.platform_version = version.to_string();
        self
    }

    /// Make every path-level probe on `path` fail with permission denied
    pub fn deny_path(mut self, path: &str) -> Self {
        self.denied.insert(normalize(path));
        self
    }

    pub fn fail_probe(mut self, fault: SimulatedFault) -> Self {
        self.faults.insert(fault);
        self
    }

    /// Files written through this host and not yet removed
    pub fn written_files(&self) -> Vec<String> {
        self.written_guard().iter().cloned().collect()
    }

    fn written_guard(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        self.written.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_denied(&self, path: &str) -> ProbeResult<String> {
        let key = normalize(path);
        if self.denied.contains(&key) {
            return Err(ProbeError::PermissionDenied(path.to_string()));
        }
        Ok(key)
    }

    fn lookup(&self, path: &str) -> ProbeResult<EntryKind> {
        let key = self.check_denied(path)?;
        if let Some(kind) = self.entries.get(&key) {
            return Ok(*kind);
        }
        if self.written_guard().contains(&key) {
            return Ok(EntryKind::File);
        }
        Err(ProbeError::NotFound(path.to_string()))
    }
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostEnvironment for SimulatedHost {
    fn path_exists(&self, path: &str) -> bool {
        self.lookup(path).is_ok()
    }

    fn can_open_url(&self, url: &str) -> ProbeResult<bool> {
        if self.faults.contains(&SimulatedFault::UrlRegistry) {
            return Err(ProbeError::Unsupported(
                "URL handler registry query".to_string(),
            ));
        }
        let scheme = url_scheme(url)
            .ok_or_else(|| ProbeError::InvalidInput(format!("URL has no scheme: {}", url)))?;
        Ok(self.url_schemes.contains(scheme))
    }

    fn create_file(&self, path: &str, _contents: &[u8]) -> ProbeResult<()> {
        let key = self.check_denied(path)?;
        let writable = self
            .writable_prefixes
            .iter()
            .any(|prefix| key.starts_with(prefix.as_str()));
        if !writable {
            return Err(ProbeError::PermissionDenied(path.to_string()));
        }
        if self.entries.contains_key(&key) || !self.written_guard().insert(key) {
            return Err(ProbeError::AlreadyExists(path.to_string()));
        }
        Ok(())
    }

    fn remove_file(&self, path: &str) -> ProbeResult<()> {
        let key = self.check_denied(path)?;
        if self.written_guard().remove(&key) {
            Ok(())
        } else {
            Err(ProbeError::NotFound(path.to_string()))
        }
    }

    fn loaded_modules(&self) -> ProbeResult<Vec<String>> {
        if self.faults.contains(&SimulatedFault::ModuleList) {
            return Err(ProbeError::Unsupported(
                "loaded module enumeration".to_string(),
            ));
        }
        Ok(self.modules.clone())
    }

    fn entry_kind(&self, path: &str) -> ProbeResult<EntryKind> {
        self.lookup(path)
    }

    fn stat(&self, path: &str) -> ProbeResult<()> {
        self.lookup(path).map(|_| ())
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }

    fn spawn_attributes_available(&self) -> ProbeResult<bool> {
        if self.faults.contains(&SimulatedFault::SpawnAttributes) {
            return Err(ProbeError::Unsupported(
                "posix spawn attributes".to_string(),
            ));
        }
        Ok(self.spawn_attributes)
    }

    fn device_model(&self) -> String {
        self.device_model.clone()
    }

    fn platform_version(&self) -> String {
        self.platform_version.clone()
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
