//! Per-platform probe implementations
//!
//! Each function has one implementation per supported target family and a
//! fallback returning `ProbeError::Unsupported` (or a neutral value for the
//! device context strings).

use super::{ProbeError, ProbeResult};

// ============================================================================
// Loaded Modules
// ============================================================================

/// Enumerate the images in the dyld image table
#[cfg(target_vendor = "apple")]
pub fn loaded_modules() -> ProbeResult<Vec<String>> {
    // SAFETY: dyld image accessors are thread-safe and return NULL for an index
    // that was unloaded between the count and the lookup.
    let count = unsafe { libc::_dyld_image_count() };
    let mut modules = Vec::with_capacity(count as usize);

    for index in 0..count {
        let name = unsafe { libc::_dyld_get_image_name(index) };
        if name.is_null() {
            continue;
        }
        let path = unsafe { std::ffi::CStr::from_ptr(name) };
        modules.push(path.to_string_lossy().into_owned());
    }

    Ok(modules)
}

/// Enumerate file-backed mappings of this process
#[cfg(target_os = "linux")]
pub fn loaded_modules() -> ProbeResult<Vec<String>> {
    let path = "/proc/self/maps";
    let content = std::fs::read_to_string(path).map_err(|e| ProbeError::from_io(path, e))?;
    Ok(parse_proc_maps(&content))
}

#[cfg(not(any(target_vendor = "apple", target_os = "linux")))]
pub fn loaded_modules() -> ProbeResult<Vec<String>> {
    Err(ProbeError::Unsupported(
        "loaded module enumeration".to_string(),
    ))
}

/// Extract unique mapped file paths from `/proc/<pid>/maps` content
///
/// Anonymous and pseudo mappings (`[heap]`, `[vdso]`, ...) are skipped.
/// Paths keep first-seen order.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub(crate) fn parse_proc_maps(content: &str) -> Vec<String> {
    let mut modules: Vec<String> = Vec::new();

    for line in content.lines() {
        // address, perms, offset, dev and inode never contain '/'
        let Some(start) = line.find('/') else {
            continue;
        };
        let Some(path) = line.get(start..).map(str::trim_end) else {
            continue;
        };
        if !modules.iter().any(|m| m == path) {
            modules.push(path.to_string());
        }
    }

    modules
}

// ============================================================================
// URL Handlers
// ============================================================================

/// Freedesktop MIME handler databases, user entries first
#[cfg(target_os = "linux")]
fn mime_handler_databases() -> Vec<std::path::PathBuf> {
    use std::path::PathBuf;

    let mut databases = Vec::new();

    let config_home = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")));
    if let Some(config_home) = config_home {
        databases.push(config_home.join("mimeapps.list"));
    }

    let data_home = std::env::var_os("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")));
    if let Some(data_home) = data_home {
        databases.push(data_home.join("applications/mimeapps.list"));
        databases.push(data_home.join("applications/mimeinfo.cache"));
    }

    databases.push(PathBuf::from("/etc/xdg/mimeapps.list"));
    databases.push(PathBuf::from("/usr/local/share/applications/mimeinfo.cache"));
    databases.push(PathBuf::from("/usr/share/applications/mimeinfo.cache"));
    databases
}

/// Check the freedesktop MIME databases for an `x-scheme-handler/<scheme>` entry
#[cfg(target_os = "linux")]
pub fn can_open_url(url: &str) -> ProbeResult<bool> {
    let scheme = url_scheme(url)
        .ok_or_else(|| ProbeError::InvalidInput(format!("URL has no scheme: {}", url)))?;

    let mut databases_read = 0usize;
    for database in mime_handler_databases() {
        let Ok(content) = std::fs::read_to_string(&database) else {
            continue;
        };
        databases_read += 1;
        if scheme_registered(&content, scheme) {
            log::debug!("URL scheme '{}' registered in {}", scheme, database.display());
            return Ok(true);
        }
    }

    if databases_read == 0 {
        return Err(ProbeError::Unsupported(
            "no MIME handler database available".to_string(),
        ));
    }
    Ok(false)
}

#[cfg(not(target_os = "linux"))]
pub fn can_open_url(_url: &str) -> ProbeResult<bool> {
    Err(ProbeError::Unsupported(
        "URL handler registry query".to_string(),
    ))
}

/// Text before `://`, if the URL has a non-empty scheme
pub(crate) fn url_scheme(url: &str) -> Option<&str> {
    url.split_once("://")
        .map(|(scheme, _)| scheme)
        .filter(|scheme| !scheme.is_empty())
}

/// Whether a mimeapps.list / mimeinfo.cache document registers a handler
///
/// Entries under `[Removed Associations]` do not count.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub(crate) fn scheme_registered(content: &str, scheme: &str) -> bool {
    let key = format!("x-scheme-handler/{}", scheme);
    let mut removed_section = false;

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            removed_section = line == "[Removed Associations]";
            continue;
        }
        if removed_section {
            continue;
        }
        if let Some((name, handlers)) = line.split_once('=') {
            if name.trim() == key && !handlers.trim().trim_matches(';').is_empty() {
                return true;
            }
        }
    }

    false
}

// ============================================================================
// Process Spawning
// ============================================================================

#[cfg(any(target_os = "linux", target_vendor = "apple"))]
pub fn spawn_attributes_available() -> ProbeResult<bool> {
    // SAFETY: the attribute object is zero-initialised, initialised by
    // posix_spawnattr_init and destroyed only when initialisation succeeded.
    let mut attr: libc::posix_spawnattr_t = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::posix_spawnattr_init(&mut attr) };
    if rc != 0 {
        return Ok(false);
    }
    unsafe {
        libc::posix_spawnattr_destroy(&mut attr);
    }
    Ok(true)
}

#[cfg(not(any(target_os = "linux", target_vendor = "apple")))]
pub fn spawn_attributes_available() -> ProbeResult<bool> {
    Err(ProbeError::Unsupported(
        "posix spawn attributes".to_string(),
    ))
}

// ============================================================================
// stat(2)
// ============================================================================

/// Call stat(2) directly, bypassing the std path helpers
#[cfg(unix)]
pub fn stat(path: &str) -> ProbeResult<()> {
    let c_path = std::ffi::CString::new(path)
        .map_err(|_| ProbeError::InvalidInput(format!("path contains NUL byte: {:?}", path)))?;

    // SAFETY: `c_path` is a valid NUL-terminated string and `st` is a
    // writable, properly sized stat buffer.
    let mut st: libc::stat = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::stat(c_path.as_ptr(), &mut st) };

    if rc == 0 {
        Ok(())
    } else {
        Err(ProbeError::from_io(path, std::io::Error::last_os_error()))
    }
}

#[cfg(not(unix))]
pub fn stat(path: &str) -> ProbeResult<()> {
    std::fs::metadata(path)
        .map(|_| ())
        .map_err(|e| ProbeError::from_io(path, e))
}

// ============================================================================
// Device Context
// ============================================================================

#[cfg(unix)]
struct Uname {
    sysname: String,
    release: String,
    machine: String,
}

#[cfg(unix)]
fn uname() -> Option<Uname> {
    // SAFETY: `info` is a writable utsname buffer; uname fills NUL-terminated
    // fields within it.
    let mut info: libc::utsname = unsafe { std::mem::zeroed() };
    if unsafe { libc::uname(&mut info) } != 0 {
        return None;
    }
    Some(Uname {
        sysname: c_field(&info.sysname),
        release: c_field(&info.release),
        machine: c_field(&info.machine),
    })
}

#[cfg(unix)]
fn c_field(field: &[libc::c_char]) -> String {
    let bytes: Vec<u8> = field
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Hardware model identifier (`utsname.machine` on Unix targets)
pub fn device_model() -> String {
    #[cfg(unix)]
    {
        if let Some(info) = uname() {
            if !info.machine.is_empty() {
                return info.machine;
            }
        }
    }
    std::env::consts::ARCH.to_string()
}

/// Operating system name and release
pub fn platform_version() -> String {
    #[cfg(unix)]
    {
        if let Some(info) = uname() {
            return format!("{} {}", info.sysname, info.release);
        }
    }
    format!("{} unknown", std::env::consts::OS)
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
    fn test_parse_proc_maps_dedupes_and_skips_pseudo_mappings() {
        let maps = "\
55d0c0a00000-55d0c0a2a000 r--p 00000000 fd:01 1835 /usr/bin/cat
55d0c0a2a000-55d0c0a5f000 r-xp 0002a000 fd:01 1835 /usr/bin/cat
55d0c1b6d000-55d0c1b8e000 rw-p 00000000 00:00 0    [heap]
7f1e2c000000-7f1e2c021000 r-xp 00000000 fd:01 2201 /usr/lib/x86_64-linux-gnu/libc.so.6
7f1e2c400000-7f1e2c401000 r--p 00000000 fd:01 9999 /tmp/frida agent.so (deleted)
7ffd3b3f2000-7ffd3b3f4000 r-xp 00000000 00:00 0    [vdso]
";
        let modules = parse_proc_maps(maps);
        assert_eq!(
            modules,
            vec![
                "/usr/bin/cat".to_string(),
                "/usr/lib/x86_64-linux-gnu/libc.so.6".to_string(),
                "/tmp/frida agent.so (deleted)".to_string(),
            ]
        );
    }

    #[test]
    fn test_url_scheme_extraction() {
        assert_eq!(url_scheme("cydia://package/com.example.package"), Some("cydia"));
        assert_eq!(url_scheme("filza://"), Some("filza"));
        assert_eq!(url_scheme("://nothing"), None);
        assert_eq!(url_scheme("no-scheme"), None);
    }

    #[test]
    fn test_scheme_registered_respects_sections() {
        let list = "\
[Default Applications]
x-scheme-handler/sileo=sileo.desktop
text/html=firefox.desktop

[Removed Associations]
x-scheme-handler/cydia=cydia.desktop
";
        assert!(scheme_registered(list, "sileo"));
        assert!(!scheme_registered(list, "cydia"));
        assert!(!scheme_registered(list, "zbra"));
    }

    #[test]
    fn test_scheme_registered_ignores_empty_handler_list() {
        let cache = "[MIME Cache]\nx-scheme-handler/filza=;\n";
        assert!(!scheme_registered(cache, "filza"));
    }

    #[test]
    fn test_device_context_is_not_empty() {
        assert!(!device_model().is_empty());
        assert!(!platform_version().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_stat_root_and_missing_path() {
        assert!(stat("/").is_ok());
        assert!(matches!(
            stat("/definitely/not/here/integrity"),
            Err(ProbeError::NotFound(_))
        ));
        assert!(matches!(stat("bad\0path"), Err(ProbeError::InvalidInput(_))));
    }
}
