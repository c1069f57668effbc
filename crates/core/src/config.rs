//! Scan configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Path prefixes that produce deleted-file noise rather than replaced
/// binaries: device nodes, memfd/SysV shared memory, tmpfs scratch files.
const DEFAULT_IGNORED_PREFIXES: &[&str] = &[
    "/dev/",
    "/memfd:",
    "/run/",
    "/tmp/",
    "/var/tmp/",
    "/SYSV",
    "/drm",
];

/// Configuration for a scan, loadable from TOML and adjustable from the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Root of the proc filesystem. Overridable for tests.
    pub proc_root: PathBuf,
    /// Stale files under these prefixes are not reported.
    pub ignored_prefixes: Vec<String>,
    /// Units excluded from the report by name.
    pub ignored_units: Vec<String>,
    /// Report `*.scope` units (user sessions, machines) as well.
    pub include_scopes: bool,
    /// Report stale processes that belong to no unit.
    pub include_unowned: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            proc_root: PathBuf::from("/proc"),
            ignored_prefixes: DEFAULT_IGNORED_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            ignored_units: Vec::new(),
            include_scopes: false,
            include_unowned: true,
        }
    }
}

impl ScanConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
        toml::from_str(&raw).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Whether a stale file path is covered by the ignore list.
    pub fn is_ignored_path(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        self.ignored_prefixes
            .iter()
            .any(|prefix| text.starts_with(prefix.as_str()))
    }

    /// Whether a unit is excluded from the report by name.
    pub fn is_ignored_unit(&self, name: &str) -> bool {
        self.ignored_units.iter().any(|u| u == name)
    }
}
