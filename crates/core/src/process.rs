//! Per-process probing.
//!
//! A probe reads `comm`, `exe`, `maps`, and `cgroup` for one PID under a
//! configurable proc root and decides whether the process is running stale
//! code. Processes routinely exit mid-scan, so every ENOENT is treated as
//! "the process vanished", never as a scan failure.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::cgroup::{parse_cgroup, UnitRef};
use crate::config::ScanConfig;
use crate::error::{Error, Result};
use crate::maps::parse_maps;

const DELETED_SUFFIX: &str = " (deleted)";

/// What kind of file went stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleKind {
    /// The process executable itself was replaced or removed.
    Executable,
    /// A mapped shared object was replaced or removed.
    Library,
}

/// One deleted-on-disk file a process still has mapped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StaleFile {
    pub path: PathBuf,
    pub kind: StaleKind,
}

/// A process found to be running stale code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    /// Process name from `/proc/<pid>/comm`.
    pub comm: String,
    /// Owning systemd unit, if any.
    pub unit: Option<UnitRef>,
    /// Stale files, deduplicated and sorted by path.
    pub stale: Vec<StaleFile>,
}

/// Result of probing one PID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// No stale mappings (includes kernel threads, which map nothing).
    Clean,
    /// The process maps at least one deleted file.
    Stale(ProcessInfo),
    /// The process exited while being probed.
    Vanished,
    /// Insufficient privileges to read the process's maps.
    Unreadable,
}

fn open_proc_file(path: &Path) -> Result<Option<File>> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io_at(path, e)),
    }
}

/// Probe one PID under `proc_root`.
pub fn probe(proc_root: &Path, pid: u32, config: &ScanConfig) -> Result<ProbeOutcome> {
    let dir = proc_root.join(pid.to_string());

    let maps_path = dir.join("maps");
    let maps_file = match File::open(&maps_path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ProbeOutcome::Vanished),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => return Ok(ProbeOutcome::Unreadable),
        Err(e) => return Err(Error::io_at(maps_path, e)),
    };
    let entries = match parse_maps(BufReader::new(maps_file)) {
        Ok(entries) => entries,
        // The pid can die between open and read; the kernel then fails the
        // read rather than returning empty content.
        Err(Error::Io(_)) => return Ok(ProbeOutcome::Vanished),
        Err(e) => return Err(e),
    };
    if entries.is_empty() {
        // Kernel threads have no address space to go stale.
        return Ok(ProbeOutcome::Clean);
    }

    // Path -> kind, executable winning over library for the same file.
    let mut stale: BTreeMap<PathBuf, StaleKind> = BTreeMap::new();

    match fs::read_link(dir.join("exe")) {
        Ok(target) => {
            let text = target.to_string_lossy();
            if let Some(stripped) = text.strip_suffix(DELETED_SUFFIX) {
                let path = PathBuf::from(stripped);
                if !config.is_ignored_path(&path) {
                    stale.insert(path, StaleKind::Executable);
                }
            }
        }
        // Unreadable or absent exe link (kernel threads, unprivileged
        // probes); the maps scan still covers the text segment.
        Err(e) => trace!(pid, error = %e, "exe link not readable"),
    }

    for entry in &entries {
        if let Some(path) = entry.stale_library() {
            if config.is_ignored_path(path) {
                continue;
            }
            stale.entry(path.to_path_buf()).or_insert(StaleKind::Library);
        }
    }

    if stale.is_empty() {
        return Ok(ProbeOutcome::Clean);
    }

    let comm = match fs::read_to_string(dir.join("comm")) {
        Ok(text) => text.trim().to_string(),
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ProbeOutcome::Vanished),
        Err(e) => return Err(Error::io_at(dir.join("comm"), e)),
    };

    let unit = match open_proc_file(&dir.join("cgroup"))? {
        Some(file) => parse_cgroup(BufReader::new(file))?,
        None => return Ok(ProbeOutcome::Vanished),
    };

    Ok(ProbeOutcome::Stale(ProcessInfo {
        pid,
        comm,
        unit,
        stale: stale
            .into_iter()
            .map(|(path, kind)| StaleFile { path, kind })
            .collect(),
    }))
}
