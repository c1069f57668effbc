//! Scan report types and rendering.
//!
//! The JSON shape is part of the tool's interface; field names are stable
//! wire keys (`units`, `unowned`, `scanned`, `skipped_unreadable`).

use std::collections::BTreeSet;
use std::fmt::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cgroup::UnitRef;
use crate::error::Result;
use crate::process::{ProcessInfo, StaleKind};

/// All stale processes belonging to one systemd unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitReport {
    pub unit: UnitRef,
    /// Stale processes of this unit, sorted by PID.
    pub processes: Vec<ProcessInfo>,
}

impl UnitReport {
    /// Stale file paths across all processes of the unit, deduplicated.
    pub fn stale_paths(&self) -> BTreeSet<&Path> {
        self.processes
            .iter()
            .flat_map(|p| p.stale.iter().map(|s| s.path.as_path()))
            .collect()
    }
}

/// Outcome of a full scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Units that need restarting, sorted by unit name.
    pub units: Vec<UnitReport>,
    /// Stale processes not owned by any service or scope.
    pub unowned: Vec<ProcessInfo>,
    /// Number of processes examined.
    pub scanned: usize,
    /// Processes whose maps could not be read (insufficient privileges).
    pub skipped_unreadable: usize,
}

impl ScanReport {
    /// True if anything on the system needs a restart.
    pub fn needs_restart(&self) -> bool {
        !self.units.is_empty() || !self.unowned.is_empty()
    }

    /// Pretty-printed JSON report.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Unit names only, one per line, for piping into `systemctl restart`.
    pub fn render_quiet(&self) -> String {
        let mut out = String::new();
        for unit in &self.units {
            out.push_str(&unit.unit.name);
            out.push('\n');
        }
        out
    }

    /// Human-readable report.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        for unit in &self.units {
            let _ = writeln!(out, "{}", unit.unit.name);
            for process in &unit.processes {
                let _ = writeln!(out, "    {} {}", process.pid, process.comm);
            }
            for path in unit.stale_paths() {
                let _ = writeln!(out, "        {}", path.display());
            }
        }

        if !self.unowned.is_empty() {
            let _ = writeln!(out, "(no unit)");
            for process in &self.unowned {
                let _ = writeln!(out, "    {} {}", process.pid, process.comm);
                for stale in &process.stale {
                    let kind = match stale.kind {
                        StaleKind::Executable => "executable",
                        StaleKind::Library => "library",
                    };
                    let _ = writeln!(out, "        {} ({kind})", stale.path.display());
                }
            }
        }

        if self.needs_restart() {
            let _ = writeln!(
                out,
                "{} unit(s) and {} unowned process(es) need restarting ({} processes scanned, {} unreadable)",
                self.units.len(),
                self.unowned.len(),
                self.scanned,
                self.skipped_unreadable
            );
        } else {
            let _ = writeln!(
                out,
                "Nothing needs restarting ({} processes scanned, {} unreadable)",
                self.scanned, self.skipped_unreadable
            );
        }

        out
    }
}
