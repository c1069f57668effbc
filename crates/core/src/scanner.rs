//! Whole-system scan.
//!
//! Enumerates every PID under the configured proc root, probes each one,
//! and aggregates stale processes into a per-unit report.

use std::collections::BTreeMap;
use std::fs;

use tracing::{debug, warn};

use crate::cgroup::{UnitKind, UnitRef};
use crate::config::ScanConfig;
use crate::error::{Error, Result};
use crate::process::{probe, ProbeOutcome, ProcessInfo};
use crate::report::{ScanReport, UnitReport};

pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Scanner { config }
    }

    /// List all numeric entries of the proc root, sorted.
    fn pids(&self) -> Result<Vec<u32>> {
        let root = &self.config.proc_root;
        let mut pids = Vec::new();
        for entry in fs::read_dir(root).map_err(|e| Error::io_at(root.clone(), e))? {
            let entry = entry.map_err(|e| Error::io_at(root.clone(), e))?;
            if let Some(pid) = entry.file_name().to_str().and_then(|n| n.parse::<u32>().ok()) {
                pids.push(pid);
            }
        }
        pids.sort_unstable();
        Ok(pids)
    }

    /// Scan the system and aggregate the findings per unit.
    pub fn scan(&self) -> Result<ScanReport> {
        let mut by_unit: BTreeMap<UnitRef, Vec<ProcessInfo>> = BTreeMap::new();
        let mut unowned = Vec::new();
        let mut scanned = 0usize;
        let mut skipped_unreadable = 0usize;

        for pid in self.pids()? {
            match probe(&self.config.proc_root, pid, &self.config) {
                Ok(ProbeOutcome::Clean) => scanned += 1,
                Ok(ProbeOutcome::Vanished) => {
                    debug!(pid, "process vanished during scan");
                }
                Ok(ProbeOutcome::Unreadable) => {
                    debug!(pid, "maps not readable, skipping");
                    scanned += 1;
                    skipped_unreadable += 1;
                }
                Ok(ProbeOutcome::Stale(info)) => {
                    scanned += 1;
                    match &info.unit {
                        Some(unit) => {
                            if self.config.is_ignored_unit(&unit.name) {
                                debug!(unit = %unit.name, pid, "unit ignored by configuration");
                                continue;
                            }
                            if unit.kind == UnitKind::Scope && !self.config.include_scopes {
                                debug!(unit = %unit.name, pid, "scope excluded");
                                continue;
                            }
                            by_unit.entry(unit.clone()).or_default().push(info);
                        }
                        None => {
                            if self.config.include_unowned {
                                unowned.push(info);
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(pid, error = %e, "probe failed, skipping process");
                }
            }
        }

        Ok(ScanReport {
            units: by_unit
                .into_iter()
                .map(|(unit, processes)| UnitReport { unit, processes })
                .collect(),
            unowned,
            scanned,
            skipped_unreadable,
        })
    }
}
