//! Resolution of a process to its systemd unit via `/proc/<pid>/cgroup`.
//!
//! systemd places every process it manages in a cgroup whose path contains
//! the owning unit as a `*.service` or `*.scope` component, e.g.
//! `/system.slice/sshd.service` or `/user.slice/user-1000.slice/session-3.scope`.

use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Kind of systemd unit a process belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Service,
    Scope,
}

/// A systemd unit owning one or more processes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitRef {
    /// Full unit name including the suffix, e.g. `sshd.service`.
    pub name: String,
    pub kind: UnitKind,
}

impl UnitRef {
    pub fn service(name: impl Into<String>) -> Self {
        UnitRef {
            name: name.into(),
            kind: UnitKind::Service,
        }
    }

    pub fn scope(name: impl Into<String>) -> Self {
        UnitRef {
            name: name.into(),
            kind: UnitKind::Scope,
        }
    }
}

/// Undo systemd's cgroup name escaping (`\x2d` and friends).
fn unescape(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    let mut rest = component;
    while let Some(idx) = rest.find("\\x") {
        out.push_str(&rest[..idx]);
        let hex = rest.get(idx + 2..idx + 4);
        match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
            Some(value) => {
                out.push(value as char);
                rest = &rest[idx + 4..];
            }
            None => {
                // Stray backslash, keep it verbatim.
                out.push_str("\\x");
                rest = &rest[idx + 2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Extract the owning unit from a cgroup path, walking leaf-first so the
/// innermost `*.service`/`*.scope` wins. Slices never identify a unit.
fn unit_from_path(path: &str) -> Option<UnitRef> {
    for component in path.split('/').rev() {
        if component.ends_with(".service") {
            return Some(UnitRef::service(unescape(component)));
        }
        if component.ends_with(".scope") {
            return Some(UnitRef::scope(unescape(component)));
        }
    }
    None
}

/// Parse `/proc/<pid>/cgroup` and resolve the owning systemd unit.
///
/// Prefers the cgroup v2 entry (hierarchy 0); falls back to the v1
/// `name=systemd` hierarchy on legacy hosts. Returns `None` for processes
/// not owned by any service or scope (e.g. the root cgroup).
pub fn parse_cgroup(reader: impl BufRead) -> Result<Option<UnitRef>> {
    let mut v1_systemd_path: Option<String> = None;

    for line in reader.lines() {
        let line = line?;
        let mut fields = line.splitn(3, ':');
        let (Some(hierarchy), Some(controllers), Some(path)) =
            (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };

        if hierarchy == "0" && controllers.is_empty() {
            return Ok(unit_from_path(path));
        }
        if controllers.split(',').any(|c| c == "name=systemd") {
            v1_systemd_path = Some(path.to_string());
        }
    }

    Ok(v1_systemd_path.as_deref().and_then(unit_from_path))
}
