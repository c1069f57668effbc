//! Parser for `/proc/<pid>/maps`.
//!
//! Each line describes one memory mapping. File-backed mappings whose
//! backing file was unlinked after being mapped carry a trailing
//! ` (deleted)` marker; an executable mapping with that marker means the
//! process still runs code from a file that no longer exists on disk.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Marker the kernel appends to unlinked backing files.
const DELETED_SUFFIX: &str = " (deleted)";

/// Permission bits of a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapPerms {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
    /// Shared mapping (`s` in the fourth column, otherwise private).
    pub shared: bool,
}

impl MapPerms {
    fn parse(field: &str) -> Result<Self> {
        let bytes = field.as_bytes();
        if bytes.len() != 4 {
            return Err(Error::Parse(format!("bad permission field `{field}`")));
        }
        Ok(MapPerms {
            read: bytes[0] == b'r',
            write: bytes[1] == b'w',
            execute: bytes[2] == b'x',
            shared: bytes[3] == b's',
        })
    }
}

/// Pathname column of a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapPath {
    /// Regular file-backed mapping.
    File { path: PathBuf, deleted: bool },
    /// No pathname (anonymous memory).
    Anonymous,
    /// Kernel pseudo-mappings such as `[heap]`, `[stack]`, `[vdso]`,
    /// or `anon_inode:` entries.
    Pseudo(String),
}

/// One line of `/proc/<pid>/maps`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapEntry {
    pub start: u64,
    pub end: u64,
    pub perms: MapPerms,
    pub offset: u64,
    pub dev: String,
    pub inode: u64,
    pub path: MapPath,
}

impl MapEntry {
    /// The backing file path if this mapping points at a deleted executable
    /// file, i.e. the process still executes code whose on-disk copy was
    /// replaced or removed.
    ///
    /// Only executable mappings qualify. A replaced shared library always
    /// has its text segment among the deleted mappings, while deleted
    /// data-only mappings (mmapped logs, caches) do not indicate stale code.
    pub fn stale_library(&self) -> Option<&Path> {
        if !self.perms.execute || self.inode == 0 {
            return None;
        }
        match &self.path {
            MapPath::File { path, deleted: true } => Some(path),
            _ => None,
        }
    }
}

fn parse_hex(field: &str, line: &str) -> Result<u64> {
    u64::from_str_radix(field, 16)
        .map_err(|_| Error::Parse(format!("bad hex field `{field}` in maps line `{line}`")))
}

/// Parse a single maps line.
fn parse_line(line: &str) -> Result<MapEntry> {
    // Five single-space-separated header fields, then the (space-padded)
    // pathname column which may itself contain spaces.
    let mut parts = line.splitn(6, ' ');
    let range = parts
        .next()
        .ok_or_else(|| Error::Parse(format!("empty maps line `{line}`")))?;
    let perms = parts
        .next()
        .ok_or_else(|| Error::Parse(format!("missing permissions in maps line `{line}`")))?;
    let offset = parts
        .next()
        .ok_or_else(|| Error::Parse(format!("missing offset in maps line `{line}`")))?;
    let dev = parts
        .next()
        .ok_or_else(|| Error::Parse(format!("missing device in maps line `{line}`")))?;
    let inode = parts
        .next()
        .ok_or_else(|| Error::Parse(format!("missing inode in maps line `{line}`")))?;
    let pathname = parts.next().unwrap_or("").trim_start();

    let (start, end) = range
        .split_once('-')
        .ok_or_else(|| Error::Parse(format!("bad address range `{range}`")))?;

    let path = if pathname.is_empty() {
        MapPath::Anonymous
    } else if pathname.starts_with('/') {
        match pathname.strip_suffix(DELETED_SUFFIX) {
            Some(stripped) => MapPath::File {
                path: PathBuf::from(stripped),
                deleted: true,
            },
            None => MapPath::File {
                path: PathBuf::from(pathname),
                deleted: false,
            },
        }
    } else {
        MapPath::Pseudo(pathname.to_string())
    };

    Ok(MapEntry {
        start: parse_hex(start, line)?,
        end: parse_hex(end, line)?,
        perms: MapPerms::parse(perms)?,
        offset: parse_hex(offset, line)?,
        dev: dev.to_string(),
        inode: inode
            .parse()
            .map_err(|_| Error::Parse(format!("bad inode `{inode}` in maps line `{line}`")))?,
        path,
    })
}

/// Parse the full contents of a maps file.
pub fn parse_maps(reader: impl BufRead) -> Result<Vec<MapEntry>> {
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            continue;
        }
        entries.push(parse_line(trimmed)?);
    }
    Ok(entries)
}
