//! Core functionality for needs-restart.
//!
//! This crate discovers processes that still map executables or shared
//! libraries which have been deleted or replaced on disk, and correlates
//! them with the systemd units they belong to via the cgroup hierarchy.

pub mod cgroup;
pub mod config;
pub mod error;
pub mod logging;
pub mod maps;
pub mod process;
pub mod report;
pub mod scanner;

pub use cgroup::{UnitKind, UnitRef};
pub use config::ScanConfig;
pub use error::{Error, Result};
pub use maps::{MapEntry, MapPath, MapPerms};
pub use process::{ProbeOutcome, ProcessInfo, StaleFile, StaleKind};
pub use report::{ScanReport, UnitReport};
pub use scanner::Scanner;
