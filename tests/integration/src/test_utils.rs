//! Fake proc-tree builder shared by the integration tests.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use needs_restart_core::{ScanConfig, Scanner};

/// A fake `/proc` built in a temporary directory.
pub struct FakeProc {
    dir: TempDir,
}

/// One process being added to a [`FakeProc`].
pub struct FakeProcess<'a> {
    proc_root: &'a Path,
    pid: u32,
    comm: String,
    exe_target: String,
    maps: String,
    cgroup: String,
}

impl FakeProc {
    pub fn new() -> Self {
        FakeProc {
            dir: TempDir::new().expect("tempdir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn process(&self, pid: u32, comm: &str) -> FakeProcess<'_> {
        FakeProcess {
            proc_root: self.dir.path(),
            pid,
            comm: comm.to_string(),
            exe_target: format!("/usr/bin/{comm}"),
            maps: String::new(),
            cgroup: "0::/\n".to_string(),
        }
    }

    /// A scanner whose proc root points at this tree, with default config.
    pub fn scanner(&self) -> Scanner {
        Scanner::new(self.config())
    }

    pub fn config(&self) -> ScanConfig {
        ScanConfig {
            proc_root: self.root().to_path_buf(),
            ..ScanConfig::default()
        }
    }
}

impl Default for FakeProc {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeProcess<'_> {
    pub fn exe(mut self, target: &str) -> Self {
        self.exe_target = target.to_string();
        self
    }

    pub fn cgroup(mut self, content: &str) -> Self {
        self.cgroup = content.to_string();
        self
    }

    /// Add a clean file-backed executable mapping.
    pub fn mapped(mut self, path: &str) -> Self {
        self.maps.push_str(&format!(
            "7f0000000000-7f0000001000 r-xp 00000000 fd:00 10 {path}\n"
        ));
        self
    }

    /// Add a deleted executable mapping (text segment of a replaced file).
    pub fn mapped_deleted(mut self, path: &str) -> Self {
        self.maps.push_str(&format!(
            "7f0000100000-7f0000101000 r-xp 00000000 fd:00 11 {path} (deleted)\n"
        ));
        self
    }

    /// Write the process into the tree.
    pub fn build(self) -> PathBuf {
        let dir = self.proc_root.join(self.pid.to_string());
        fs::create_dir_all(&dir).expect("pid dir");
        fs::write(dir.join("comm"), format!("{}\n", self.comm)).expect("comm");
        fs::write(dir.join("maps"), &self.maps).expect("maps");
        fs::write(dir.join("cgroup"), &self.cgroup).expect("cgroup");
        symlink(&self.exe_target, dir.join("exe")).expect("exe link");
        dir
    }
}
