//! End-to-end scanner behavior over fake proc trees.

use std::path::PathBuf;

use needs_restart_core::{Scanner, StaleKind, UnitKind};

use crate::test_utils::FakeProc;

#[test]
fn full_host_scan() {
    let proc = FakeProc::new();

    // PID 1 under init.scope, clean.
    proc.process(1, "systemd")
        .cgroup("0::/init.scope\n")
        .mapped("/usr/lib/systemd/systemd")
        .build();

    // A service with two processes, one stale library each.
    proc.process(820, "postgres")
        .cgroup("0::/system.slice/postgresql.service\n")
        .mapped("/usr/bin/postgres")
        .mapped_deleted("/usr/lib64/libicuuc.so.73")
        .build();
    proc.process(821, "postgres")
        .cgroup("0::/system.slice/postgresql.service\n")
        .mapped("/usr/bin/postgres")
        .mapped_deleted("/usr/lib64/libicuuc.so.73")
        .build();

    // A clean service.
    proc.process(900, "sshd")
        .cgroup("0::/system.slice/sshd.service\n")
        .mapped("/usr/sbin/sshd")
        .build();

    // A stale user session, excluded by default.
    proc.process(1500, "bash")
        .cgroup("0::/user.slice/user-1000.slice/session-4.scope\n")
        .mapped_deleted("/usr/lib64/libreadline.so.8")
        .build();

    let report = proc.scanner().scan().unwrap();

    assert_eq!(report.scanned, 5);
    assert_eq!(report.skipped_unreadable, 0);
    assert_eq!(report.units.len(), 1);

    let unit = &report.units[0];
    assert_eq!(unit.unit.name, "postgresql.service");
    assert_eq!(unit.unit.kind, UnitKind::Service);
    assert_eq!(unit.processes.len(), 2);
    assert_eq!(unit.stale_paths().len(), 1);
    assert!(report.needs_restart());
}

#[test]
fn replaced_executable_reported_with_kind() {
    let proc = FakeProc::new();
    proc.process(700, "httpd")
        .cgroup("0::/system.slice/httpd.service\n")
        .exe("/usr/sbin/httpd (deleted)")
        .mapped_deleted("/usr/sbin/httpd")
        .build();

    let report = proc.scanner().scan().unwrap();
    let stale = &report.units[0].processes[0].stale;
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].path, PathBuf::from("/usr/sbin/httpd"));
    assert_eq!(stale[0].kind, StaleKind::Executable);
}

#[test]
fn cgroup_v1_host() {
    let proc = FakeProc::new();
    proc.process(640, "crond")
        .cgroup(
            "12:pids:/system.slice/crond.service\n\
             4:memory:/system.slice/crond.service\n\
             1:name=systemd:/system.slice/crond.service\n",
        )
        .mapped_deleted("/usr/lib64/libaudit.so.1")
        .build();

    let report = proc.scanner().scan().unwrap();
    assert_eq!(report.units[0].unit.name, "crond.service");
}

#[test]
fn escaped_unit_names_resolved() {
    let proc = FakeProc::new();
    proc.process(450, "broker")
        .cgroup("0::/system.slice/dbus\\x2dbroker.service\n")
        .mapped_deleted("/usr/lib64/libexpat.so.1")
        .build();

    let report = proc.scanner().scan().unwrap();
    assert_eq!(report.units[0].unit.name, "dbus-broker.service");
}

#[test]
fn memfd_and_tmpfs_noise_filtered() {
    let proc = FakeProc::new();
    proc.process(300, "pulse")
        .cgroup("0::/system.slice/pipewire.service\n")
        .mapped_deleted("/memfd:pulseaudio")
        .mapped_deleted("/tmp/.wine/scratch.so")
        .mapped_deleted("/dev/zero")
        .build();

    let report = proc.scanner().scan().unwrap();
    assert!(!report.needs_restart());
}

#[test]
fn ignored_units_from_config() {
    let proc = FakeProc::new();
    proc.process(100, "agetty")
        .cgroup("0::/system.slice/serial-getty@ttyS0.service\n")
        .mapped_deleted("/usr/lib64/libsystemd.so.0")
        .build();

    let mut config = proc.config();
    config
        .ignored_units
        .push("serial-getty@ttyS0.service".to_string());

    let report = Scanner::new(config).scan().unwrap();
    assert!(!report.needs_restart());
    assert_eq!(report.scanned, 1);
}

#[test]
fn report_roundtrips_through_json() {
    let proc = FakeProc::new();
    proc.process(100, "nginx")
        .cgroup("0::/system.slice/nginx.service\n")
        .mapped_deleted("/usr/lib64/libssl.so.3")
        .build();

    let report = proc.scanner().scan().unwrap();
    let json = report.to_json().unwrap();
    let parsed: needs_restart_core::ScanReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, report);
}

#[test]
fn vanished_pid_directory_skipped() {
    let proc = FakeProc::new();
    // A pid directory with no files, as left behind by a dying process.
    std::fs::create_dir_all(proc.root().join("777")).unwrap();
    proc.process(100, "sshd")
        .cgroup("0::/system.slice/sshd.service\n")
        .mapped("/usr/sbin/sshd")
        .build();

    let report = proc.scanner().scan().unwrap();
    assert_eq!(report.scanned, 1);
    assert!(!report.needs_restart());
}

#[test]
fn empty_proc_tree() {
    let proc = FakeProc::new();
    let report = proc.scanner().scan().unwrap();
    assert_eq!(report.scanned, 0);
    assert!(!report.needs_restart());
}
