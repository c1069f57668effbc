//! Integration tests for the needs-restart scanner.
//!
//! These tests build complete fake proc trees on disk and drive the
//! scanner end to end, covering aggregation across processes, mixed
//! cgroup v1/v2 hosts, and report serialization.

pub mod test_utils;

#[cfg(test)]
mod scan_tests;
