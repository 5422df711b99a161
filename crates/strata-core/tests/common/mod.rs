//! Shared helpers for strata-core integration tests.

#![allow(dead_code)]

pub mod flaky;

use std::sync::Arc;
use std::time::Duration;

use strata_core::emulator::Emulator;
use strata_core::retry::RetryPolicy;
use tempfile::TempDir;

/// Short real delays so retry tests finish quickly against the sqlite emulator.
pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        ..RetryPolicy::default_preset()
    }
}

/// Emulator backed by a database file in a fresh temp dir. Keep the dir alive.
pub async fn emulator_on_disk() -> (TempDir, Arc<Emulator>) {
    let dir = tempfile::tempdir().unwrap();
    let emu = Emulator::open_at(dir.path().join("emulator.db")).await.unwrap();
    (dir, Arc::new(emu))
}
