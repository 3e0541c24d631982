// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process liveness and graceful termination

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::time::Duration;

/// Poll interval while waiting out the SIGTERM grace period.
const GRACE_POLL: Duration = Duration::from_millis(100);

/// Whether a pid refers to a live process (signal 0 probe).
///
/// EPERM counts as alive: the process exists but belongs to someone else.
pub fn pid_alive(pid: u32) -> bool {
    match kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => true,
        Err(nix::errno::Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// SIGTERM, wait up to `grace`, then SIGKILL. Idempotent and best-effort:
/// a pid that is already gone is success.
///
/// Returns true when the process needed SIGKILL.
pub async fn terminate_graceful(pid: u32, grace: Duration) -> bool {
    let target = Pid::from_raw(pid as i32);
    if !pid_alive(pid) {
        return false;
    }

    if let Err(err) = kill(target, Signal::SIGTERM) {
        tracing::debug!(pid, error = %err, "SIGTERM failed (process likely gone)");
        return false;
    }

    let deadline = tokio::time::Instant::now() + grace;
    while tokio::time::Instant::now() < deadline {
        if !pid_alive(pid) {
            return false;
        }
        tokio::time::sleep(GRACE_POLL).await;
    }

    if pid_alive(pid) {
        tracing::warn!(pid, "grace period elapsed, sending SIGKILL");
        let _ = kill(target, Signal::SIGKILL);
        return true;
    }
    false
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
