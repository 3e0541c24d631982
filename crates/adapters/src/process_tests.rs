// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::process::Command;

#[test]
fn own_pid_is_alive() {
    assert!(pid_alive(std::process::id()));
}

#[test]
fn nonexistent_pid_is_dead() {
    // Max pid on Linux defaults to 4194304; this one cannot exist
    assert!(!pid_alive(4_190_000 + 4_303));
}

#[tokio::test]
async fn terminate_kills_a_sleeping_child() {
    let mut child = Command::new("/bin/sh")
        .arg("-c")
        .arg("sleep 60")
        .spawn()
        .unwrap();
    let pid = child.id().unwrap();

    let needed_kill = terminate_graceful(pid, Duration::from_secs(5)).await;
    // sh dies on SIGTERM within the grace period
    assert!(!needed_kill);

    let status = child.wait().await.unwrap();
    assert!(!status.success());
    assert!(!pid_alive(pid));
}

#[tokio::test]
async fn terminate_escalates_to_sigkill() {
    // A shell that traps and ignores SIGTERM must be SIGKILLed
    let mut child = Command::new("/bin/sh")
        .arg("-c")
        .arg("trap '' TERM; sleep 60")
        .spawn()
        .unwrap();
    let pid = child.id().unwrap();

    // Give the shell a moment to install the trap
    tokio::time::sleep(Duration::from_millis(200)).await;

    let needed_kill = terminate_graceful(pid, Duration::from_millis(500)).await;
    assert!(needed_kill);

    let status = child.wait().await.unwrap();
    assert!(!status.success());
}

#[tokio::test]
async fn terminate_is_idempotent_on_dead_pid() {
    let mut child = Command::new("/bin/true").spawn().unwrap();
    let pid = child.id().unwrap();
    child.wait().await.unwrap();

    assert!(!terminate_graceful(pid, Duration::from_millis(100)).await);
}
