// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn target() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("20260301T100000_abc.md");
    std::fs::write(&path, "message").unwrap();
    (dir, path)
}

#[test]
fn acquire_creates_sibling_lock_file() {
    let (_tmp, path) = target();
    ClaimLock::acquire(&path, "agent-1", 1_000).unwrap();

    let lock_path = path.with_file_name("20260301T100000_abc.md.lock");
    assert!(lock_path.exists());

    let holder = ClaimLock::holder(&path).unwrap().unwrap();
    assert_eq!(holder.owner, "agent-1");
    assert_eq!(holder.acquired_at, 1_000);
}

#[test]
fn second_claimer_is_rejected() {
    let (_tmp, path) = target();
    ClaimLock::acquire(&path, "agent-1", 1_000).unwrap();

    let err = ClaimLock::acquire(&path, "agent-2", 2_000).unwrap_err();
    assert!(matches!(err, LockError::AlreadyLocked { owner } if owner == "agent-1"));
}

#[test]
fn reclaim_by_same_owner_is_still_rejected_while_live() {
    // claim(m); claim(m) by the same owner is a protocol error upstream;
    // the lock layer treats any live lock as exclusive.
    let (_tmp, path) = target();
    ClaimLock::acquire(&path, "agent-1", 1_000).unwrap();
    assert!(ClaimLock::acquire(&path, "agent-1", 2_000).is_err());
}

#[test]
fn expired_lease_is_broken() {
    let (_tmp, path) = target();
    ClaimLock::acquire(&path, "agent-1", 1_000).unwrap();

    let past_lease = 1_000 + 10 * 60 * 1000 + 1;
    let lock = ClaimLock::acquire(&path, "agent-2", past_lease).unwrap();
    assert_eq!(lock.owner, "agent-2");
}

#[test]
fn release_by_owner_removes_lock() {
    let (_tmp, path) = target();
    ClaimLock::acquire(&path, "agent-1", 1_000).unwrap();
    ClaimLock::release(&path, "agent-1").unwrap();
    assert!(ClaimLock::holder(&path).unwrap().is_none());

    // Idempotent: releasing again succeeds
    ClaimLock::release(&path, "agent-1").unwrap();
}

#[test]
fn release_by_other_owner_is_rejected() {
    let (_tmp, path) = target();
    ClaimLock::acquire(&path, "agent-1", 1_000).unwrap();

    let err = ClaimLock::release(&path, "agent-2").unwrap_err();
    assert!(matches!(err, LockError::NotOwner { .. }));
    assert!(ClaimLock::holder(&path).unwrap().is_some());
}
