// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn pidfile_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run/monoco.pid");

    let pidfile = PidFile::new(4242, "127.0.0.1", 8642, 1_000);
    pidfile.write(&path).unwrap();

    assert_eq!(PidFile::read(&path).unwrap(), Some(pidfile));
}

#[test]
fn read_missing_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(PidFile::read(&dir.path().join("monoco.pid")).unwrap(), None);
}

#[test]
fn malformed_pidfile_reads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("monoco.pid");
    std::fs::write(&path, "4242\n").unwrap();
    assert_eq!(PidFile::read(&path).unwrap(), None);
}

#[test]
fn read_live_removes_stale_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("monoco.pid");
    PidFile::new(4242, "127.0.0.1", 8642, 1_000)
        .write(&path)
        .unwrap();

    let live = PidFile::read_live(&path, |_| false).unwrap();
    assert!(live.is_none());
    assert!(!path.exists());
}

#[test]
fn read_live_keeps_live_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("monoco.pid");
    PidFile::new(4242, "127.0.0.1", 8642, 1_000)
        .write(&path)
        .unwrap();

    let live = PidFile::read_live(&path, |pid| pid == 4242).unwrap();
    assert_eq!(live.map(|p| p.port), Some(8642));
    assert!(path.exists());
}
