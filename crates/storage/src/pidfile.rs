// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon PID file
//!
//! `<project>/.monoco/run/monoco.pid` carries `{pid, host, port, started_at}`
//! as JSON. Liveness probing is injected by the caller so this crate stays
//! free of signal machinery.

use crate::{read_if_exists, write_atomic, StorageError};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidFile {
    pub pid: u32,
    pub host: String,
    pub port: u16,
    /// Epoch milliseconds
    pub started_at: u64,
}

impl PidFile {
    pub fn new(pid: u32, host: impl Into<String>, port: u16, started_at: u64) -> Self {
        Self {
            pid,
            host: host.into(),
            port,
            started_at,
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(self)?;
        write_atomic(path, &json)
    }

    /// Read the PID file; malformed contents read as `None` (a stale file
    /// from an older daemon must not block startup forever).
    pub fn read(path: &Path) -> Result<Option<Self>, StorageError> {
        let Some(contents) = read_if_exists(path)? else {
            return Ok(None);
        };
        match serde_json::from_str(&contents) {
            Ok(pidfile) => Ok(Some(pidfile)),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring malformed pid file");
                Ok(None)
            }
        }
    }

    /// Read and filter to a live daemon, removing a stale file.
    pub fn read_live(
        path: &Path,
        alive: impl Fn(u32) -> bool,
    ) -> Result<Option<Self>, StorageError> {
        match Self::read(path)? {
            Some(pidfile) if alive(pidfile.pid) => Ok(Some(pidfile)),
            Some(_) => {
                let _ = std::fs::remove_file(path);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn remove(path: &Path) {
        let _ = std::fs::remove_file(path);
    }
}

#[cfg(test)]
#[path = "pidfile_tests.rs"]
mod tests;
