// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic file writes and transient-error retry
//!
//! Every durable write in the system goes through `write_atomic` so readers
//! never observe a half-written preamble: write to a temp file in the same
//! directory, then rename over the target.

use crate::StorageError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Number of attempts for retryable I/O (initial try + retries).
const MAX_ATTEMPTS: u32 = 3;

/// Base delay between retry attempts; doubles each attempt.
const RETRY_BASE: Duration = Duration::from_millis(25);

fn io_err(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// ENOSPC is excluded from retry: retrying a full disk only burns time.
fn is_retryable(err: &std::io::Error) -> bool {
    if err.raw_os_error() == Some(28) {
        return false;
    }
    matches!(
        err.kind(),
        std::io::ErrorKind::Interrupted
            | std::io::ErrorKind::WouldBlock
            | std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::PermissionDenied
    )
}

/// Run a fallible I/O operation with bounded exponential backoff.
///
/// Past the final attempt the error escalates as `RetriesExhausted`.
pub fn with_io_retry<T>(
    path: &Path,
    mut op: impl FnMut() -> std::io::Result<T>,
) -> Result<T, StorageError> {
    let mut delay = RETRY_BASE;
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if attempt < MAX_ATTEMPTS && is_retryable(&err) => {
                tracing::debug!(
                    path = %path.display(),
                    attempt,
                    error = %err,
                    "retrying transient io error"
                );
                std::thread::sleep(delay);
                delay *= 2;
                attempt += 1;
            }
            Err(err) if attempt >= MAX_ATTEMPTS && is_retryable(&err) => {
                return Err(StorageError::RetriesExhausted {
                    path: path.to_path_buf(),
                    attempts: attempt,
                    source: err,
                });
            }
            Err(err) => return Err(io_err(path, err)),
        }
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let nonce: u32 = rand::random();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    path.with_file_name(format!(".{name}.tmp-{}-{nonce:08x}", std::process::id()))
}

/// Write `contents` to `path` via write-temp-then-rename.
///
/// Creates parent directories as needed. The rename is atomic on POSIX, so
/// concurrent readers see either the old file or the new one, never a blend.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        with_io_retry(path, || std::fs::create_dir_all(parent))?;
    }

    let tmp = temp_sibling(path);
    let result = with_io_retry(path, || {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
        std::fs::rename(&tmp, path)
    });

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

/// Append a block to a file, atomically replacing the whole file.
///
/// The memo inbox is small by design; rewriting it wholesale keeps the
/// monotone-drain invariant simple.
pub fn append_atomic(path: &Path, block: &str) -> Result<(), StorageError> {
    let mut contents = read_if_exists(path)?.unwrap_or_default();
    contents.push_str(block);
    write_atomic(path, contents.as_bytes())
}

/// Read a file's contents, mapping not-found to `None`.
pub fn read_if_exists(path: &Path) -> Result<Option<String>, StorageError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
