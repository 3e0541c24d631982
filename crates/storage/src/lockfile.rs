// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Claim lock files
//!
//! Mailbox claim/done/fail serializes per message id through a sibling
//! `<name>.lock` file carrying the claimer identity and a monotonic lease.
//! Creation is `create_new` (O_EXCL), so two claimers cannot both win.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default lease duration before a lock is considered abandoned.
const DEFAULT_LEASE_MS: u64 = 10 * 60 * 1000;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("already claimed by {owner}")]
    AlreadyLocked { owner: String },

    #[error("lock at {path} held by {owner}, not {caller}")]
    NotOwner {
        path: PathBuf,
        owner: String,
        caller: String,
    },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt lock file at {0}")]
    Corrupt(PathBuf),
}

/// Contents of a claim lock file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimLock {
    pub owner: String,
    /// Epoch milliseconds when the claim was taken
    pub acquired_at: u64,
    /// Epoch milliseconds past which the claim may be broken
    pub lease_until: u64,
}

impl ClaimLock {
    fn lock_path(target: &Path) -> PathBuf {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        target.with_file_name(format!("{name}.lock"))
    }

    /// Claim `target` for `owner`. Rejects when a live lock exists for a
    /// different owner; an expired lease is silently broken.
    pub fn acquire(target: &Path, owner: &str, now_ms: u64) -> Result<Self, LockError> {
        let path = Self::lock_path(target);

        if let Some(existing) = Self::read(&path)? {
            if existing.lease_until > now_ms {
                return Err(LockError::AlreadyLocked {
                    owner: existing.owner,
                });
            }
            tracing::warn!(
                path = %path.display(),
                stale_owner = %existing.owner,
                "breaking expired claim lease"
            );
            std::fs::remove_file(&path).map_err(|source| LockError::Io {
                path: path.clone(),
                source,
            })?;
        }

        let lock = ClaimLock {
            owner: owner.to_string(),
            acquired_at: now_ms,
            lease_until: now_ms + DEFAULT_LEASE_MS,
        };

        let json = serde_json::to_vec(&lock).map_err(|_| LockError::Corrupt(path.clone()))?;
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::AlreadyExists {
                    // Raced another claimer between read and create
                    LockError::AlreadyLocked {
                        owner: "concurrent claimer".to_string(),
                    }
                } else {
                    LockError::Io {
                        path: path.clone(),
                        source,
                    }
                }
            })?;
        file.write_all(&json).map_err(|source| LockError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(lock)
    }

    /// Release a claim held by `caller`. Releasing someone else's lock is an
    /// error; releasing an absent lock is idempotent success.
    pub fn release(target: &Path, caller: &str) -> Result<(), LockError> {
        let path = Self::lock_path(target);
        let Some(existing) = Self::read(&path)? else {
            return Ok(());
        };
        if existing.owner != caller {
            return Err(LockError::NotOwner {
                path,
                owner: existing.owner,
                caller: caller.to_string(),
            });
        }
        std::fs::remove_file(&path).map_err(|source| LockError::Io { path, source })
    }

    /// Current lock holder for `target`, if any.
    pub fn holder(target: &Path) -> Result<Option<ClaimLock>, LockError> {
        Self::read(&Self::lock_path(target))
    }

    fn read(path: &Path) -> Result<Option<ClaimLock>, LockError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map(Some)
                .map_err(|_| LockError::Corrupt(path.to_path_buf())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(LockError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
#[path = "lockfile_tests.rs"]
mod tests;
