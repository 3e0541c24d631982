// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer for Monoco
//!
//! The filesystem is the source of truth for every entity; this crate owns
//! the durability primitives everyone else builds on: atomic replace writes,
//! transient-error retry, the session store, claim lock files, the project
//! registry, and the daemon PID file.

mod atomic;
mod lockfile;
mod pidfile;
mod registry;
mod session_store;

pub use atomic::{append_atomic, read_if_exists, with_io_retry, write_atomic};
pub use lockfile::{ClaimLock, LockError};
pub use pidfile::PidFile;
pub use registry::{ProjectEntry, ProjectRegistry, RegistryError};
pub use session_store::{SessionStore, SessionStoreError};

use thiserror::Error;

/// Errors from the durability primitives.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error at {path} after {attempts} attempts: {source}")]
    RetriesExhausted {
        path: std::path::PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

impl monoco_core::error::Classified for StorageError {
    fn class(&self) -> monoco_core::ErrorClass {
        match self {
            StorageError::RetriesExhausted { .. } => monoco_core::ErrorClass::TransientIo,
            StorageError::Io { source, .. } if source.raw_os_error() == Some(28) => {
                // ENOSPC is never retried and always fatal
                monoco_core::ErrorClass::Fatal
            }
            _ => monoco_core::ErrorClass::TransientIo,
        }
    }
}
