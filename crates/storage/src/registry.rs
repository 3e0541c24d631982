// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Global project registry
//!
//! `~/.monoco/inventory.json` maps a URL-safe slug to an absolute project
//! root plus credential references. The file is shared by every daemon on
//! the host, so writes go through an fs2 exclusive lock acquired
//! non-blockingly with a short retry.

use crate::{read_if_exists, write_atomic, StorageError};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Attempts to take the registry lock before giving up.
const LOCK_ATTEMPTS: u32 = 5;
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("slug {0:?} is not URL-safe (allowed: [a-z0-9-_])")]
    BadSlug(String),

    #[error("slug {0:?} already registered")]
    DuplicateSlug(String),

    #[error("project root {0} is not absolute")]
    RelativeRoot(PathBuf),

    #[error("registry busy: could not take lock after {0} attempts")]
    Busy(u32),

    #[error("corrupt registry at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One registered project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub root: PathBuf,
    /// References into the credential store, keyed by provider
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub credentials: HashMap<String, String>,
}

/// The registry file contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRegistry {
    #[serde(default)]
    pub projects: HashMap<String, ProjectEntry>,
}

fn slug_is_url_safe(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}

impl ProjectRegistry {
    /// Default registry path: `~/.monoco/inventory.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".monoco").join("inventory.json"))
    }

    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        match read_if_exists(path)? {
            Some(contents) => {
                serde_json::from_str(&contents).map_err(|source| RegistryError::Corrupt {
                    path: path.to_path_buf(),
                    source,
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// O(1) slug lookup.
    pub fn resolve(&self, slug: &str) -> Option<&ProjectEntry> {
        self.projects.get(slug)
    }

    /// Register a project; validates slug shape and uniqueness.
    pub fn register(&mut self, slug: &str, entry: ProjectEntry) -> Result<(), RegistryError> {
        if !slug_is_url_safe(slug) {
            return Err(RegistryError::BadSlug(slug.to_string()));
        }
        if !entry.root.is_absolute() {
            return Err(RegistryError::RelativeRoot(entry.root));
        }
        if self.projects.contains_key(slug) {
            return Err(RegistryError::DuplicateSlug(slug.to_string()));
        }
        self.projects.insert(slug.to_string(), entry);
        Ok(())
    }

    /// Load, mutate, and save under the registry lock.
    pub fn update<T>(
        path: &Path,
        mutate: impl FnOnce(&mut ProjectRegistry) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let _guard = RegistryLockGuard::acquire(path)?;
        let mut registry = Self::load(path)?;
        let result = mutate(&mut registry)?;
        let json = serde_json::to_vec_pretty(&registry).map_err(StorageError::Serde)?;
        write_atomic(path, &json)?;
        Ok(result)
    }
}

/// Exclusive lock on `<registry>.lock`, released on drop.
struct RegistryLockGuard {
    file: std::fs::File,
}

impl RegistryLockGuard {
    fn acquire(registry_path: &Path) -> Result<Self, RegistryError> {
        let lock_path = registry_path.with_extension("json.lock");
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| RegistryError::Io {
                path: lock_path.clone(),
                source,
            })?;
        }
        let file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|source| RegistryError::Io {
                path: lock_path.clone(),
                source,
            })?;

        for attempt in 1..=LOCK_ATTEMPTS {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(Self { file }),
                Err(_) if attempt < LOCK_ATTEMPTS => std::thread::sleep(LOCK_RETRY_DELAY),
                Err(_) => break,
            }
        }
        Err(RegistryError::Busy(LOCK_ATTEMPTS))
    }
}

impl Drop for RegistryLockGuard {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
