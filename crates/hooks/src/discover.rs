// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook discovery
//!
//! Scanned in precedence order: project-local `.monoco/hooks/`, user-global
//! `~/.config/agents/hooks/`, then the built-ins bundled with the
//! distribution. Within one event the priority field orders execution;
//! discovery order only breaks ties.

use crate::{HookDef, HookError};
use std::path::Path;

/// Scan one directory for hook files (non-recursive).
///
/// Files without a parseable header are skipped with a warning; a hooks
/// directory often carries helper scripts that are not hooks themselves.
pub fn scan_dir(dir: &Path) -> Vec<HookDef> {
    let mut hooks = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return hooks;
    };

    let mut paths: Vec<_> = entries.flatten().map(|e| e.path()).collect();
    paths.sort();

    for path in paths {
        if !path.is_file() {
            continue;
        }
        match HookDef::load(&path) {
            Ok(def) => hooks.push(def),
            Err(HookError::MissingHeader(_)) => {
                tracing::debug!(path = %path.display(), "file has no hook header, skipping");
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping malformed hook");
            }
        }
    }
    hooks
}

/// Discover hooks across the documented directory set, in precedence order.
pub fn discover_hooks(dirs: &[&Path]) -> Vec<HookDef> {
    let mut hooks = Vec::new();
    for dir in dirs {
        hooks.extend(scan_dir(dir));
    }
    hooks
}

#[cfg(test)]
#[path = "discover_tests.rs"]
mod tests;
