// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git hook installation
//!
//! The daemon intercepts the git lifecycle through real scripts in
//! `.git/hooks/` that shell back into the CLI (`monoco hook run git ...`).
//! Each stub is marked so reinstallation replaces our scripts but never a
//! hand-written hook.

use crate::HookError;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Git events the engine intercepts.
pub const GIT_HOOKS: [&str; 5] = [
    "pre-commit",
    "prepare-commit-msg",
    "commit-msg",
    "post-merge",
    "pre-push",
];

const MARKER: &str = "# installed by monoco";

fn render_stub(event: &str) -> String {
    format!(
        "#!/bin/sh\n{MARKER}\nexec monoco hook run git {event} \"$@\"\n"
    )
}

/// Write the git hook stubs under `<root>/.git/hooks/`.
///
/// Returns the hook names installed. A pre-existing hook that is not ours
/// is left untouched (and reported by the caller's logs, not clobbered).
pub fn install_git_hooks(root: &Path) -> Result<Vec<&'static str>, HookError> {
    let hooks_dir = root.join(".git").join("hooks");
    std::fs::create_dir_all(&hooks_dir).map_err(|source| HookError::Io {
        path: hooks_dir.clone(),
        source,
    })?;

    let mut installed = Vec::new();
    for event in GIT_HOOKS {
        let path = hooks_dir.join(event);
        if path.exists() {
            let existing = std::fs::read_to_string(&path).unwrap_or_default();
            if !existing.contains(MARKER) {
                tracing::warn!(path = %path.display(), "foreign git hook present, not replacing");
                continue;
            }
        }
        std::fs::write(&path, render_stub(event)).map_err(|source| HookError::Io {
            path: path.clone(),
            source,
        })?;
        let mut perms = std::fs::metadata(&path)
            .map_err(|source| HookError::Io {
                path: path.clone(),
                source,
            })?
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).map_err(|source| HookError::Io {
            path,
            source,
        })?;
        installed.push(event);
    }
    Ok(installed)
}

#[cfg(test)]
#[path = "install_tests.rs"]
mod tests;
