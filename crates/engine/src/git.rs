// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git plumbing for issue isolation and the scoped merge
//!
//! All operations shell out to the `git` binary with timeouts; the daemon
//! never links a git library. Paths given to git are relative to the
//! project root.

use monoco_adapters::subprocess::{run_checked, run_with_timeout, GIT_TIMEOUT, GIT_WORKTREE_TIMEOUT};
use std::path::Path;
use tokio::process::Command;

fn git(root: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(root).args(args);
    cmd
}

/// First existing branch among the candidates (`main`, fallback `master`).
pub async fn detect_trunk(root: &Path, candidates: &[String]) -> Result<String, String> {
    for candidate in candidates {
        let reference = format!("refs/heads/{candidate}");
        let mut cmd = git(root, &["show-ref", "--verify", "--quiet", &reference]);
        cmd.kill_on_drop(true);
        if let Ok(output) = run_with_timeout(cmd, GIT_TIMEOUT, "git show-ref").await {
            if output.status.success() {
                return Ok(candidate.clone());
            }
        }
    }
    Err(format!("no trunk branch found among {candidates:?}"))
}

pub async fn current_branch(root: &Path) -> Result<String, String> {
    run_checked(
        git(root, &["rev-parse", "--abbrev-ref", "HEAD"]),
        GIT_TIMEOUT,
        "git rev-parse",
    )
    .await
}

pub async fn branch_exists(root: &Path, name: &str) -> bool {
    let reference = format!("refs/heads/{name}");
    let cmd = git(root, &["show-ref", "--verify", "--quiet", &reference]);
    run_with_timeout(cmd, GIT_TIMEOUT, "git show-ref")
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Create a branch off the trunk without checking it out.
pub async fn create_branch(root: &Path, name: &str, trunk: &str) -> Result<(), String> {
    run_checked(git(root, &["branch", name, trunk]), GIT_TIMEOUT, "git branch").await?;
    Ok(())
}

/// Create a worktree (with its own new branch) rooted at `path`.
pub async fn create_worktree(
    root: &Path,
    path: &Path,
    branch: &str,
    trunk: &str,
) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| format!("mkdir {}: {e}", parent.display()))?;
    }
    let path_str = path.display().to_string();
    run_checked(
        git(root, &["worktree", "add", "-b", branch, &path_str, trunk]),
        GIT_WORKTREE_TIMEOUT,
        "git worktree add",
    )
    .await?;
    Ok(())
}

pub async fn remove_worktree(root: &Path, path: &Path) -> Result<(), String> {
    let path_str = path.display().to_string();
    run_checked(
        git(root, &["worktree", "remove", "--force", &path_str]),
        GIT_WORKTREE_TIMEOUT,
        "git worktree remove",
    )
    .await?;
    Ok(())
}

pub async fn delete_branch(root: &Path, name: &str) -> Result<(), String> {
    run_checked(git(root, &["branch", "-D", name]), GIT_TIMEOUT, "git branch -D").await?;
    Ok(())
}

/// Files changed on `branch` relative to the merge base with `trunk`.
pub async fn changed_files(root: &Path, branch: &str, trunk: &str) -> Result<Vec<String>, String> {
    let range = format!("{trunk}...{branch}");
    let stdout = run_checked(
        git(root, &["diff", "--name-only", &range]),
        GIT_TIMEOUT,
        "git diff --name-only",
    )
    .await?;
    Ok(stdout.lines().map(String::from).collect())
}

async fn differs(root: &Path, a: &str, b: &str, file: &str) -> Result<bool, String> {
    let cmd = git(root, &["diff", "--quiet", a, b, "--", file]);
    let output = run_with_timeout(cmd, GIT_TIMEOUT, "git diff --quiet").await?;
    // Exit 0 = identical, 1 = differs, anything else is a real error
    match output.status.code() {
        Some(0) => Ok(false),
        Some(1) => Ok(true),
        code => Err(format!(
            "git diff --quiet {a} {b} -- {file} exited {code:?}: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )),
    }
}

/// Outcome of a conflict scan over the merge scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeScan {
    /// Files both sides changed with diverging contents
    pub conflicts: Vec<String>,
    /// Files safe to take from the branch
    pub clean: Vec<String>,
}

/// Scan the scope for conflicts without touching the tree.
///
/// A file conflicts when trunk and the branch both diverged from the merge
/// base and from each other. The scan is complete before any mutation, so a
/// conflicting close leaves trunk byte-for-byte untouched.
pub async fn scan_scope(
    root: &Path,
    branch: &str,
    trunk: &str,
    scope: &[String],
) -> Result<ScopeScan, String> {
    let base = run_checked(
        git(root, &["merge-base", trunk, branch]),
        GIT_TIMEOUT,
        "git merge-base",
    )
    .await?;

    let mut scan = ScopeScan {
        conflicts: Vec::new(),
        clean: Vec::new(),
    };
    for file in scope {
        let trunk_changed = differs(root, &base, trunk, file).await?;
        if !trunk_changed {
            scan.clean.push(file.clone());
            continue;
        }
        let still_agrees = !differs(root, trunk, branch, file).await?;
        if still_agrees {
            scan.clean.push(file.clone());
        } else {
            scan.conflicts.push(file.clone());
        }
    }
    Ok(scan)
}

/// Take one file's content from `branch` into the current checkout + index.
pub async fn checkout_file_from(root: &Path, branch: &str, file: &str) -> Result<(), String> {
    run_checked(
        git(root, &["checkout", branch, "--", file]),
        GIT_TIMEOUT,
        "git checkout --",
    )
    .await?;
    Ok(())
}

pub async fn stage(root: &Path, pathspec: &str) -> Result<(), String> {
    run_checked(git(root, &["add", "-A", "--", pathspec]), GIT_TIMEOUT, "git add").await?;
    Ok(())
}

/// Commit staged changes; a no-op when the index is clean.
pub async fn commit(root: &Path, message: &str) -> Result<(), String> {
    let probe = git(root, &["diff", "--cached", "--quiet"]);
    let staged = run_with_timeout(probe, GIT_TIMEOUT, "git diff --cached")
        .await?
        .status
        .code()
        == Some(1);
    if !staged {
        return Ok(());
    }
    run_checked(git(root, &["commit", "-m", message]), GIT_TIMEOUT, "git commit").await?;
    Ok(())
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
