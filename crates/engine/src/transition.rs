// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue transition core
//!
//! `create`, `start`, `sync-files`, `submit`, `close`, `lint`. Every
//! operation runs under a per-issue lock, traverses the hook engine at its
//! pre/post sites, and mutates the filesystem only after every precondition
//! and hook has passed. The built-in behaviors (sync-files + lint at
//! pre-submit, isolation at post-start, the scoped merge at pre-close) run
//! natively ahead of any user hook.

use crate::git;
use monoco_core::{HookDecision, IssueId};
use monoco_hooks::{HookEngine, HookSite};
use monoco_ticket::{
    find_issue, lint_issue, next_issue_id, scan_issues, Isolation, IsolationType, Issue, IssueType,
    LintViolation, ProjectConfig, ProjectPaths, Solution, Stage, Status, TicketError,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("issue not found: {0}")]
    NotFound(IssueId),

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("hook denied: {0}")]
    HookDenied(String),

    #[error("lint failed: {}", format_violations(.0))]
    Lint(Vec<LintViolation>),

    #[error("merge conflicts on {0:?}")]
    MergeConflict(Vec<String>),

    #[error("issue {0} is already closed")]
    AlreadyClosed(IssueId),

    #[error("git: {0}")]
    Git(String),

    #[error(transparent)]
    Ticket(#[from] TicketError),
}

fn format_violations(violations: &[LintViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl monoco_core::error::Classified for TransitionError {
    fn class(&self) -> monoco_core::ErrorClass {
        match self {
            TransitionError::NotFound(_) => monoco_core::ErrorClass::Validation,
            TransitionError::Precondition(_) | TransitionError::AlreadyClosed(_) => {
                monoco_core::ErrorClass::Precondition
            }
            TransitionError::HookDenied(_) => monoco_core::ErrorClass::HookDenied,
            TransitionError::Lint(_) => monoco_core::ErrorClass::Validation,
            TransitionError::MergeConflict(_) => monoco_core::ErrorClass::MergeConflict,
            TransitionError::Git(_) => monoco_core::ErrorClass::Fatal,
            TransitionError::Ticket(e) => e.class(),
        }
    }
}

/// Isolation requested by `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartMode {
    /// Work directly on the current checkout; no isolation
    Direct,
    /// New branch off trunk
    Branch,
    /// New worktree under `.monoco/worktrees/<id>/` (the default)
    #[default]
    Worktree,
}

/// The issue lifecycle state machine.
#[derive(Debug)]
pub struct TransitionCore {
    paths: ProjectPaths,
    config: ProjectConfig,
    hooks: HookEngine,
    /// Per-issue serialization; held through hooks and file operations
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl TransitionCore {
    pub fn new(paths: ProjectPaths, config: ProjectConfig, hooks: HookEngine) -> Self {
        Self {
            paths,
            config,
            hooks,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    async fn lock(&self, key: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        mutex.lock_owned().await
    }

    fn load(&self, id: &IssueId) -> Result<(PathBuf, Issue), TransitionError> {
        let path = find_issue(&self.paths.issues_root(), id)
            .ok_or_else(|| TransitionError::NotFound(id.clone()))?;
        let issue = Issue::load(&path)?;
        Ok((path, issue))
    }

    fn now() -> chrono::NaiveDateTime {
        chrono::Utc::now().naive_utc()
    }

    fn hook_payload(issue: &Issue, path: &Path) -> serde_json::Value {
        serde_json::json!({
            "id": issue.id,
            "type": issue.issue_type,
            "status": issue.status,
            "stage": issue.stage,
            "title": issue.title,
            "files": issue.files,
            "path": path,
        })
    }

    /// Run one pre-hook site; deny aborts the operation.
    async fn gate(
        &self,
        event: &str,
        issue: &Issue,
        path: &Path,
    ) -> Result<HookDecision, TransitionError> {
        let decision = self
            .hooks
            .dispatch(&HookSite::issue(event), &Self::hook_payload(issue, path))
            .await;
        if decision.is_deny() {
            return Err(TransitionError::HookDenied(
                decision.reason.clone().unwrap_or_else(|| event.to_string()),
            ));
        }
        Ok(decision)
    }

    /// Run a post-hook site; failures never abort (hooks are advisory here).
    async fn notify(&self, event: &str, issue: &Issue, path: &Path) {
        let decision = self
            .hooks
            .dispatch(&HookSite::issue(event), &Self::hook_payload(issue, path))
            .await;
        if decision.is_deny() {
            tracing::warn!(
                event,
                issue = %issue.id,
                reason = decision.reason.as_deref().unwrap_or(""),
                "post hook denied (ignored)"
            );
        }
    }

    fn known_ids(&self) -> HashSet<String> {
        scan_issues(&self.paths.issues_root())
            .into_iter()
            .map(|(_, issue)| issue.id.as_str().to_string())
            .collect()
    }

    /// Allocate the next id for the type and write the draft under `open/`.
    pub async fn create(
        &self,
        issue_type: IssueType,
        title: &str,
        body: &str,
    ) -> Result<Issue, TransitionError> {
        // Id allocation races with concurrent creates of the same type
        let _guard = self.lock(&format!("create:{}", issue_type.id_prefix())).await;

        let id = next_issue_id(&self.paths.issues_root(), issue_type);
        let mut issue = Issue::new(id, issue_type, title, Self::now());
        issue.body = body.to_string();

        let path = issue.expected_path(&self.paths.issues_root());
        self.gate("pre-create", &issue, &path).await?;
        issue.save(&path)?;

        // Post-create lint is a report, not a gate
        let violations = lint_issue(&issue, &path, &self.known_ids());
        for violation in &violations {
            tracing::warn!(issue = %issue.id, %violation, "lint (post-create)");
        }
        self.notify("post-create", &issue, &path).await;
        Ok(issue)
    }

    /// draft|todo → doing, creating the requested isolation.
    pub async fn start(&self, id: &IssueId, mode: StartMode) -> Result<Issue, TransitionError> {
        let _guard = self.lock(id.as_str()).await;
        let (path, mut issue) = self.load(id)?;

        if issue.status != Status::Open {
            return Err(TransitionError::Precondition(format!(
                "cannot start a {} issue",
                issue.status
            )));
        }
        if !matches!(issue.stage, Stage::Draft | Stage::Todo) {
            return Err(TransitionError::Precondition(format!(
                "stage transition illegal: {} -> doing",
                issue.stage
            )));
        }
        if issue.isolation.is_some() {
            return Err(TransitionError::Precondition(
                "isolation already exists".to_string(),
            ));
        }
        // Unfinished dependencies block the start
        for dep in &issue.dependencies {
            let (_, dep_issue) = self.load(dep).map_err(|_| {
                TransitionError::Precondition(format!("dependency {dep} does not exist"))
            })?;
            if dep_issue.status != Status::Closed {
                return Err(TransitionError::Precondition(format!(
                    "dependency {dep} is not closed"
                )));
            }
        }

        self.gate("pre-start", &issue, &path).await?;

        // Built-in post-start behavior: create the isolation
        let root = self.paths.root();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| id.as_str().to_lowercase());
        match mode {
            StartMode::Direct => {}
            StartMode::Branch => {
                let trunk = git::detect_trunk(root, &self.config.trunk_candidates())
                    .await
                    .map_err(TransitionError::Git)?;
                git::create_branch(root, &stem, &trunk)
                    .await
                    .map_err(TransitionError::Git)?;
                issue.isolation = Some(Isolation {
                    isolation_type: IsolationType::Branch,
                    ref_name: stem,
                    path: None,
                    created_at: Self::now(),
                });
            }
            StartMode::Worktree => {
                let trunk = git::detect_trunk(root, &self.config.trunk_candidates())
                    .await
                    .map_err(TransitionError::Git)?;
                let wt_path = self.paths.worktrees_dir().join(&stem);
                git::create_worktree(root, &wt_path, &stem, &trunk)
                    .await
                    .map_err(TransitionError::Git)?;
                issue.isolation = Some(Isolation {
                    isolation_type: IsolationType::Worktree,
                    ref_name: stem,
                    path: Some(wt_path),
                    created_at: Self::now(),
                });
            }
        }

        issue.stage = Stage::Doing;
        issue.touch(Self::now());
        issue.save(&path)?;
        self.notify("post-start", &issue, &path).await;
        Ok(issue)
    }

    fn ticket_rel_path(&self, path: &Path) -> Option<String> {
        path.strip_prefix(self.paths.root())
            .ok()
            .map(|p| p.to_string_lossy().to_string())
    }

    async fn sync_files_inner(
        &self,
        path: &Path,
        issue: &mut Issue,
    ) -> Result<Vec<String>, TransitionError> {
        let Some(isolation) = &issue.isolation else {
            return Err(TransitionError::Precondition(
                "issue has no isolation; start it first".to_string(),
            ));
        };
        let root = self.paths.root();
        let trunk = git::detect_trunk(root, &self.config.trunk_candidates())
            .await
            .map_err(TransitionError::Git)?;
        let mut files = git::changed_files(root, &isolation.ref_name, &trunk)
            .await
            .map_err(TransitionError::Git)?;

        // The ticket file is workflow metadata, never merge scope
        if let Some(own) = self.ticket_rel_path(path) {
            files.retain(|f| f != &own);
        }
        issue.files = files.clone();
        issue.touch(Self::now());
        issue.save(path)?;
        Ok(files)
    }

    /// Refresh the `files` preamble field from the branch diff.
    pub async fn sync_files(&self, id: &IssueId) -> Result<Vec<String>, TransitionError> {
        let _guard = self.lock(id.as_str()).await;
        let (path, mut issue) = self.load(id)?;
        self.sync_files_inner(&path, &mut issue).await
    }

    pub fn lint(&self, id: &IssueId) -> Result<Vec<LintViolation>, TransitionError> {
        let (path, issue) = self.load(id)?;
        Ok(lint_issue(&issue, &path, &self.known_ids()))
    }

    /// doing → review; pre-submit = sync-files + lint, then user hooks.
    pub async fn submit(&self, id: &IssueId) -> Result<Issue, TransitionError> {
        let _guard = self.lock(id.as_str()).await;
        let (path, mut issue) = self.load(id)?;

        if issue.stage != Stage::Doing {
            return Err(TransitionError::Precondition(format!(
                "stage transition illegal: {} -> review",
                issue.stage
            )));
        }

        self.sync_files_inner(&path, &mut issue).await?;

        let violations = lint_issue(&issue, &path, &self.known_ids());
        if !violations.is_empty() {
            return Err(TransitionError::Lint(violations));
        }

        self.gate("pre-submit", &issue, &path).await?;

        issue.stage = Stage::Review;
        issue.touch(Self::now());
        issue.save(&path)?;
        self.notify("post-submit", &issue, &path).await;
        Ok(issue)
    }

    /// File claims of every other active issue.
    fn foreign_claims(&self, id: &IssueId) -> HashSet<String> {
        scan_issues(&self.paths.issues_root())
            .into_iter()
            .filter(|(_, other)| other.id != *id)
            .filter(|(_, other)| {
                other.status == Status::Open
                    && matches!(other.stage, Stage::Doing | Stage::Review)
            })
            .flat_map(|(_, other)| other.files)
            .collect()
    }

    /// review → done: scoped atomic merge, directory move, prune.
    pub async fn close(
        &self,
        id: &IssueId,
        solution: Solution,
        prune: bool,
    ) -> Result<Issue, TransitionError> {
        let _guard = self.lock(id.as_str()).await;
        let (path, issue) = self.load(id)?;

        if issue.status == Status::Closed {
            return Err(TransitionError::AlreadyClosed(id.clone()));
        }
        if issue.stage != Stage::Review {
            return Err(TransitionError::Precondition(format!(
                "stage transition illegal: {} -> done",
                issue.stage
            )));
        }

        self.gate("pre-close", &issue, &path).await?;

        let root = self.paths.root();
        let isolation = issue.isolation.clone();
        if let Some(isolation) = &isolation {
            let trunk = git::detect_trunk(root, &self.config.trunk_candidates())
                .await
                .map_err(TransitionError::Git)?;
            let on = git::current_branch(root).await.map_err(TransitionError::Git)?;
            if on != trunk {
                return Err(TransitionError::Precondition(format!(
                    "project checkout is on {on}, not trunk {trunk}"
                )));
            }

            // Built-in pre-close behavior: the scoped merge. Scope is the
            // issue's files minus other active issues' claims minus the
            // ticket file itself.
            let claims = self.foreign_claims(id);
            let own = self.ticket_rel_path(&path);
            let scope: Vec<String> = issue
                .files
                .iter()
                .filter(|f| !claims.contains(*f))
                .filter(|f| Some(*f) != own.as_ref())
                .cloned()
                .collect();

            let scan = git::scan_scope(root, &isolation.ref_name, &trunk, &scope)
                .await
                .map_err(TransitionError::Git)?;
            if !scan.conflicts.is_empty() {
                // Whole-merge abort: nothing was written, trunk is untouched
                return Err(TransitionError::MergeConflict(scan.conflicts));
            }
            for file in &scan.clean {
                git::checkout_file_from(root, &isolation.ref_name, file)
                    .await
                    .map_err(TransitionError::Git)?;
            }
            // The ticket itself is always taken from the branch; its merge
            // conflicts are meaningless (workflow metadata, not code)
            if let Some(own) = &own {
                let _ = git::checkout_file_from(root, &isolation.ref_name, own).await;
            }
        }

        // Reload: the checkout above may have replaced the ticket contents.
        // The files list survives from the submit-time sync; the branch copy
        // may predate it.
        let files_at_close = issue.files.clone();
        let mut issue = Issue::load(&path)?;
        issue.files = files_at_close;
        issue.status = Status::Closed;
        issue.stage = Stage::Done;
        issue.solution = Some(solution);
        issue.touch(Self::now());

        let new_path = issue.expected_path(&self.paths.issues_root());
        issue.save(&new_path)?;
        if new_path != path {
            std::fs::remove_file(&path).map_err(|source| TicketError::Io {
                path: path.clone(),
                source,
            })?;
        }

        git::stage(root, "Issues").await.map_err(TransitionError::Git)?;
        if let Some(isolation) = &isolation {
            for file in &issue.files {
                let _ = git::stage(root, file).await;
            }
            git::commit(root, &format!("Close {id} ({})", solution_name(solution)))
                .await
                .map_err(TransitionError::Git)?;

            if prune {
                if let Some(wt_path) = &isolation.path {
                    git::remove_worktree(root, wt_path)
                        .await
                        .map_err(TransitionError::Git)?;
                }
                git::delete_branch(root, &isolation.ref_name)
                    .await
                    .map_err(TransitionError::Git)?;
            }
        } else {
            git::commit(root, &format!("Close {id} ({})", solution_name(solution)))
                .await
                .map_err(TransitionError::Git)?;
        }

        self.notify("post-close", &issue, &new_path).await;
        Ok(issue)
    }
}

fn solution_name(solution: Solution) -> &'static str {
    match solution {
        Solution::Implemented => "implemented",
        Solution::Cancelled => "cancelled",
        Solution::Wontfix => "wontfix",
        Solution::Duplicate => "duplicate",
    }
}

#[cfg(test)]
#[path = "transition_tests.rs"]
mod tests;
