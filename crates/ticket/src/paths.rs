// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project directory layout
//!
//! Everything the daemon owns lives under `<root>/.monoco/`; the tracked
//! project surface (issues, memos, tasks) lives beside it.

use std::path::{Path, PathBuf};

/// Well-known paths within one project.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn monoco_dir(&self) -> PathBuf {
        self.root.join(".monoco")
    }

    pub fn config_file(&self) -> PathBuf {
        self.monoco_dir().join("config.toml")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.monoco_dir().join("sessions")
    }

    pub fn run_dir(&self) -> PathBuf {
        self.monoco_dir().join("run")
    }

    pub fn pid_file(&self) -> PathBuf {
        self.run_dir().join("monoco.pid")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.monoco_dir().join("log")
    }

    pub fn daemon_log(&self) -> PathBuf {
        self.log_dir().join("daemon.log")
    }

    pub fn session_log(&self, session_id: &str) -> PathBuf {
        self.log_dir().join(format!("session-{session_id}.log"))
    }

    pub fn worktrees_dir(&self) -> PathBuf {
        self.monoco_dir().join("worktrees")
    }

    pub fn hooks_dir(&self) -> PathBuf {
        self.monoco_dir().join("hooks")
    }

    pub fn issues_root(&self) -> PathBuf {
        self.root.join("Issues")
    }

    pub fn memo_inbox(&self) -> PathBuf {
        self.root.join("Memos").join("inbox.md")
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.root.join("tasks.md")
    }

    pub fn mailbox_root(&self) -> PathBuf {
        self.monoco_dir().join("mailbox")
    }

    pub fn mailbox_inbound(&self, provider: &str) -> PathBuf {
        self.mailbox_root().join("inbound").join(provider)
    }

    pub fn mailbox_outbound(&self, provider: &str) -> PathBuf {
        self.mailbox_root().join("outbound").join(provider)
    }

    pub fn mailbox_archive(&self, provider: &str) -> PathBuf {
        self.mailbox_root().join("archive").join(provider)
    }

    pub fn mailbox_deadletter(&self, provider: &str) -> PathBuf {
        self.mailbox_root().join(".deadletter").join(provider)
    }
}
