// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent session records
//!
//! A session mirrors one agent run. The in-memory object is a cache of the
//! JSON file under `.monoco/sessions/`; the file is the source of truth.

use crate::id::{IssueId, SessionId};
use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Session lifecycle state. Terminal states are monotone: once reached, no
/// transition back to `Pending`/`Running` is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Pending,
    Running,
    Completed,
    Failed,
    Terminated,
    Timeout,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionState::Pending | SessionState::Running)
    }

    /// Whether a transition to `next` preserves monotonicity.
    pub fn can_transition(self, next: SessionState) -> bool {
        match self {
            SessionState::Pending => next != SessionState::Pending,
            SessionState::Running => next.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Pending => "pending",
            SessionState::Running => "running",
            SessionState::Completed => "completed",
            SessionState::Failed => "failed",
            SessionState::Terminated => "terminated",
            SessionState::Timeout => "timeout",
        };
        write!(f, "{s}")
    }
}

/// Whether this process owns the agent's child handle.
///
/// Never serialized: a record loaded from disk is always an observer until
/// the owning scheduler says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// This daemon spawned the agent and owns termination
    Owner,
    /// Loaded from disk; queries limited to pid liveness
    #[default]
    Observer,
}

/// Record of one agent run, mirrored to `.monoco/sessions/<id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSession {
    pub session_id: SessionId,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<IssueId>,
    pub state: SessionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Epoch milliseconds
    pub started_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub log_path: PathBuf,
    pub engine: String,
    /// Wall-clock timeout in seconds
    pub timeout: u64,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    #[serde(skip)]
    pub mode: SessionMode,
}

impl AgentSession {
    /// Apply a state transition, enforcing monotonicity.
    ///
    /// Returns false (and leaves the record untouched) when the transition
    /// would move a terminal session backwards.
    pub fn transition(&mut self, next: SessionState, at_ms: u64) -> bool {
        if !self.state.can_transition(next) {
            return false;
        }
        self.state = next;
        if next.is_terminal() {
            self.finished_at = Some(at_ms);
        }
        true
    }

    pub fn is_active(&self) -> bool {
        !self.state.is_terminal()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
