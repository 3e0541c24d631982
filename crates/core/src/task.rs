// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task handed to the agent scheduler

use crate::id::IssueId;
use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// A unit of agent work submitted to the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTask {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<IssueId>,
    pub prompt: String,
    /// Engine adapter name ("claude", "gemini", ...)
    pub engine: String,
    /// Wall-clock timeout in seconds; None uses the role default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl AgentTask {
    pub fn new(role: Role, engine: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            role,
            issue_id: None,
            prompt: prompt.into(),
            engine: engine.into(),
            timeout_secs: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_issue(mut self, issue_id: IssueId) -> Self {
        self.issue_id = Some(issue_id);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.role.default_timeout())
    }
}
