// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders shared across the workspace (behind `test-support`).

use crate::id::SessionId;
use crate::role::Role;
use crate::session::{AgentSession, SessionMode, SessionState};
use std::collections::HashMap;
use std::path::PathBuf;

/// A pending session with sensible defaults for tests.
pub fn session(id: &str, role: Role) -> AgentSession {
    AgentSession {
        session_id: SessionId::new(id),
        role,
        issue_id: None,
        state: SessionState::Pending,
        pid: None,
        started_at: 1_000_000,
        finished_at: None,
        exit_code: None,
        log_path: PathBuf::from(format!("/tmp/monoco-test/{id}.log")),
        engine: "fake".to_string(),
        timeout: 900,
        metadata: HashMap::new(),
        mode: SessionMode::Observer,
    }
}
