// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake engine adapter for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{CommandSpec, EngineAdapter, EngineError};
use monoco_core::{AgentTask, SessionId};
use parking_lot::Mutex;
use std::sync::Arc;

/// Behavior of the fake agent process.
#[derive(Debug, Clone)]
enum Script {
    /// Exit immediately with the given code
    Exit(i32),
    /// Sleep for the given seconds, then exit 0
    Sleep(u64),
    /// Sleep forever (until killed)
    Hang,
}

/// An engine whose "agent" is `/bin/sh` running a tiny script.
///
/// The scheduler exercises real process supervision (spawn, exit codes,
/// timeouts, SIGTERM) without any LLM CLI installed. Every build_command
/// call is recorded for assertions.
#[derive(Clone)]
pub struct FakeEngineAdapter {
    script: Script,
    calls: Arc<Mutex<Vec<AgentTask>>>,
}

impl FakeEngineAdapter {
    /// Agent exits 0 after echoing its prompt.
    pub fn succeeding() -> Self {
        Self {
            script: Script::Exit(0),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Agent exits with the given non-zero code.
    pub fn failing(code: i32) -> Self {
        Self {
            script: Script::Exit(code),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Agent sleeps before exiting 0, for quota and supervision tests.
    pub fn sleeping(secs: u64) -> Self {
        Self {
            script: Script::Sleep(secs),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Agent never exits on its own, for timeout and terminate tests.
    pub fn hanging() -> Self {
        Self {
            script: Script::Hang,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Tasks this engine has assembled commands for.
    pub fn calls(&self) -> Vec<AgentTask> {
        self.calls.lock().clone()
    }
}

impl EngineAdapter for FakeEngineAdapter {
    fn name(&self) -> &str {
        "fake"
    }

    fn build_command(
        &self,
        task: &AgentTask,
        _session_id: &SessionId,
    ) -> Result<CommandSpec, EngineError> {
        self.calls.lock().push(task.clone());

        let body = match self.script {
            Script::Exit(code) => format!("echo \"$MONOCO_PROMPT\"; exit {code}"),
            Script::Sleep(secs) => format!("sleep {secs}"),
            Script::Hang => "sleep 86400".to_string(),
        };
        Ok(CommandSpec::new("/bin/sh")
            .arg("-c")
            .arg(body)
            .env("MONOCO_PROMPT", &task.prompt))
    }
}
