// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kimi CLI engine adapter

use super::{forward_env, CommandSpec, EngineAdapter, EngineError};
use monoco_core::{AgentTask, SessionId};

pub struct KimiEngine;

impl EngineAdapter for KimiEngine {
    fn name(&self) -> &str {
        "kimi"
    }

    fn build_command(
        &self,
        task: &AgentTask,
        session_id: &SessionId,
    ) -> Result<CommandSpec, EngineError> {
        if task.prompt.trim().is_empty() {
            return Err(EngineError::BadTask {
                engine: self.name().to_string(),
                message: "empty prompt".to_string(),
            });
        }

        let spec = CommandSpec::new("kimi")
            .arg("--print")
            .arg(&task.prompt)
            .env("MONOCO_SESSION_ID", session_id.as_str());
        Ok(forward_env(spec, "MOONSHOT_API_KEY"))
    }
}
