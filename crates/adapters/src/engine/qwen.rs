// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Qwen Code engine adapter

use super::{forward_env, CommandSpec, EngineAdapter, EngineError};
use monoco_core::{AgentTask, SessionId};

/// Qwen Code shares the Gemini CLI flag surface.
pub struct QwenEngine;

impl EngineAdapter for QwenEngine {
    fn name(&self) -> &str {
        "qwen"
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

        let spec = CommandSpec::new("qwen")
            .arg("--prompt")
            .arg(&task.prompt)
            .arg("--yolo")
            .env("MONOCO_SESSION_ID", session_id.as_str());
        Ok(forward_env(spec, "DASHSCOPE_API_KEY"))
    }
}
