// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gemini CLI engine adapter

use super::{forward_env, CommandSpec, EngineAdapter, EngineError};
use monoco_core::{AgentTask, SessionId};

/// Headless `gemini` invocation. Gemini has no session-id flag; the session
/// id rides along as an environment variable for its hooks bridge.
pub struct GeminiEngine;

impl EngineAdapter for GeminiEngine {
    fn name(&self) -> &str {
        "gemini"
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

        let spec = CommandSpec::new("gemini")
            .arg("--prompt")
            .arg(&task.prompt)
            .arg("--yolo")
            .env("MONOCO_SESSION_ID", session_id.as_str());
        Ok(forward_env(spec, "GEMINI_API_KEY"))
    }
}
