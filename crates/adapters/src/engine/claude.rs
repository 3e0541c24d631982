// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Claude Code engine adapter

use super::{forward_env, CommandSpec, EngineAdapter, EngineError};
use monoco_core::{AgentTask, SessionId};

/// Headless `claude` invocation.
///
/// The prompt travels as an argument to `-p` (print mode), the session id
/// becomes Claude's own `--session-id` so hook callbacks can name it, and
/// permission prompts are skipped; the hook engine is the policy layer, not
/// the CLI's interactive dialog.
pub struct ClaudeEngine;

impl EngineAdapter for ClaudeEngine {
    fn name(&self) -> &str {
        "claude"
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

        let spec = CommandSpec::new("claude")
            .arg("-p")
            .arg(&task.prompt)
            .arg("--session-id")
            .arg(session_id.as_str())
            .arg("--output-format")
            .arg("text")
            .arg("--dangerously-skip-permissions");

        // Auth for headless/CI environments where interactive login is
        // impossible; forwarded only when the user set them.
        let spec = forward_env(spec, "CLAUDE_CODE_OAUTH_TOKEN");
        let spec = forward_env(spec, "ANTHROPIC_API_KEY");
        Ok(spec)
    }
}

#[cfg(test)]
#[path = "claude_tests.rs"]
mod tests;
