// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent engine adapters
//!
//! An engine is the external LLM-backed CLI the scheduler spawns (Claude,
//! Gemini, Qwen, Kimi, ...). Each adapter knows how to turn an `AgentTask`
//! into a concrete argv and environment; the scheduler owns the process
//! itself. Engines are discovered by name; an unknown name is a scheduling
//! failure, not a panic.

mod claude;
mod gemini;
mod kimi;
mod qwen;

pub use claude::ClaudeEngine;
pub use gemini::GeminiEngine;
pub use kimi::KimiEngine;
pub use qwen::QwenEngine;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeEngineAdapter;

use monoco_core::{AgentTask, SessionId};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors from engine resolution and command assembly
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown engine: {0}")]
    UnknownEngine(String),

    #[error("engine {engine} cannot run task: {message}")]
    BadTask { engine: String, message: String },
}

/// A fully assembled command: program, argv, and extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Adapter for one agent CLI family.
pub trait EngineAdapter: Send + Sync {
    /// Name the scheduler resolves this engine by.
    fn name(&self) -> &str;

    /// Assemble the command for one task. The session id doubles as the
    /// engine-side session handle where the CLI supports one.
    fn build_command(
        &self,
        task: &AgentTask,
        session_id: &SessionId,
    ) -> Result<CommandSpec, EngineError>;
}

/// Forward an authentication variable from the daemon's environment, never
/// fabricating a value the user did not set.
pub(crate) fn forward_env(spec: CommandSpec, key: &str) -> CommandSpec {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => spec.env(key, value),
        _ => spec,
    }
}

/// Engines discovered by name.
#[derive(Clone, Default)]
pub struct EngineRegistry {
    engines: HashMap<String, Arc<dyn EngineAdapter>>,
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.engines.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The engines shipped with the distribution.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ClaudeEngine));
        registry.register(Arc::new(GeminiEngine));
        registry.register(Arc::new(QwenEngine));
        registry.register(Arc::new(KimiEngine));
        registry
    }

    /// Register an engine; a later registration under the same name wins.
    pub fn register(&mut self, engine: Arc<dyn EngineAdapter>) {
        self.engines.insert(engine.name().to_string(), engine);
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn EngineAdapter>, EngineError> {
        self.engines
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownEngine(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.engines.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
