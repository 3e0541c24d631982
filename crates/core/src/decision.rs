// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unified hook decision protocol
//!
//! Every hook, script or LLM-driven, for tool calls or issue transitions,
//! resolves to this one shape. Provider-native decision schemas are
//! converted at the ACL boundary in monoco-hooks; the daemon never consumes
//! them directly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The terminal outcome of a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Allow,
    Deny,
    /// Escalate to an interactive prompt; degrades to deny when
    /// no interactive channel exists
    Ask,
}

/// A hook's decision, parsed from its stdout JSON or synthesized from its
/// exit code (0 = allow, 2 = deny).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookDecision {
    pub decision: Verdict,
    /// Surfaced verbatim to the caller on deny
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl HookDecision {
    pub fn allow() -> Self {
        Self {
            decision: Verdict::Allow,
            reason: None,
            message: None,
            metadata: HashMap::new(),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            decision: Verdict::Deny,
            reason: Some(reason.into()),
            message: None,
            metadata: HashMap::new(),
        }
    }

    pub fn is_deny(&self) -> bool {
        self.decision == Verdict::Deny
    }

    /// Text to inject into the agent's context window for the next turn.
    pub fn additional_context(&self) -> Option<&str> {
        self.metadata.get("additional_context")?.as_str()
    }

    /// Resolve `ask` for a non-interactive caller: deny with an explanation.
    pub fn degrade_ask(self) -> Self {
        if self.decision != Verdict::Ask {
            return self;
        }
        let why = self
            .reason
            .unwrap_or_else(|| "hook requested interactive approval".to_string());
        Self {
            decision: Verdict::Deny,
            reason: Some(format!("interactive approval unavailable: {why}")),
            message: self.message,
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
#[path = "decision_tests.rs"]
mod tests;
