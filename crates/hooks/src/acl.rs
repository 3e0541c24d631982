// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider anti-corruption layer
//!
//! Each agent provider has its own hook event names and decision schema.
//! This module is the only place that knows them; everything inward speaks
//! the unified names and `HookDecision`.

use monoco_core::{HookDecision, Verdict};
use std::collections::HashMap;

/// Unified event names the rest of the system uses.
pub const UNIFIED_EVENTS: [&str; 7] = [
    "before-tool",
    "after-tool",
    "tool-failed",
    "session-start",
    "session-end",
    "before-agent",
    "after-agent",
];

/// Accepted spelling variants of unified names (legacy sources disagree).
fn canonicalize(unified: &str) -> &str {
    match unified {
        "post-tool-call-failure" => "tool-failed",
        other => other,
    }
}

/// Translate a unified event name into a provider's native one.
pub fn to_native_event(provider: &str, unified: &str) -> Option<&'static str> {
    let unified = canonicalize(unified);
    match provider {
        "claude-code" => match unified {
            "before-tool" => Some("PreToolUse"),
            "after-tool" => Some("PostToolUse"),
            "tool-failed" => Some("PostToolUseFailure"),
            "session-start" => Some("SessionStart"),
            "session-end" => Some("SessionEnd"),
            "before-agent" => Some("UserPromptSubmit"),
            "after-agent" => Some("Stop"),
            _ => None,
        },
        "gemini-cli" => match unified {
            "before-tool" => Some("BeforeTool"),
            "after-tool" => Some("AfterTool"),
            "tool-failed" => Some("ToolFailed"),
            "session-start" => Some("SessionStart"),
            "session-end" => Some("SessionEnd"),
            "before-agent" => Some("BeforeAgent"),
            "after-agent" => Some("AfterAgent"),
            _ => None,
        },
        _ => None,
    }
}

/// Translate a provider's native event name into the unified one.
pub fn to_unified_event(provider: &str, native: &str) -> Option<&'static str> {
    match provider {
        "claude-code" => match native {
            "PreToolUse" => Some("before-tool"),
            "PostToolUse" => Some("after-tool"),
            // Both spellings appear in the wild; one canonical mapping
            "PostToolUseFailure" | "post-tool-call-failure" => Some("tool-failed"),
            "SessionStart" => Some("session-start"),
            "SessionEnd" => Some("session-end"),
            "UserPromptSubmit" => Some("before-agent"),
            "Stop" => Some("after-agent"),
            _ => None,
        },
        "gemini-cli" => match native {
            "BeforeTool" => Some("before-tool"),
            "AfterTool" => Some("after-tool"),
            "ToolFailed" => Some("tool-failed"),
            "SessionStart" => Some("session-start"),
            "SessionEnd" => Some("session-end"),
            "BeforeAgent" => Some("before-agent"),
            "AfterAgent" => Some("after-agent"),
            _ => None,
        },
        _ => None,
    }
}

/// Convert a provider-native decision payload into the unified protocol.
///
/// Unknown providers or unrecognized payloads default to allow; a provider
/// that says nothing has decided nothing.
pub fn from_native_decision(provider: &str, native: &serde_json::Value) -> HookDecision {
    match provider {
        "claude-code" => {
            let verdict = match native
                .get("permissionDecision")
                .and_then(|v| v.as_str())
                .unwrap_or("allow")
            {
                "deny" => Verdict::Deny,
                "ask" => Verdict::Ask,
                _ => Verdict::Allow,
            };
            let reason = native
                .get("permissionDecisionReason")
                .and_then(|v| v.as_str())
                .map(String::from);
            let mut metadata = HashMap::new();
            if let Some(ctx) = native.get("additionalContext") {
                metadata.insert("additional_context".to_string(), ctx.clone());
            }
            HookDecision {
                decision: verdict,
                reason,
                message: None,
                metadata,
            }
        }
        "gemini-cli" => {
            let verdict = match native.get("decision").and_then(|v| v.as_str()) {
                Some("deny") | Some("block") => Verdict::Deny,
                Some("ask") => Verdict::Ask,
                _ => Verdict::Allow,
            };
            HookDecision {
                decision: verdict,
                reason: native
                    .get("reason")
                    .and_then(|v| v.as_str())
                    .map(String::from),
                message: native
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(String::from),
                metadata: HashMap::new(),
            }
        }
        _ => HookDecision::allow(),
    }
}

/// Convert a unified decision into the provider's native payload.
pub fn to_native_decision(provider: &str, decision: &HookDecision) -> serde_json::Value {
    match provider {
        "claude-code" => {
            let verdict = match decision.decision {
                Verdict::Allow => "allow",
                Verdict::Deny => "deny",
                Verdict::Ask => "ask",
            };
            let mut out = serde_json::json!({ "permissionDecision": verdict });
            if let Some(reason) = &decision.reason {
                out["permissionDecisionReason"] = serde_json::json!(reason);
            }
            if let Some(ctx) = decision.metadata.get("additional_context") {
                out["additionalContext"] = ctx.clone();
            }
            out
        }
        _ => {
            // Gemini's schema matches the unified one closely enough to be
            // the generic fallback
            let verdict = match decision.decision {
                Verdict::Allow => "allow",
                Verdict::Deny => "deny",
                Verdict::Ask => "ask",
            };
            let mut out = serde_json::json!({ "decision": verdict });
            if let Some(reason) = &decision.reason {
                out["reason"] = serde_json::json!(reason);
            }
            out
        }
    }
}

#[cfg(test)]
#[path = "acl_tests.rs"]
mod tests;
