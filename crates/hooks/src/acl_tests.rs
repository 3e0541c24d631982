// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    claude_pre = { "claude-code", "before-tool", "PreToolUse" },
    claude_prompt = { "claude-code", "before-agent", "UserPromptSubmit" },
    claude_failure = { "claude-code", "tool-failed", "PostToolUseFailure" },
    gemini_pre = { "gemini-cli", "before-tool", "BeforeTool" },
    gemini_agent = { "gemini-cli", "before-agent", "BeforeAgent" },
)]
fn unified_to_native(provider: &str, unified: &str, native: &str) {
    assert_eq!(to_native_event(provider, unified), Some(native));
}

#[test]
fn every_unified_event_maps_for_both_providers() {
    for provider in ["claude-code", "gemini-cli"] {
        for unified in UNIFIED_EVENTS {
            let native = to_native_event(provider, unified)
                .unwrap_or_else(|| panic!("{provider} missing {unified}"));
            assert_eq!(
                to_unified_event(provider, native),
                Some(unified),
                "{provider} {native} must round-trip"
            );
        }
    }
}

#[test]
fn legacy_failure_spelling_is_canonicalized() {
    assert_eq!(
        to_native_event("claude-code", "post-tool-call-failure"),
        Some("PostToolUseFailure")
    );
    assert_eq!(
        to_unified_event("claude-code", "post-tool-call-failure"),
        Some("tool-failed")
    );
}

#[test]
fn unknown_provider_maps_nothing() {
    assert_eq!(to_native_event("vscode", "before-tool"), None);
}

#[test]
fn claude_decision_conversion_round_trips() {
    let native = serde_json::json!({
        "permissionDecision": "deny",
        "permissionDecisionReason": "protected path",
        "additionalContext": "trunk is frozen this week",
    });
    let decision = from_native_decision("claude-code", &native);
    assert!(decision.is_deny());
    assert_eq!(decision.reason.as_deref(), Some("protected path"));
    assert_eq!(
        decision.additional_context(),
        Some("trunk is frozen this week")
    );

    let back = to_native_decision("claude-code", &decision);
    assert_eq!(back, native);
}

#[test]
fn gemini_block_is_deny() {
    let native = serde_json::json!({ "decision": "block", "reason": "no" });
    let decision = from_native_decision("gemini-cli", &native);
    assert!(decision.is_deny());
}

#[test]
fn silent_provider_payload_is_allow() {
    let decision = from_native_decision("claude-code", &serde_json::json!({}));
    assert_eq!(decision, monoco_core::HookDecision::allow());
}
