// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;

const SCRIPT: &str = "#!/bin/sh\n# ---\n# type: agent\n# event: before-tool\n# matcher: 'Bash'\n# provider: claude-code\n# priority: 5\n# async: false\n# timeout: 10\n# ---\nexec deny-rm \"$@\"\n";

#[test]
fn parse_full_header() {
    let def = HookDef::parse(&PathBuf::from("deny-rm.sh"), SCRIPT).unwrap();
    assert_eq!(def.hook_type, HookType::Agent);
    assert_eq!(def.event, "before-tool");
    assert_eq!(def.matcher.as_deref(), Some("Bash"));
    assert_eq!(def.provider.as_deref(), Some("claude-code"));
    assert_eq!(def.priority, 5);
    assert!(!def.run_async);
    assert_eq!(def.timeout_secs, 10);
}

#[test]
fn defaults_apply_when_fields_are_omitted() {
    let script = "# ---\n# type: issue\n# event: pre-submit\n# ---\necho ok\n";
    let def = HookDef::parse(&PathBuf::from("lint.sh"), script).unwrap();
    assert_eq!(def.priority, 0);
    assert!(!def.run_async);
    assert_eq!(def.timeout_secs, 30);
    assert_eq!(def.matcher, None);
}

#[test]
fn missing_header_is_an_error() {
    let err = HookDef::parse(&PathBuf::from("x.sh"), "echo no header\n").unwrap_err();
    assert!(matches!(err, HookError::MissingHeader(_)));
}

#[test]
fn header_after_first_comment_block_is_ignored() {
    let script = "# just a comment\necho code\n# ---\n# type: issue\n# event: pre-submit\n# ---\n";
    assert!(HookDef::parse(&PathBuf::from("x.sh"), script).is_err());
}

#[test]
fn agent_hook_without_provider_is_rejected() {
    let script = "# ---\n# type: agent\n# event: before-tool\n# ---\n";
    let err = HookDef::parse(&PathBuf::from("x.sh"), script).unwrap_err();
    assert!(matches!(err, HookError::BadHeader { .. }));
}

#[test]
fn unknown_header_key_is_rejected() {
    let script = "# ---\n# type: issue\n# event: pre-submit\n# piority: 3\n# ---\n";
    assert!(HookDef::parse(&PathBuf::from("x.sh"), script).is_err());
}

#[test]
fn matches_tool_honors_glob_and_absence() {
    let def = HookDef::parse(&PathBuf::from("deny-rm.sh"), SCRIPT).unwrap();
    assert!(def.matches_tool(Some("Bash")));
    assert!(!def.matches_tool(Some("Edit")));
    // No tool in context: matcher does not exclude
    assert!(def.matches_tool(None));
}
