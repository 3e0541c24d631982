// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use monoco_core::Verdict;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

fn write_script(dir: &Path, name: &str, header: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let script = format!("#!/bin/sh\n{header}{body}\n");
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn issue_header(event: &str, priority: i32, run_async: bool, timeout: u64) -> String {
    format!(
        "# ---\n# type: issue\n# event: {event}\n# priority: {priority}\n# async: {run_async}\n# timeout: {timeout}\n# ---\n"
    )
}

fn engine_from(dir: &Path) -> HookEngine {
    HookEngine::new(crate::discover::scan_dir(dir))
}

#[tokio::test]
async fn empty_chain_allows() {
    let engine = HookEngine::new(Vec::new());
    let decision = engine
        .dispatch(&HookSite::issue("pre-submit"), &serde_json::json!({}))
        .await;
    assert_eq!(decision.decision, Verdict::Allow);
}

#[tokio::test]
async fn exit_zero_allows_exit_two_denies() {
    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "deny.sh",
        &issue_header("pre-close", 0, false, 10),
        "echo nope >&2; exit 2",
    );
    write_script(
        dir.path(),
        "allow.sh",
        &issue_header("pre-submit", 0, false, 10),
        "exit 0",
    );
    let engine = engine_from(dir.path());

    let allowed = engine
        .dispatch(&HookSite::issue("pre-submit"), &serde_json::json!({}))
        .await;
    assert_eq!(allowed.decision, Verdict::Allow);

    let denied = engine
        .dispatch(&HookSite::issue("pre-close"), &serde_json::json!({}))
        .await;
    assert!(denied.is_deny());
    assert_eq!(denied.reason.as_deref(), Some("nope"));
}

#[tokio::test]
async fn stdout_json_overrides_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "json.sh",
        &issue_header("pre-submit", 0, false, 10),
        r#"echo '{"decision": "deny", "reason": "from json"}'; exit 0"#,
    );
    let engine = engine_from(dir.path());

    let decision = engine
        .dispatch(&HookSite::issue("pre-submit"), &serde_json::json!({}))
        .await;
    assert!(decision.is_deny());
    assert_eq!(decision.reason.as_deref(), Some("from json"));
}

#[tokio::test]
async fn priority_orders_the_chain() {
    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "a-low.sh",
        &issue_header("pre-submit", 0, false, 10),
        "echo low >&2; exit 2",
    );
    write_script(
        dir.path(),
        "b-high.sh",
        &issue_header("pre-submit", 10, false, 10),
        "echo high >&2; exit 2",
    );
    let engine = engine_from(dir.path());

    let decision = engine
        .dispatch(&HookSite::issue("pre-submit"), &serde_json::json!({}))
        .await;
    // The priority-10 hook runs first and short-circuits the chain
    assert_eq!(decision.reason.as_deref(), Some("high"));
}

#[tokio::test]
async fn payload_arrives_on_stdin() {
    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "read.sh",
        &issue_header("pre-submit", 0, false, 10),
        // Deny with the payload's issue id as the reason
        r#"id=$(cat | sed 's/.*"id":"\([^"]*\)".*/\1/'); echo "$id" >&2; exit 2"#,
    );
    let engine = engine_from(dir.path());

    let decision = engine
        .dispatch(
            &HookSite::issue("pre-submit"),
            &serde_json::json!({"id": "FEAT-0042"}),
        )
        .await;
    assert_eq!(decision.reason.as_deref(), Some("FEAT-0042"));
}

#[tokio::test]
async fn timeout_is_deny() {
    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "slow.sh",
        &issue_header("pre-submit", 0, false, 1),
        "sleep 30",
    );
    let engine = engine_from(dir.path());

    let decision = engine
        .dispatch(&HookSite::issue("pre-submit"), &serde_json::json!({}))
        .await;
    assert!(decision.is_deny());
    assert_eq!(decision.reason.as_deref(), Some("hook timeout"));
}

#[tokio::test]
async fn async_hook_does_not_affect_the_decision() {
    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "bg.sh",
        &issue_header("post-submit", 0, true, 10),
        "exit 2",
    );
    let engine = engine_from(dir.path());

    let decision = engine
        .dispatch(&HookSite::issue("post-submit"), &serde_json::json!({}))
        .await;
    assert_eq!(decision.decision, Verdict::Allow);
}

#[tokio::test]
async fn ask_degrades_to_deny_when_non_interactive() {
    let dir = tempfile::tempdir().unwrap();
    write_script(
        dir.path(),
        "ask.sh",
        &issue_header("pre-close", 0, false, 10),
        r#"echo '{"decision": "ask", "reason": "wide merge"}'; exit 0"#,
    );
    let engine = engine_from(dir.path());

    let decision = engine
        .dispatch(&HookSite::issue("pre-close"), &serde_json::json!({}))
        .await;
    assert!(decision.is_deny());
    assert!(decision.reason.unwrap().contains("wide merge"));
}

#[tokio::test]
async fn matcher_limits_agent_hooks_to_their_tool() {
    let dir = tempfile::tempdir().unwrap();
    let header = "# ---\n# type: agent\n# event: before-tool\n# matcher: 'Bash'\n# provider: claude-code\n# ---\n";
    write_script(dir.path(), "guard.sh", header, "echo blocked >&2; exit 2");
    let engine = engine_from(dir.path());

    let denied = engine
        .dispatch(
            &HookSite::agent("before-tool", "claude-code", Some("Bash")),
            &serde_json::json!({}),
        )
        .await;
    assert!(denied.is_deny());

    let allowed = engine
        .dispatch(
            &HookSite::agent("before-tool", "claude-code", Some("Edit")),
            &serde_json::json!({}),
        )
        .await;
    assert_eq!(allowed.decision, Verdict::Allow);

    // Another provider's hooks never fire
    let other = engine
        .dispatch(
            &HookSite::agent("before-tool", "gemini-cli", Some("Bash")),
            &serde_json::json!({}),
        )
        .await;
    assert_eq!(other.decision, Verdict::Allow);
}

#[tokio::test]
async fn missing_script_fails_closed() {
    let def = crate::HookDef {
        hook_type: crate::HookType::Issue,
        event: "pre-submit".to_string(),
        matcher: None,
        provider: None,
        priority: 0,
        run_async: false,
        timeout_secs: 5,
        path: PathBuf::from("/nonexistent/hook.sh"),
    };
    let engine = HookEngine::new(vec![def]);

    let decision = engine
        .dispatch(&HookSite::issue("pre-submit"), &serde_json::json!({}))
        .await;
    assert!(decision.is_deny());
    assert!(decision.reason.unwrap().contains("failed to run"));
}
