// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use monoco_adapters::{EngineRegistry, FakeEngineAdapter};
use monoco_engine::SchedulerConfig;
use monoco_hooks::HookEngine;
use monoco_ticket::ProjectConfig;
use tower::ServiceExt;

struct Fixture {
    _tmp: tempfile::TempDir,
    app: Router,
    paths: ProjectPaths,
    bus: EventBus<SystemClock>,
}

fn fixture() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let paths = ProjectPaths::new(tmp.path());

    let bus = EventBus::new(SystemClock);
    let mut engines = EngineRegistry::new();
    engines.register(std::sync::Arc::new(FakeEngineAdapter::succeeding()));
    let scheduler = AgentScheduler::new(
        SchedulerConfig::new(
            paths.sessions_dir(),
            paths.log_dir(),
            paths.root().to_path_buf(),
        ),
        engines,
        SystemClock,
        bus.ingest_sender(),
    );
    let transitions = Arc::new(TransitionCore::new(
        paths.clone(),
        ProjectConfig::default(),
        HookEngine::default(),
    ));
    let mailbox = Mailbox::new(paths.clone(), Default::default());

    let state = Arc::new(AppState {
        bus: bus.clone(),
        scheduler,
        transitions,
        mailbox,
        paths: paths.clone(),
        slug: Some("acme".to_string()),
    });
    Fixture {
        _tmp: tmp,
        app: router(state),
        paths,
        bus,
    }
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn create_then_list_issues() {
    let f = fixture();

    let (status, created) = call(
        &f.app,
        "POST",
        "/api/v1/issues",
        Some(serde_json::json!({"type": "feature", "title": "Add rate limit"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], "FEAT-0001");
    assert_eq!(created["stage"], "draft");

    let (status, list) = call(&f.app, "GET", "/api/v1/issues", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn archived_issues_are_hidden_from_list() {
    let f = fixture();
    call(
        &f.app,
        "POST",
        "/api/v1/issues",
        Some(serde_json::json!({"type": "fix", "title": "old"})),
    )
    .await;

    // Move the ticket to archived/<year>/ by hand
    let open = f.paths.issues_root().join("Fixes/open/FIX-0001-old.md");
    let text = std::fs::read_to_string(&open)
        .unwrap()
        .replace("status: open", "status: archived");
    let archived = f.paths.issues_root().join("Fixes/archived/2026/FIX-0001-old.md");
    std::fs::create_dir_all(archived.parent().unwrap()).unwrap();
    std::fs::write(&archived, text).unwrap();
    std::fs::remove_file(&open).unwrap();

    let (_, list) = call(&f.app, "GET", "/api/v1/issues", None).await;
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn patch_content_is_lint_gated() {
    let f = fixture();
    call(
        &f.app,
        "POST",
        "/api/v1/issues",
        Some(serde_json::json!({"type": "feature", "title": "demo"})),
    )
    .await;

    let path = f.paths.issues_root().join("Features/open/FEAT-0001-demo.md");
    let good = std::fs::read_to_string(&path)
        .unwrap()
        .replace("title: demo", "title: renamed");
    let (status, _) = call(
        &f.app,
        "PATCH",
        "/api/v1/issues/FEAT-0001/content",
        Some(serde_json::json!({"content": good})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // A solution on an open issue violates lint; the write is rejected
    let bad = std::fs::read_to_string(&path)
        .unwrap()
        .replace("solution: null", "solution: implemented");
    let (status, body) = call(
        &f.app,
        "PATCH",
        "/api/v1/issues/FEAT-0001/content",
        Some(serde_json::json!({"content": bad})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("solution"));
    assert!(!std::fs::read_to_string(&path).unwrap().contains("implemented"));
}

#[tokio::test]
async fn patch_unknown_issue_is_404() {
    let f = fixture();
    let (status, _) = call(
        &f.app,
        "PATCH",
        "/api/v1/issues/FEAT-0099/content",
        Some(serde_json::json!({"content": "---\n---\n"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn webhook_writes_inbound_file() {
    let f = fixture();
    let (status, body) = call(
        &f.app,
        "POST",
        "/api/v1/courier/webhook/dingtalk/acme",
        Some(serde_json::json!({
            "id": "m1",
            "session_id": "chat-7",
            "from": "alice",
            "text": "/deploy please",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let path = std::path::PathBuf::from(body["path"].as_str().unwrap());
    assert!(path.starts_with(f.paths.mailbox_inbound("dingtalk")));
    let message = monoco_ticket::MailMessage::load(&path).unwrap();
    assert_eq!(message.session.id, "chat-7");
    assert_eq!(message.body.trim(), "/deploy please");
}

#[tokio::test]
async fn webhook_rejects_foreign_slug() {
    let f = fixture();
    let (status, _) = call(
        &f.app,
        "POST",
        "/api/v1/courier/webhook/dingtalk/other",
        Some(serde_json::json!({"id": "m1", "session_id": "s", "text": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mailbox_claim_done_fail_over_http() {
    let f = fixture();
    call(
        &f.app,
        "POST",
        "/api/v1/courier/webhook/dingtalk/acme",
        Some(serde_json::json!({"id": "m1", "session_id": "s", "text": "hello"})),
    )
    .await;

    let (status, _) = call(
        &f.app,
        "POST",
        "/api/v1/mailbox/m1/claim",
        Some(serde_json::json!({"claimer": "agent-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Competing claim conflicts
    let (status, _) = call(
        &f.app,
        "POST",
        "/api/v1/mailbox/m1/claim",
        Some(serde_json::json!({"claimer": "agent-2"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &f.app,
        "POST",
        "/api/v1/mailbox/m1/fail",
        Some(serde_json::json!({"claimer": "agent-1", "reason": "busy"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &f.app,
        "POST",
        "/api/v1/mailbox/m1/claim",
        Some(serde_json::json!({"claimer": "agent-2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &f.app,
        "POST",
        "/api/v1/mailbox/m1/done",
        Some(serde_json::json!({"claimer": "agent-2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let archived = std::path::PathBuf::from(body["path"].as_str().unwrap());
    assert!(archived.starts_with(f.paths.mailbox_archive("dingtalk")));

    // Done twice: gone from inbound
    let (status, _) = call(
        &f.app,
        "POST",
        "/api/v1/mailbox/m1/done",
        Some(serde_json::json!({"claimer": "agent-2"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn posted_events_reach_bus_subscribers() {
    let f = fixture();
    let mut rx = f.bus.subscribe();

    let (status, body) = call(
        &f.app,
        "POST",
        "/api/v1/events",
        Some(serde_json::json!({
            "type": "pr.created",
            "branch": "feat-0042-add-rate-limit",
            "title": "Add rate limit",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["type"], "pr.created");
    assert!(body["correlation_id"].is_string());

    let envelope = rx.recv().await.unwrap();
    assert_eq!(envelope.event.name(), "pr.created");
}

#[tokio::test]
async fn dashboard_reports_counts() {
    let f = fixture();
    call(
        &f.app,
        "POST",
        "/api/v1/issues",
        Some(serde_json::json!({"type": "feature", "title": "one"})),
    )
    .await;

    let (status, body) = call(&f.app, "GET", "/api/v1/stats/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["issues_by_status"]["open"], 1);
    assert_eq!(body["issues_by_stage"]["draft"], 1);
    assert!(body["sessions"].is_object());
}
