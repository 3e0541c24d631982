//! A memo appended to the inbox becomes an Architect session, and the inbox
//! is drained atomically so restarts cannot re-fire.

use crate::prelude::World;
use monoco_adapters::FakeEngineAdapter;
use monoco_core::{Role, SessionState};

#[tokio::test]
async fn memo_drains_into_an_architect_session() {
    let mut world = World::build(FakeEngineAdapter::succeeding(), |_, _| {}).await;

    std::fs::write(
        world.paths.memo_inbox(),
        "## [abc123] 2026-03-01T10:00:00\n- **From**: user\n\nIdea: add rate limit\n",
    )
    .unwrap();

    world.wait_for("memo.present").await;
    world.wait_for("session.created").await;
    world.wait_for("session.completed").await;

    // The inbox holds nothing that reached the prompt
    assert_eq!(
        std::fs::read_to_string(world.paths.memo_inbox()).unwrap(),
        ""
    );

    // One Architect session ran, prompted with the literal memo text
    let calls = world.fake.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].role, Role::Architect);
    assert!(calls[0].prompt.contains("Idea: add rate limit"));

    // And its record persisted to .monoco/sessions/
    let store = monoco_storage::SessionStore::new(world.paths.sessions_dir());
    let sessions = store.scan().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].state, SessionState::Completed);

    world.teardown().await;
}

#[tokio::test]
async fn an_already_empty_inbox_never_spawns() {
    let mut world = World::build(FakeEngineAdapter::succeeding(), |_, _| {}).await;

    // Whitespace-only writes parse to zero memos: no event, no session
    std::fs::write(world.paths.memo_inbox(), "\n\n").unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(400)).await;

    assert!(world.fake.calls().is_empty());
    world.teardown().await;
}
