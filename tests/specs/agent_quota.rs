//! Engineer cap 1: a second doing issue queues, survives the first session,
//! and starts when the slot frees.

use crate::prelude::World;
use monoco_adapters::FakeEngineAdapter;
use monoco_core::{Event, SessionState};

const TICKET: &str = "---\nid: {ID}\ntype: feature\nstatus: open\nstage: draft\ntitle: t\ncreated_at: '2026-01-01T00:00:00'\nupdated_at: '2026-01-01T00:00:00'\nsolution: null\n---\n";

fn write_ticket(world: &World, id: &str, stage: &str) {
    let path = world
        .paths
        .issues_root()
        .join(format!("Features/open/{id}-t.md"));
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let text = TICKET.replace("{ID}", id).replace("stage: draft", &format!("stage: {stage}"));
    std::fs::write(&path, text).unwrap();
}

#[tokio::test]
async fn second_doing_issue_waits_for_the_slot() {
    let mut world = World::build(FakeEngineAdapter::sleeping(1), |scheduler, _| {
        scheduler.concurrency.insert("engineer".to_string(), 1);
    })
    .await;

    write_ticket(&world, "FEAT-0001", "draft");
    write_ticket(&world, "FEAT-0002", "draft");
    world.wait_for("issue.created").await;
    world.wait_for("issue.created").await;

    // Both flip to doing; the router matches both
    write_ticket(&world, "FEAT-0001", "doing");
    write_ticket(&world, "FEAT-0002", "doing");
    world.wait_for("session.created").await;
    world.wait_for("session.created").await;

    // One slot: one running, one parked on the role FIFO
    let stats = world.scheduler.stats();
    assert_eq!(stats.active.get("engineer"), Some(&1));
    assert_eq!(stats.queued.get("engineer"), Some(&1));

    // The first completion frees the slot; the queued session then runs
    let Event::SessionCompleted { session_id: first, .. } =
        world.wait_for("session.completed").await
    else {
        unreachable!();
    };
    let Event::SessionCompleted { session_id: second, .. } =
        world.wait_for("session.completed").await
    else {
        unreachable!();
    };
    assert_ne!(first, second);

    // Both sessions ended completed; neither interfered with the other
    let store = monoco_storage::SessionStore::new(world.paths.sessions_dir());
    let sessions = store.scan().unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|s| s.state == SessionState::Completed));

    world.teardown().await;
}
