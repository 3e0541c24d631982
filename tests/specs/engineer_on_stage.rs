//! Flipping an issue's stage to doing schedules exactly one Engineer.

use crate::prelude::World;
use monoco_adapters::FakeEngineAdapter;
use monoco_core::{IssueId, Role};

const TICKET: &str = "---\nid: FEAT-0042\ntype: feature\nstatus: open\nstage: draft\ntitle: demo\ncreated_at: '2026-01-01T00:00:00'\nupdated_at: '2026-01-01T00:00:00'\nsolution: null\n---\nbody\n";

#[tokio::test]
async fn stage_doing_spawns_an_engineer_for_that_issue() {
    let mut world = World::build(FakeEngineAdapter::succeeding(), |_, _| {}).await;

    let path = world
        .paths
        .issues_root()
        .join("Features/open/FEAT-0042-demo.md");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, TICKET).unwrap();
    world.wait_for("issue.created").await;

    std::fs::write(&path, TICKET.replace("stage: draft", "stage: doing")).unwrap();
    world.wait_for("issue.field_changed").await;
    world.wait_for("session.completed").await;

    let calls = world.fake.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].role, Role::Engineer);
    assert_eq!(calls[0].issue_id, Some(IssueId::from("FEAT-0042")));
    assert!(calls[0].prompt.contains("FEAT-0042"));

    world.teardown().await;
}

#[tokio::test]
async fn other_stage_transitions_do_not_schedule() {
    let mut world = World::build(FakeEngineAdapter::succeeding(), |_, _| {}).await;

    let path = world
        .paths
        .issues_root()
        .join("Features/open/FEAT-0042-demo.md");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, TICKET).unwrap();
    world.wait_for("issue.created").await;

    std::fs::write(&path, TICKET.replace("stage: draft", "stage: todo")).unwrap();
    world.wait_for("issue.field_changed").await;
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;

    assert!(world.fake.calls().is_empty());
    world.teardown().await;
}

#[tokio::test]
async fn a_failed_engineer_gets_a_coroner_autopsy() {
    let mut world = World::build(FakeEngineAdapter::failing(1), |_, _| {}).await;

    let path = world
        .paths
        .issues_root()
        .join("Features/open/FEAT-0042-demo.md");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, TICKET).unwrap();
    world.wait_for("issue.created").await;
    std::fs::write(&path, TICKET.replace("stage: draft", "stage: doing")).unwrap();

    // Engineer fails, the default table routes a Coroner; with the fake
    // failing engine the Coroner fails too, but no third autopsy spawns.
    world.wait_for("session.failed").await;
    world.wait_for("session.failed").await;
    tokio::time::sleep(std::time::Duration::from_millis(400)).await;

    let calls = world.fake.calls();
    assert_eq!(calls.len(), 2, "engineer + coroner, no autopsy-of-autopsy");
    assert_eq!(calls[0].role, Role::Engineer);
    assert_eq!(calls[1].role, Role::Coroner);
    assert!(calls[1].prompt.contains("agent exited 1"));

    world.teardown().await;
}
