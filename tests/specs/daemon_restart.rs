//! Daemon restart with a running agent: the session survives in observer
//! mode and its issue stays protected from duplicate scheduling.

use monoco_adapters::{EngineRegistry, FakeEngineAdapter};
use monoco_core::{AgentTask, IssueId, Role, SessionMode, SessionState, SystemClock};
use monoco_daemon::EventBus;
use monoco_engine::{AgentScheduler, SchedulerConfig, SchedulerError};
use monoco_ticket::ProjectPaths;
use std::sync::Arc;
use std::time::Duration;

fn scheduler(paths: &ProjectPaths, bus: &EventBus<SystemClock>) -> AgentScheduler<SystemClock> {
    let mut config = SchedulerConfig::new(
        paths.sessions_dir(),
        paths.log_dir(),
        paths.root().to_path_buf(),
    );
    config.grace = Duration::from_millis(200);
    let mut engines = EngineRegistry::new();
    engines.register(Arc::new(FakeEngineAdapter::hanging()));
    AgentScheduler::new(config, engines, SystemClock, bus.ingest_sender())
}

#[tokio::test]
async fn running_agent_survives_as_observer_and_blocks_duplicates() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = ProjectPaths::new(tmp.path());
    let issue = IssueId::from("FEAT-0042");

    // First daemon life: an Engineer starts on the issue, then the daemon
    // detaches (graceful shutdown without killing the agent).
    let bus_a = EventBus::new(SystemClock);
    let first = scheduler(&paths, &bus_a);
    let task = AgentTask::new(Role::Engineer, "fake", "work on it").with_issue(issue.clone());
    let sid = first.schedule(task).unwrap();
    // Give the spawn a moment to record the pid
    tokio::time::sleep(Duration::from_millis(300)).await;
    let pid = first.status(&sid).unwrap().pid.unwrap();
    first.detach();

    // The agent process is still alive, owned by the OS
    assert!(monoco_adapters::pid_alive(pid));

    // Second daemon life adopts it in observer mode
    let bus_b = EventBus::new(SystemClock);
    let second = scheduler(&paths, &bus_b);
    let adopted = second.recover().unwrap();
    assert_eq!(adopted, 1);

    let session = second.status(&sid).unwrap();
    assert_eq!(session.state, SessionState::Running);
    assert_eq!(session.mode, SessionMode::Observer);
    assert_eq!(session.pid, Some(pid));

    // No duplicate scheduling for the same issue
    let dup = AgentTask::new(Role::Engineer, "fake", "again").with_issue(issue.clone());
    assert!(matches!(
        second.schedule(dup),
        Err(SchedulerError::IssueBusy { .. })
    ));

    // Observer-mode terminate: best-effort SIGTERM on the bare pid
    second.terminate(&sid).await;
    assert_eq!(
        second.status(&sid).map(|s| s.state),
        Some(SessionState::Terminated)
    );

    // Now the issue is schedulable again
    let again = AgentTask::new(Role::Engineer, "fake", "retry").with_issue(issue);
    second.schedule(again).unwrap();
    second.stop().await;
}

#[tokio::test]
async fn dead_agent_from_previous_life_is_buried_at_recover() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = ProjectPaths::new(tmp.path());

    let bus_a = EventBus::new(SystemClock);
    let first = scheduler(&paths, &bus_a);
    let sid = first
        .schedule(AgentTask::new(Role::Engineer, "fake", "doomed"))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let pid = first.status(&sid).unwrap().pid.unwrap();
    first.detach();

    // The agent dies while no daemon is running; give the runtime a moment
    // to reap the orphan so the pid probe sees it gone
    monoco_adapters::terminate_graceful(pid, Duration::from_millis(300)).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    let bus_b = EventBus::new(SystemClock);
    let second = scheduler(&paths, &bus_b);
    assert_eq!(second.recover().unwrap(), 0);
    assert_eq!(
        second.status(&sid).map(|s| s.state),
        Some(SessionState::Terminated)
    );
    second.stop().await;
}
