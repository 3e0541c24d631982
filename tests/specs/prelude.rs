//! Shared fixture: a temp project wired like the daemon wires it, with the
//! fake engine in place of a real agent CLI.

use monoco_adapters::{EngineRegistry, FakeEngineAdapter};
use monoco_core::{Envelope, Event, SystemClock};
use monoco_daemon::watchers::{
    IssueWatcher, MailboxInboundWatcher, MemoWatcher, WatcherHandle,
};
use monoco_daemon::EventBus;
use monoco_engine::{default_bindings, AgentScheduler, SchedulerConfig};
use monoco_ticket::{ProjectConfig, ProjectPaths};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct World {
    pub tmp: tempfile::TempDir,
    pub paths: ProjectPaths,
    pub bus: EventBus<SystemClock>,
    pub rx: mpsc::Receiver<Envelope>,
    pub scheduler: AgentScheduler<SystemClock>,
    pub fake: FakeEngineAdapter,
    pub watchers: Vec<WatcherHandle>,
}

impl World {
    /// Wire bus + scheduler + default router + watchers over a fresh
    /// project. The `tune` hook adjusts scheduler limits before anything
    /// starts.
    pub async fn build(
        fake: FakeEngineAdapter,
        tune: impl FnOnce(&mut SchedulerConfig, &mut ProjectConfig),
    ) -> World {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(tmp.path());
        std::fs::create_dir_all(paths.issues_root()).unwrap();
        std::fs::create_dir_all(paths.memo_inbox().parent().unwrap()).unwrap();
        std::fs::write(paths.memo_inbox(), "").unwrap();

        let mut project = ProjectConfig::default();
        project.default_engine = "fake".to_string();

        let mut scheduler_config = SchedulerConfig::new(
            paths.sessions_dir(),
            paths.log_dir(),
            paths.root().to_path_buf(),
        );
        scheduler_config.grace = Duration::from_millis(200);
        tune(&mut scheduler_config, &mut project);

        let bus = EventBus::new(SystemClock);
        let rx = bus.subscribe();

        let mut engines = EngineRegistry::new();
        engines.register(Arc::new(fake.clone()));
        let scheduler = AgentScheduler::new(
            scheduler_config,
            engines,
            SystemClock,
            bus.ingest_sender(),
        );

        let router = Arc::new(default_bindings(
            &scheduler,
            &project,
            &paths,
            &bus.ingest_sender(),
        ));
        router.spawn(bus.subscribe());

        let watchers = vec![
            IssueWatcher::new(paths.issues_root(), bus.clone())
                .with_poll_interval(Duration::from_millis(50))
                .start(),
            MemoWatcher::new(paths.memo_inbox(), bus.clone())
                .with_poll_interval(Duration::from_millis(50))
                .start(),
            MailboxInboundWatcher::new(paths.clone(), bus.clone(), "monoco-bot")
                .with_windows(Duration::from_millis(300), Duration::from_millis(1500))
                .with_poll_interval(Duration::from_millis(50))
                .start(),
        ];
        // Let the priming scans settle before the test mutates the tree
        tokio::time::sleep(Duration::from_millis(150)).await;

        World {
            tmp,
            paths,
            bus,
            rx,
            scheduler,
            fake,
            watchers,
        }
    }

    /// Wait (up to 10 s) for the next event with the given topic name.
    pub async fn wait_for(&mut self, name: &str) -> Event {
        let deadline = Duration::from_secs(10);
        let fut = async {
            loop {
                let envelope = self.rx.recv().await.expect("bus closed");
                if envelope.event.name() == name {
                    return envelope.event;
                }
            }
        };
        tokio::time::timeout(deadline, fut)
            .await
            .unwrap_or_else(|_| panic!("no {name} event within {deadline:?}"))
    }

    pub async fn teardown(self) {
        for watcher in self.watchers {
            watcher.stop().await;
        }
        self.scheduler.stop().await;
    }
}
