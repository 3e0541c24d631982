// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup, port claim, shutdown.

use crate::event_bus::EventBus;
use crate::http::{self, AppState};
use crate::watchers::{
    IssueWatcher, MailboxInboundWatcher, MemoWatcher, TaskWatcher, WatcherHandle,
};
use monoco_adapters::{pid_alive, EngineRegistry};
use monoco_core::{Role, SystemClock};
use monoco_engine::{
    default_bindings, AgentScheduler, Mailbox, OutboundDispatcher, ProviderRegistry,
    SchedulerConfig, TransitionCore,
};
use monoco_hooks::{discover_hooks, HookEngine};
use monoco_storage::PidFile;
use monoco_ticket::{ProjectConfig, ProjectPaths, TicketError};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Notify;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("daemon already running (pid {pid}, port {port})")]
    AlreadyRunning { pid: u32, port: u16 },

    #[error("no free port in {start}..{end}")]
    NoPort { start: u16, end: u16 },

    #[error("configuration: {0}")]
    Config(#[from] TicketError),

    #[error("session recovery: {0}")]
    Recovery(#[from] monoco_engine::SchedulerError),

    #[error(transparent)]
    Storage(#[from] monoco_storage::StorageError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the daemon needs to come up in one project.
#[derive(Clone)]
pub struct DaemonConfig {
    pub paths: ProjectPaths,
    pub project: ProjectConfig,
    /// Identity used for mention detection in inbound chat
    pub bot_name: String,
    /// Registry slug this project answers webhooks for
    pub slug: Option<String>,
}

impl DaemonConfig {
    /// Load for a project root; a malformed config file refuses startup.
    ///
    /// The webhook slug comes from the global registry when this root is
    /// registered there.
    pub fn load(root: PathBuf) -> Result<Self, LifecycleError> {
        let paths = ProjectPaths::new(root);
        let project = ProjectConfig::load(&paths)?;
        let slug = registered_slug(paths.root());
        Ok(Self {
            paths,
            project,
            bot_name: "monoco".to_string(),
            slug,
        })
    }
}

/// Reverse lookup: the registry slug whose root is this project.
fn registered_slug(root: &std::path::Path) -> Option<String> {
    let registry_path = monoco_storage::ProjectRegistry::default_path()?;
    let registry = monoco_storage::ProjectRegistry::load(&registry_path).ok()?;
    registry
        .projects
        .iter()
        .find(|(_, entry)| entry.root == root)
        .map(|(slug, _)| slug.clone())
}

/// A running daemon: all component tasks plus the resources they share.
#[derive(Debug)]
pub struct Daemon {
    pub state: Arc<AppState>,
    pub port: u16,
    pid_path: PathBuf,
    watchers: Vec<WatcherHandle>,
    router_task: tokio::task::JoinHandle<()>,
    http_task: tokio::task::JoinHandle<()>,
    dispatcher_shutdown: Arc<Notify>,
}

/// Hook discovery directories in precedence order.
fn hook_dirs(paths: &ProjectPaths) -> Vec<PathBuf> {
    let mut dirs = vec![paths.hooks_dir()];
    if let Some(config_home) = dirs::config_dir() {
        dirs.push(config_home.join("agents").join("hooks"));
    }
    dirs
}

/// Claim the first free port starting at the configured default.
async fn claim_port(
    start: u16,
    range: u16,
) -> Result<(u16, tokio::net::TcpListener), LifecycleError> {
    let end = start.saturating_add(range);
    for port in start..end {
        match tokio::net::TcpListener::bind(("127.0.0.1", port)).await {
            Ok(listener) => return Ok((port, listener)),
            Err(_) => continue,
        }
    }
    Err(LifecycleError::NoPort { start, end })
}

/// Bring the daemon up: PID claim, port scan, recovery, watchers, HTTP.
pub async fn startup(
    config: DaemonConfig,
    providers: ProviderRegistry,
) -> Result<Daemon, LifecycleError> {
    let paths = &config.paths;
    let pid_path = paths.pid_file();

    // Refuse to double-start against a live daemon
    if let Some(existing) = PidFile::read_live(&pid_path, pid_alive)? {
        return Err(LifecycleError::AlreadyRunning {
            pid: existing.pid,
            port: existing.port,
        });
    }

    let (port, listener) = claim_port(config.project.http.port, config.project.http.scan_range).await?;

    let clock = SystemClock;
    let bus = EventBus::new(clock.clone());

    // Scheduler with per-role caps from the project config
    let mut scheduler_config = SchedulerConfig::new(
        paths.sessions_dir(),
        paths.log_dir(),
        paths.root().to_path_buf(),
    );
    for role in Role::builtin() {
        scheduler_config
            .concurrency
            .insert(role.name().to_string(), config.project.concurrency_for(&role));
    }
    let scheduler = AgentScheduler::new(
        scheduler_config,
        EngineRegistry::builtin(),
        clock.clone(),
        bus.ingest_sender(),
    );
    let adopted = scheduler.recover()?;
    if adopted > 0 {
        tracing::info!(adopted, "observer sessions adopted from previous daemon");
    }

    // Hook engine over project, user, and bundled directories
    let dirs = hook_dirs(paths);
    let dir_refs: Vec<&std::path::Path> = dirs.iter().map(PathBuf::as_path).collect();
    let hooks = HookEngine::new(discover_hooks(&dir_refs));

    let transitions = Arc::new(TransitionCore::new(
        paths.clone(),
        config.project.clone(),
        hooks,
    ));
    let mailbox = Mailbox::new(paths.clone(), config.project.mailbox.clone());

    // Router subscribes to the bus with the default table
    let router = Arc::new(default_bindings(
        &scheduler,
        &config.project,
        paths,
        &bus.ingest_sender(),
    ));
    let router_task = router.spawn(bus.subscribe());

    // Watchers
    let watchers = vec![
        IssueWatcher::new(paths.issues_root(), bus.clone()).start(),
        MemoWatcher::new(paths.memo_inbox(), bus.clone()).start(),
        TaskWatcher::new(paths.tasks_file(), bus.clone()).start(),
        MailboxInboundWatcher::new(paths.clone(), bus.clone(), &config.bot_name).start(),
    ];

    // Outbound dispatcher
    let dispatcher_shutdown = Arc::new(Notify::new());
    tokio::spawn(
        OutboundDispatcher::new(mailbox.clone(), providers).run(Arc::clone(&dispatcher_shutdown)),
    );

    // PID file marks the daemon live only after everything above stood up
    let started_at = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    PidFile::new(std::process::id(), "127.0.0.1", port, started_at).write(&pid_path)?;

    let state = Arc::new(AppState {
        bus,
        scheduler,
        transitions,
        mailbox,
        paths: paths.clone(),
        slug: config.slug.clone(),
    });

    let app = http::router(Arc::clone(&state));
    let http_task = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            tracing::error!(error = %err, "http server stopped");
        }
    });

    tracing::info!(port, "daemon ready");
    Ok(Daemon {
        state,
        port,
        pid_path,
        watchers,
        router_task,
        http_task,
        dispatcher_shutdown,
    })
}

impl Daemon {
    /// Graceful teardown. By default agent processes stay alive (the OS
    /// owns them) and the next daemon adopts their sessions in observer
    /// mode; `kill` terminates every owned session first.
    pub async fn shutdown(self, kill: bool) {
        tracing::info!(kill, "shutting down");
        for watcher in self.watchers {
            watcher.stop().await;
        }
        self.dispatcher_shutdown.notify_one();
        if kill {
            self.state.scheduler.stop().await;
        } else {
            self.state.scheduler.detach();
        }
        self.router_task.abort();
        self.http_task.abort();
        PidFile::remove(&self.pid_path);
        tracing::info!("daemon stopped");
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
