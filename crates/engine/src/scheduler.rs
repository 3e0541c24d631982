// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent scheduler
//!
//! Bounded-concurrency executor for external agent processes. Each role has
//! a fixed number of slots (its semaphore) and a bounded FIFO overflow
//! queue; every session state transition is persisted atomically before the
//! corresponding event reaches the bus. Agents never run in-process.

use monoco_adapters::{pid_alive, terminate_graceful, EngineRegistry};
use monoco_core::{
    AgentSession, AgentTask, Clock, Envelope, Event, IssueId, Role, SessionId, SessionMode,
    SessionState,
};
use monoco_storage::{SessionStore, SessionStoreError};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Notify};

/// How often observer-mode sessions are probed for pid liveness.
const OBSERVER_POLL: Duration = Duration::from_secs(2);

/// Bytes of session log fed into `session.failed` (and the Coroner prompt).
const LOG_TAIL_BYTES: u64 = 2048;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    UnknownEngine(#[from] monoco_adapters::EngineError),

    #[error("quota exhausted for role {role}: {queued} tasks already queued")]
    QuotaExhausted { role: Role, queued: usize },

    #[error("issue {issue} already has active session {session}")]
    IssueBusy { issue: IssueId, session: SessionId },

    #[error("scheduler is shutting down")]
    ShuttingDown,

    #[error("spawn failed: {0}")]
    Spawn(String),

    #[error(transparent)]
    Store(#[from] SessionStoreError),
}

impl monoco_core::error::Classified for SchedulerError {
    fn class(&self) -> monoco_core::ErrorClass {
        match self {
            SchedulerError::QuotaExhausted { .. } => monoco_core::ErrorClass::QuotaExhausted,
            SchedulerError::IssueBusy { .. } => monoco_core::ErrorClass::Precondition,
            SchedulerError::UnknownEngine(_) => monoco_core::ErrorClass::Validation,
            SchedulerError::Spawn(_) => monoco_core::ErrorClass::AgentFailed,
            SchedulerError::ShuttingDown => monoco_core::ErrorClass::Precondition,
            SchedulerError::Store(_) => monoco_core::ErrorClass::TransientIo,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Where session JSON records live (`.monoco/sessions/`)
    pub sessions_dir: PathBuf,
    /// Where per-session logs go (`.monoco/log/`)
    pub log_dir: PathBuf,
    /// Working directory agents start in (the project root)
    pub workdir: PathBuf,
    /// Per-role concurrency caps; roles absent here use their defaults
    pub concurrency: HashMap<String, usize>,
    /// Bounded FIFO depth per role
    pub queue_capacity: usize,
    /// SIGTERM grace before SIGKILL
    pub grace: Duration,
}

impl SchedulerConfig {
    pub fn new(sessions_dir: PathBuf, log_dir: PathBuf, workdir: PathBuf) -> Self {
        Self {
            sessions_dir,
            log_dir,
            workdir,
            concurrency: HashMap::new(),
            queue_capacity: 32,
            grace: Duration::from_secs(5),
        }
    }

    fn limit_for(&self, role: &Role) -> usize {
        self.concurrency
            .get(role.name())
            .copied()
            .unwrap_or_else(|| role.default_concurrency())
            .max(1)
    }
}

/// Per-role slot accounting: a counting semaphore with a bounded FIFO
/// overflow queue behind it.
#[derive(Debug)]
struct RoleSlots {
    limit: usize,
    active: usize,
    queue: VecDeque<(SessionId, AgentTask)>,
}

#[derive(Debug)]
struct SessionHandle {
    record: AgentSession,
    /// Cooperative cancellation; present only for owned sessions
    cancel: Option<Arc<Notify>>,
    monitor: Option<tokio::task::JoinHandle<()>>,
}

/// Per-role scheduler statistics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SchedulerStats {
    pub active: HashMap<String, usize>,
    pub queued: HashMap<String, usize>,
    pub total_completed: u64,
    pub total_failed: u64,
}

#[derive(Debug)]
struct Shared<C: Clock> {
    config: SchedulerConfig,
    engines: EngineRegistry,
    store: SessionStore,
    clock: C,
    bus: mpsc::Sender<Envelope>,
    roles: Mutex<HashMap<String, RoleSlots>>,
    sessions: Mutex<HashMap<SessionId, SessionHandle>>,
    stats: Mutex<SchedulerStats>,
    shutting_down: AtomicBool,
}

/// The bounded-concurrency agent executor.
#[derive(Debug, Clone)]
pub struct AgentScheduler<C: Clock> {
    shared: Arc<Shared<C>>,
}

impl<C: Clock + 'static> AgentScheduler<C> {
    pub fn new(
        config: SchedulerConfig,
        engines: EngineRegistry,
        clock: C,
        bus: mpsc::Sender<Envelope>,
    ) -> Self {
        let store = SessionStore::new(config.sessions_dir.clone());
        Self {
            shared: Arc::new(Shared {
                config,
                engines,
                store,
                clock,
                bus,
                roles: Mutex::new(HashMap::new()),
                sessions: Mutex::new(HashMap::new()),
                stats: Mutex::new(SchedulerStats::default()),
                shutting_down: AtomicBool::new(false),
            }),
        }
    }

    /// Startup recovery: scan the session directory, terminate records whose
    /// pid died while the daemon was down, and adopt live ones in observer
    /// mode. Spawns the observer liveness poller.
    pub fn recover(&self) -> Result<usize, SchedulerError> {
        let now = self.shared.clock.epoch_ms();
        let sessions = self.shared.store.reconcile(now, pid_alive)?;
        let mut observers = 0;

        {
            let mut table = self.shared.sessions.lock();
            let mut roles = self.shared.roles.lock();
            for record in sessions {
                if record.is_active() {
                    observers += 1;
                    // Detached agents still occupy their role's quota
                    let slots = Self::slots_for(&self.shared.config, &mut roles, &record.role);
                    slots.active += 1;
                }
                table.insert(
                    record.session_id.clone(),
                    SessionHandle {
                        record,
                        cancel: None,
                        monitor: None,
                    },
                );
            }
        }

        if observers > 0 {
            tracing::info!(observers, "adopted detached sessions in observer mode");
        }
        self.spawn_observer_poller();
        Ok(observers)
    }

    fn slots_for<'a>(
        config: &SchedulerConfig,
        roles: &'a mut HashMap<String, RoleSlots>,
        role: &Role,
    ) -> &'a mut RoleSlots {
        roles
            .entry(role.name().to_string())
            .or_insert_with(|| RoleSlots {
                limit: config.limit_for(role),
                active: 0,
                queue: VecDeque::new(),
            })
    }

    /// Submit a task. Returns the session id: immediately running when a
    /// slot is free, otherwise queued FIFO. A full queue is
    /// `QuotaExhausted`; an issue with an active session is `IssueBusy`.
    pub fn schedule(&self, task: AgentTask) -> Result<SessionId, SchedulerError> {
        if self.shared.shutting_down.load(Ordering::SeqCst) {
            return Err(SchedulerError::ShuttingDown);
        }
        // Resolve early so an unknown engine fails before anything persists
        self.shared.engines.resolve(&task.engine)?;

        if let Some(issue_id) = &task.issue_id {
            if let Some(existing) = self.active_session_for(issue_id) {
                return Err(SchedulerError::IssueBusy {
                    issue: issue_id.clone(),
                    session: existing,
                });
            }
        }

        let session_id = SessionId::new(uuid::Uuid::new_v4().to_string());
        let record = AgentSession {
            session_id: session_id.clone(),
            role: task.role.clone(),
            issue_id: task.issue_id.clone(),
            state: SessionState::Pending,
            pid: None,
            started_at: self.shared.clock.epoch_ms(),
            finished_at: None,
            exit_code: None,
            log_path: self
                .shared
                .config
                .log_dir
                .join(format!("session-{session_id}.log")),
            engine: task.engine.clone(),
            timeout: task.timeout().as_secs(),
            metadata: task.metadata.clone(),
            mode: SessionMode::Owner,
        };
        self.shared.store.save(&record)?;

        let run_now = {
            let mut roles = self.shared.roles.lock();
            let slots = Self::slots_for(&self.shared.config, &mut roles, &task.role);
            if slots.active < slots.limit {
                slots.active += 1;
                true
            } else if slots.queue.len() < self.shared.config.queue_capacity {
                slots.queue.push_back((session_id.clone(), task.clone()));
                false
            } else {
                let queued = slots.queue.len();
                // Roll back the pending record; the task never entered
                let _ = std::fs::remove_file(
                    self.shared
                        .config
                        .sessions_dir
                        .join(format!("{session_id}.json")),
                );
                return Err(SchedulerError::QuotaExhausted {
                    role: task.role.clone(),
                    queued,
                });
            }
        };

        {
            let mut table = self.shared.sessions.lock();
            table.insert(
                session_id.clone(),
                SessionHandle {
                    record,
                    cancel: None,
                    monitor: None,
                },
            );
        }
        self.publish(Event::SessionCreated {
            session_id: session_id.clone(),
            role: task.role.clone(),
            issue_id: task.issue_id.clone(),
        });

        if run_now {
            self.launch(session_id.clone(), task);
        } else {
            tracing::info!(session_id = %session_id, role = %task.role, "task queued (quota full)");
        }
        Ok(session_id)
    }

    fn active_session_for(&self, issue_id: &IssueId) -> Option<SessionId> {
        let table = self.shared.sessions.lock();
        table
            .values()
            .find(|h| h.record.issue_id.as_ref() == Some(issue_id) && h.record.is_active())
            .map(|h| h.record.session_id.clone())
    }

    /// Spawn the agent process and its supervision task. Slot is already
    /// held. Failure to spawn releases the slot and records a failure.
    fn launch(&self, session_id: SessionId, task: AgentTask) {
        let shared = Arc::clone(&self.shared);
        let engine = match shared.engines.resolve(&task.engine) {
            Ok(engine) => engine,
            Err(err) => {
                // Resolution succeeded at schedule time; registry mutated since
                self.finish_failed(&session_id, None, format!("engine vanished: {err}"));
                return;
            }
        };
        let spec = match engine.build_command(&task, &session_id) {
            Ok(spec) => spec,
            Err(err) => {
                self.finish_failed(&session_id, None, err.to_string());
                return;
            }
        };

        let log_path = shared.config.log_dir.join(format!("session-{session_id}.log"));
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let log_file = match std::fs::File::create(&log_path) {
            Ok(file) => file,
            Err(err) => {
                self.finish_failed(&session_id, None, format!("cannot open session log: {err}"));
                return;
            }
        };
        let log_err = match log_file.try_clone() {
            Ok(file) => file,
            Err(err) => {
                self.finish_failed(&session_id, None, format!("cannot open session log: {err}"));
                return;
            }
        };

        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&shared.config.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(log_err));

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                self.finish_failed(&session_id, None, format!("spawn {}: {err}", spec.program));
                return;
            }
        };
        let pid = child.id();

        let cancel = Arc::new(Notify::new());
        self.update_record(&session_id, |record| {
            record.pid = pid;
            record.transition(SessionState::Running, shared.clock.epoch_ms());
        });

        let monitor = {
            let scheduler = self.clone();
            let cancel = Arc::clone(&cancel);
            let timeout = task.timeout();
            let sid = session_id.clone();
            tokio::spawn(async move {
                let outcome = tokio::select! {
                    status = child.wait() => match status {
                        Ok(status) => Outcome::Exited(status.code()),
                        Err(err) => Outcome::WaitFailed(err.to_string()),
                    },
                    _ = tokio::time::sleep(timeout) => Outcome::TimedOut,
                    _ = cancel.notified() => Outcome::Cancelled,
                };

                match outcome {
                    Outcome::Exited(code) => scheduler.on_exit(&sid, code).await,
                    Outcome::WaitFailed(message) => {
                        scheduler.finish_failed(&sid, None, format!("wait failed: {message}"))
                    }
                    Outcome::TimedOut => scheduler.on_timeout(&sid, pid, &mut child).await,
                    Outcome::Cancelled => scheduler.on_cancel(&sid, pid, &mut child).await,
                }
            })
        };

        let mut table = self.shared.sessions.lock();
        if let Some(handle) = table.get_mut(&session_id) {
            handle.cancel = Some(cancel);
            handle.monitor = Some(monitor);
        }
    }

    async fn on_exit(&self, session_id: &SessionId, code: Option<i32>) {
        let now = self.shared.clock.epoch_ms();
        let (role, issue_id) = self.update_record(session_id, |record| {
            record.exit_code = code;
            let next = if code == Some(0) {
                SessionState::Completed
            } else {
                SessionState::Failed
            };
            record.transition(next, now);
        });

        if code == Some(0) {
            self.shared.stats.lock().total_completed += 1;
            self.publish(Event::SessionCompleted {
                session_id: session_id.clone(),
                role,
                issue_id,
                exit_code: 0,
            });
        } else {
            self.shared.stats.lock().total_failed += 1;
            self.publish(Event::SessionFailed {
                session_id: session_id.clone(),
                role,
                issue_id,
                exit_code: code,
                reason: match code {
                    Some(code) => format!("agent exited {code}"),
                    None => "agent killed by signal".to_string(),
                },
                log_tail: self.log_tail(session_id),
            });
        }
        self.release_slot(session_id);
    }

    async fn on_timeout(
        &self,
        session_id: &SessionId,
        pid: Option<u32>,
        child: &mut tokio::process::Child,
    ) {
        if let Some(pid) = pid {
            terminate_graceful(pid, self.shared.config.grace).await;
        }
        let _ = child.wait().await; // reap
        let now = self.shared.clock.epoch_ms();
        let (role, issue_id) = self.update_record(session_id, |record| {
            record.transition(SessionState::Timeout, now);
        });

        self.shared.stats.lock().total_failed += 1;
        self.publish(Event::SessionTimeout {
            session_id: session_id.clone(),
            role: role.clone(),
            issue_id: issue_id.clone(),
        });
        // Timeouts are failures for routing purposes (the Coroner autopsy)
        self.publish(Event::SessionFailed {
            session_id: session_id.clone(),
            role,
            issue_id,
            exit_code: None,
            reason: "wall-clock timeout".to_string(),
            log_tail: self.log_tail(session_id),
        });
        self.release_slot(session_id);
    }

    async fn on_cancel(
        &self,
        session_id: &SessionId,
        pid: Option<u32>,
        child: &mut tokio::process::Child,
    ) {
        if let Some(pid) = pid {
            terminate_graceful(pid, self.shared.config.grace).await;
        }
        let _ = child.wait().await;
        let now = self.shared.clock.epoch_ms();
        let (role, issue_id) = self.update_record(session_id, |record| {
            record.transition(SessionState::Terminated, now);
        });
        self.publish(Event::SessionTerminated {
            session_id: session_id.clone(),
            role,
            issue_id,
        });
        self.release_slot(session_id);
    }

    fn finish_failed(&self, session_id: &SessionId, exit_code: Option<i32>, reason: String) {
        let now = self.shared.clock.epoch_ms();
        let (role, issue_id) = self.update_record(session_id, |record| {
            record.exit_code = exit_code;
            record.transition(SessionState::Failed, now);
        });
        self.shared.stats.lock().total_failed += 1;
        self.publish(Event::SessionFailed {
            session_id: session_id.clone(),
            role,
            issue_id,
            exit_code,
            reason,
            log_tail: self.log_tail(session_id),
        });
        self.release_slot(session_id);
    }

    /// Apply a mutation to the in-memory record and persist it.
    fn update_record(
        &self,
        session_id: &SessionId,
        mutate: impl FnOnce(&mut AgentSession),
    ) -> (Role, Option<IssueId>) {
        let record = {
            let mut table = self.shared.sessions.lock();
            let Some(handle) = table.get_mut(session_id) else {
                return (Role::Custom("unknown".to_string()), None);
            };
            mutate(&mut handle.record);
            handle.record.clone()
        };
        if let Err(err) = self.shared.store.save(&record) {
            tracing::error!(session_id = %session_id, error = %err, "failed to persist session record");
        }
        (record.role, record.issue_id)
    }

    /// Free the role slot and dispatch the next queued task, if any.
    fn release_slot(&self, session_id: &SessionId) {
        let role = {
            let table = self.shared.sessions.lock();
            match table.get(session_id) {
                Some(handle) => handle.record.role.clone(),
                None => return,
            }
        };

        let next = {
            let mut roles = self.shared.roles.lock();
            let slots = Self::slots_for(&self.shared.config, &mut roles, &role);
            match slots.queue.pop_front() {
                Some(next) => Some(next), // slot passes directly to the queued task
                None => {
                    slots.active = slots.active.saturating_sub(1);
                    None
                }
            }
        };

        if let Some((queued_sid, task)) = next {
            tracing::info!(session_id = %queued_sid, role = %role, "dispatching queued task");
            self.launch(queued_sid, task);
        }
    }

    /// Request termination; idempotent and best-effort.
    pub async fn terminate(&self, session_id: &SessionId) {
        let (cancel, observer_pid) = {
            let table = self.shared.sessions.lock();
            match table.get(session_id) {
                Some(handle) if !handle.record.is_active() => return,
                Some(handle) => match &handle.cancel {
                    Some(cancel) => (Some(Arc::clone(cancel)), None),
                    None => (None, handle.record.pid),
                },
                None => return,
            }
        };

        // A queued task never held a slot; just pull it out of the FIFO
        let was_queued = {
            let mut roles = self.shared.roles.lock();
            let mut removed = false;
            for slots in roles.values_mut() {
                let before = slots.queue.len();
                slots.queue.retain(|(sid, _)| sid != session_id);
                removed |= slots.queue.len() != before;
            }
            removed
        };
        if was_queued {
            let now = self.shared.clock.epoch_ms();
            let (role, issue_id) = self.update_record(session_id, |record| {
                record.transition(SessionState::Terminated, now);
            });
            self.publish(Event::SessionTerminated {
                session_id: session_id.clone(),
                role,
                issue_id,
            });
            return;
        }

        if let Some(cancel) = cancel {
            cancel.notify_one();
            return;
        }
        // Observer mode: we own no child handle, only the pid
        if let Some(pid) = observer_pid {
            terminate_graceful(pid, self.shared.config.grace).await;
        }
        let now = self.shared.clock.epoch_ms();
        let (role, issue_id) = self.update_record(session_id, |record| {
            record.transition(SessionState::Terminated, now);
        });
        self.publish(Event::SessionTerminated {
            session_id: session_id.clone(),
            role,
            issue_id,
        });
        self.release_slot(session_id);
    }

    /// Point-in-time view of one session.
    pub fn status(&self, session_id: &SessionId) -> Option<AgentSession> {
        let table = self.shared.sessions.lock();
        table.get(session_id).map(|h| h.record.clone())
    }

    pub fn list_active(&self) -> Vec<AgentSession> {
        let table = self.shared.sessions.lock();
        let mut active: Vec<AgentSession> = table
            .values()
            .filter(|h| h.record.is_active())
            .map(|h| h.record.clone())
            .collect();
        active.sort_by_key(|s| s.started_at);
        active
    }

    pub fn stats(&self) -> SchedulerStats {
        let mut stats = self.shared.stats.lock().clone();
        let roles = self.shared.roles.lock();
        for (name, slots) in roles.iter() {
            stats.active.insert(name.clone(), slots.active);
            stats.queued.insert(name.clone(), slots.queue.len());
        }
        stats
    }

    /// Stop accepting work but leave agent processes running: monitors are
    /// dropped and records stay `running` on disk, so the next daemon
    /// adopts them in observer mode. The graceful-shutdown path.
    pub fn detach(&self) {
        self.shared.shutting_down.store(true, Ordering::SeqCst);
        {
            let mut roles = self.shared.roles.lock();
            for slots in roles.values_mut() {
                slots.queue.clear();
            }
        }
        let mut table = self.shared.sessions.lock();
        for handle in table.values_mut() {
            if let Some(monitor) = handle.monitor.take() {
                monitor.abort();
            }
            handle.cancel = None;
        }
    }

    /// Stop accepting work and wait for owned sessions to end (killing them).
    pub async fn stop(&self) {
        self.shared.shutting_down.store(true, Ordering::SeqCst);

        // Drop every queued task; they never started
        {
            let mut roles = self.shared.roles.lock();
            for slots in roles.values_mut() {
                slots.queue.clear();
            }
        }

        let owned: Vec<SessionId> = {
            let table = self.shared.sessions.lock();
            table
                .values()
                .filter(|h| h.record.is_active() && h.cancel.is_some())
                .map(|h| h.record.session_id.clone())
                .collect()
        };
        for sid in &owned {
            self.terminate(sid).await;
        }

        let monitors: Vec<tokio::task::JoinHandle<()>> = {
            let mut table = self.shared.sessions.lock();
            table
                .values_mut()
                .filter_map(|h| h.monitor.take())
                .collect()
        };
        for monitor in monitors {
            let _ = monitor.await;
        }
    }

    fn publish(&self, event: Event) {
        let envelope = Envelope::new(event, self.shared.clock.epoch_ms());
        if let Err(err) = self.shared.bus.try_send(envelope) {
            tracing::warn!(error = %err, "bus full, dropping scheduler event");
        }
    }

    /// Last chunk of a session's log, for failure events.
    fn log_tail(&self, session_id: &SessionId) -> String {
        let path = {
            let table = self.shared.sessions.lock();
            match table.get(session_id) {
                Some(handle) => handle.record.log_path.clone(),
                None => return String::new(),
            }
        };
        let Ok(contents) = std::fs::read(&path) else {
            return String::new();
        };
        let start = contents.len().saturating_sub(LOG_TAIL_BYTES as usize);
        String::from_utf8_lossy(&contents[start..]).to_string()
    }

    /// Poll observer sessions; a dead pid becomes `terminated`.
    fn spawn_observer_poller(&self) {
        let scheduler = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(OBSERVER_POLL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if scheduler.shared.shutting_down.load(Ordering::SeqCst) {
                    return;
                }
                let dead: Vec<SessionId> = {
                    let table = scheduler.shared.sessions.lock();
                    table
                        .values()
                        .filter(|h| {
                            h.record.is_active()
                                && h.cancel.is_none()
                                && !h.record.pid.map(pid_alive).unwrap_or(false)
                        })
                        .map(|h| h.record.session_id.clone())
                        .collect()
                };
                for sid in dead {
                    tracing::info!(session_id = %sid, "observed session's process is gone");
                    let now = scheduler.shared.clock.epoch_ms();
                    let (role, issue_id) = scheduler.update_record(&sid, |record| {
                        record.transition(SessionState::Terminated, now);
                    });
                    scheduler.publish(Event::SessionTerminated {
                        session_id: sid.clone(),
                        role,
                        issue_id,
                    });
                    scheduler.release_slot(&sid);
                }
            }
        });
    }
}

enum Outcome {
    Exited(Option<i32>),
    WaitFailed(String),
    TimedOut,
    Cancelled,
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
