// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in actions and the default routing table

use crate::router::{Action, ActionResult, Condition, Router};
use crate::scheduler::{AgentScheduler, SchedulerError};
use async_trait::async_trait;
use monoco_core::{AgentTask, Clock, Envelope, Event, Role};
use monoco_ticket::{memo, ProjectConfig, ProjectPaths};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Substitute `{field}` placeholders from a context map.
///
/// Unknown placeholders stay verbatim so a typo is visible in the prompt
/// instead of silently vanishing.
pub fn substitute(template: &str, context: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match context.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Flatten an event payload into a string context for templating.
fn payload_context(envelope: &Envelope) -> HashMap<String, String> {
    let mut context = HashMap::new();
    if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(&envelope.event) {
        for (key, value) in map {
            let rendered = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            context.insert(key, rendered);
        }
    }
    context.insert(
        "correlation_id".to_string(),
        envelope.correlation_id.to_string(),
    );
    context
}

/// Materializes a prompt from the payload and hands a task to the scheduler.
pub struct SpawnAgentAction<C: Clock> {
    role: Role,
    engine: String,
    prompt_template: String,
    timeout_secs: Option<u64>,
    scheduler: AgentScheduler<C>,
    bus: mpsc::Sender<Envelope>,
    /// Set on the memo binding: drain this inbox before prompting
    memo_inbox: Option<PathBuf>,
}

impl<C: Clock + 'static> SpawnAgentAction<C> {
    pub fn new(
        role: Role,
        engine: impl Into<String>,
        prompt_template: impl Into<String>,
        scheduler: AgentScheduler<C>,
        bus: mpsc::Sender<Envelope>,
    ) -> Self {
        Self {
            role,
            engine: engine.into(),
            prompt_template: prompt_template.into(),
            timeout_secs: None,
            scheduler,
            bus,
            memo_inbox: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn with_memo_inbox(mut self, inbox: PathBuf) -> Self {
        self.memo_inbox = Some(inbox);
        self
    }

    fn decline(&self, envelope: &Envelope, reason: String) -> ActionResult {
        let event = Event::ActionDeclined {
            action: format!("spawn-{}", self.role),
            role: self.role.clone(),
            reason: reason.clone(),
        };
        let follow_up = envelope.follow_up(event, envelope.epoch_ms);
        if self.bus.try_send(follow_up).is_err() {
            tracing::warn!("bus full, dropping action.declined");
        }
        ActionResult::Declined { reason }
    }
}

#[async_trait]
impl<C: Clock + 'static> Action for SpawnAgentAction<C> {
    fn name(&self) -> &str {
        "spawn-agent"
    }

    async fn execute(&self, envelope: &Envelope) -> ActionResult {
        let mut context = payload_context(envelope);

        // Memo consumption is an atomic load-and-clear: after this point the
        // filesystem itself says "nothing pending", so a restart cannot
        // re-fire. The prompt is built from what was actually drained, not
        // from the (possibly stale) event payload.
        if let Some(inbox) = &self.memo_inbox {
            if matches!(envelope.event, Event::MemoPresent { .. }) {
                let drained = match memo::drain_inbox(inbox) {
                    Ok(memos) => memos,
                    Err(err) => {
                        return ActionResult::Failed {
                            reason: format!("memo drain failed: {err}"),
                        }
                    }
                };
                if drained.is_empty() {
                    return ActionResult::Declined {
                        reason: "inbox already drained".to_string(),
                    };
                }
                let rendered: String = drained
                    .iter()
                    .map(|m| {
                        format!(
                            "- [{}] {} {}: {}\n",
                            m.id,
                            m.at,
                            m.author.as_deref().unwrap_or("unknown"),
                            m.body
                        )
                    })
                    .collect();
                context.insert("memos".to_string(), rendered);
            }
        }

        let prompt = substitute(&self.prompt_template, &context);
        let mut task = AgentTask::new(self.role.clone(), &self.engine, prompt);
        task.issue_id = envelope.event.issue_id().cloned();
        task.timeout_secs = self.timeout_secs;
        task.metadata.insert(
            "correlation_id".to_string(),
            envelope.correlation_id.to_string(),
        );
        if let Event::SessionFailed { session_id, .. } = &envelope.event {
            task.metadata
                .insert("autopsy_of".to_string(), session_id.to_string());
        }

        match self.scheduler.schedule(task) {
            Ok(session_id) => {
                tracing::info!(
                    session_id = %session_id,
                    role = %self.role,
                    correlation_id = %envelope.correlation_id,
                    "agent scheduled"
                );
                ActionResult::Completed
            }
            Err(err @ SchedulerError::QuotaExhausted { .. }) => {
                self.decline(envelope, err.to_string())
            }
            Err(err @ SchedulerError::IssueBusy { .. }) => self.decline(envelope, err.to_string()),
            Err(err) => ActionResult::Failed {
                reason: err.to_string(),
            },
        }
    }
}

/// Generic external-process action.
pub struct RunCommandAction {
    name: String,
    program: String,
    /// Each arg is templated against the payload
    args: Vec<String>,
    cwd: PathBuf,
    timeout: Duration,
}

impl RunCommandAction {
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        args: Vec<String>,
        cwd: PathBuf,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
            cwd,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Action for RunCommandAction {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, envelope: &Envelope) -> ActionResult {
        let context = payload_context(envelope);
        let mut cmd = tokio::process::Command::new(&self.program);
        for arg in &self.args {
            cmd.arg(substitute(arg, &context));
        }
        cmd.current_dir(&self.cwd);

        match monoco_adapters::run_with_timeout(cmd, self.timeout, &self.name).await {
            Ok(output) if output.status.success() => ActionResult::Completed,
            Ok(output) => ActionResult::Failed {
                reason: format!(
                    "{} exited {}: {}",
                    self.program,
                    output.status.code().unwrap_or(-1),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            },
            Err(message) => ActionResult::Failed { reason: message },
        }
    }
}

const ARCHITECT_MEMO_PROMPT: &str = "You are the Architect. New memos arrived in the inbox:\n\n{memos}\nTriage them: create draft issue tickets for actionable ideas and fold the rest into existing tickets where they belong.";

const ARCHITECT_TASK_PROMPT: &str = "You are the Architect. A new task line landed in tasks.md:\n\n{line}\n\nDesign the work: create or update draft issue tickets covering it.";

const ENGINEER_PROMPT: &str = "You are the Engineer for issue {id}. Its stage just moved to doing. Implement the ticket inside its isolation worktree, keep the files list honest, and submit the issue for review when the work passes.";

const REVIEWER_PROMPT: &str = "You are the Reviewer. Pull request branch {branch} ({title}) awaits review. Inspect the diff against trunk and record your verdict on the associated issue.";

const CORONER_PROMPT: &str = "You are the Coroner. Agent session {session_id} (role {role}) failed: {reason}\n\nLog tail:\n{log_tail}\nPerform the autopsy: identify the cause and leave a concrete fix suggestion, annotating issue {issue_id} if one is set.";

const PRIME_PROMPT: &str = "You are Prime, the inbound chat handler. Provider {provider}, chat session {session_id}. The debounced window carried:\n\n{text}\n\nAct on the request and reply through a draft outbound message.";

fn spawn_binding<C: Clock + 'static>(
    role: Role,
    builtin_prompt: &str,
    config: &ProjectConfig,
    scheduler: &AgentScheduler<C>,
    bus: &mpsc::Sender<Envelope>,
) -> SpawnAgentAction<C> {
    let template = config.prompt_for(&role).unwrap_or(builtin_prompt).to_string();
    SpawnAgentAction::new(
        role.clone(),
        config.engine_for(&role),
        template,
        scheduler.clone(),
        bus.clone(),
    )
    .with_timeout(config.timeout_for(&role))
}

/// The routing table the daemon ships with.
pub fn default_bindings<C: Clock + 'static>(
    scheduler: &AgentScheduler<C>,
    config: &ProjectConfig,
    paths: &ProjectPaths,
    bus: &mpsc::Sender<Envelope>,
) -> Router {
    let mut router = Router::new();

    router.bind(
        "memo.present",
        Condition::Always,
        Arc::new(
            spawn_binding(Role::Architect, ARCHITECT_MEMO_PROMPT, config, scheduler, bus)
                .with_memo_inbox(paths.memo_inbox()),
        ),
    );

    router.bind(
        "issue.field_changed",
        Condition::All(vec![
            Condition::field_equals("field", "stage"),
            Condition::field_equals("new", "doing"),
        ]),
        Arc::new(spawn_binding(
            Role::Engineer,
            ENGINEER_PROMPT,
            config,
            scheduler,
            bus,
        )),
    );

    router.bind(
        "task.added",
        Condition::Always,
        Arc::new(spawn_binding(
            Role::Architect,
            ARCHITECT_TASK_PROMPT,
            config,
            scheduler,
            bus,
        )),
    );

    router.bind(
        "pr.created",
        Condition::Always,
        Arc::new(spawn_binding(
            Role::Reviewer,
            REVIEWER_PROMPT,
            config,
            scheduler,
            bus,
        )),
    );

    // The autopsy path: any failure except the Coroner's own
    router.bind(
        "session.failed",
        Condition::Not(Box::new(Condition::field_equals("role", "coroner"))),
        Arc::new(spawn_binding(
            Role::Coroner,
            CORONER_PROMPT,
            config,
            scheduler,
            bus,
        )),
    );

    router.bind(
        "mailbox.inbound.ready",
        Condition::Any(vec![
            Condition::field_matches("text", "^/"),
            Condition::field_equals("mentioned", true),
        ]),
        Arc::new(spawn_binding(
            Role::Prime,
            PRIME_PROMPT,
            config,
            scheduler,
            bus,
        )),
    );

    router
}

#[cfg(test)]
#[path = "actions_tests.rs"]
mod tests;
