// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook dispatch
//!
//! Applicable hooks run sequentially in priority order until one returns a
//! terminal decision: any deny, or an allow carrying mutations (reason,
//! message, or metadata). Async hooks are fire-and-forget. A sync hook that
//! exceeds its timeout, or cannot run at all, denies: interception points
//! fail closed, with the reason propagated to the caller.

use crate::def::{HookDef, HookType};
use monoco_core::HookDecision;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// One interception point invocation.
#[derive(Debug, Clone)]
pub struct HookSite {
    pub hook_type: HookType,
    /// Unified event name
    pub event: String,
    /// Agent provider for `type: agent` sites
    pub provider: Option<String>,
    /// Tool name, matched against hook matchers
    pub tool: Option<String>,
}

impl HookSite {
    pub fn issue(event: &str) -> Self {
        Self {
            hook_type: HookType::Issue,
            event: event.to_string(),
            provider: None,
            tool: None,
        }
    }

    pub fn agent(event: &str, provider: &str, tool: Option<&str>) -> Self {
        Self {
            hook_type: HookType::Agent,
            event: event.to_string(),
            provider: Some(provider.to_string()),
            tool: tool.map(String::from),
        }
    }

    pub fn git(event: &str) -> Self {
        Self {
            hook_type: HookType::Git,
            event: event.to_string(),
            provider: None,
            tool: None,
        }
    }
}

/// Dispatches discovered hooks at each call site.
#[derive(Debug, Clone, Default)]
pub struct HookEngine {
    hooks: Vec<HookDef>,
    /// Whether `ask` can reach a human; false degrades ask to deny
    interactive: bool,
}

impl HookEngine {
    pub fn new(hooks: Vec<HookDef>) -> Self {
        Self {
            hooks,
            interactive: false,
        }
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Hooks applicable to a site, priority-sorted (higher first, discovery
    /// order breaking ties).
    pub fn applicable(&self, site: &HookSite) -> Vec<&HookDef> {
        let mut applicable: Vec<&HookDef> = self
            .hooks
            .iter()
            .filter(|h| h.hook_type == site.hook_type)
            .filter(|h| h.event == site.event)
            .filter(|h| match (&h.provider, &site.provider) {
                (None, _) => true,
                (Some(_), None) => false,
                (Some(hook_provider), Some(site_provider)) => hook_provider == site_provider,
            })
            .filter(|h| h.matches_tool(site.tool.as_deref()))
            .collect();
        applicable.sort_by_key(|h| std::cmp::Reverse(h.priority));
        applicable
    }

    /// Run the applicable chain for a site.
    pub async fn dispatch(&self, site: &HookSite, payload: &serde_json::Value) -> HookDecision {
        for hook in self.applicable(site) {
            if hook.run_async {
                spawn_async_hook(hook.clone(), site.clone(), payload.clone());
                continue;
            }

            let mut decision = run_sync_hook(hook, site, payload).await;
            if !self.interactive {
                decision = decision.degrade_ask();
            }

            if decision.is_deny() {
                tracing::info!(
                    hook = %hook.path.display(),
                    event = %site.event,
                    reason = decision.reason.as_deref().unwrap_or(""),
                    "hook denied operation"
                );
                return decision;
            }

            // An allow that mutates state (context injection, message) is
            // terminal; a bare allow lets the chain continue.
            let has_mutations = decision.reason.is_some()
                || decision.message.is_some()
                || !decision.metadata.is_empty();
            if has_mutations {
                return decision;
            }
        }
        HookDecision::allow()
    }
}

fn spawn_async_hook(hook: HookDef, site: HookSite, payload: serde_json::Value) {
    tokio::spawn(async move {
        let decision = run_sync_hook(&hook, &site, &payload).await;
        tracing::debug!(
            hook = %hook.path.display(),
            event = %site.event,
            decision = ?decision.decision,
            "async hook finished (result discarded)"
        );
    });
}

/// Run one hook script: payload JSON on stdin, decision JSON on stdout.
///
/// Exit-code convention: 0 = allow, 2 = deny; a parseable decision on
/// stdout overrides the exit code.
async fn run_sync_hook(
    hook: &HookDef,
    site: &HookSite,
    payload: &serde_json::Value,
) -> HookDecision {
    let timeout = Duration::from_secs(hook.timeout_secs);

    let mut cmd = tokio::process::Command::new(&hook.path);
    cmd.env("MONOCO_HOOK_EVENT", &site.event)
        .env("MONOCO_HOOK_TOOL", site.tool.as_deref().unwrap_or(""))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            return HookDecision::deny(format!(
                "hook {} failed to run: {err}",
                hook.path.display()
            ));
        }
    };

    if let Some(mut stdin) = child.stdin.take() {
        let body = payload.to_string();
        if let Err(err) = stdin.write_all(body.as_bytes()).await {
            tracing::debug!(hook = %hook.path.display(), error = %err, "hook stdin write failed");
        }
        drop(stdin);
    }

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => {
            return HookDecision::deny(format!(
                "hook {} failed to run: {err}",
                hook.path.display()
            ));
        }
        Err(_elapsed) => return HookDecision::deny("hook timeout"),
    };

    // Stdout decision JSON wins over the exit code
    let stdout = String::from_utf8_lossy(&output.stdout);
    let trimmed = stdout.trim();
    if !trimmed.is_empty() {
        if let Ok(decision) = serde_json::from_str::<HookDecision>(trimmed) {
            return decision;
        }
    }

    match output.status.code() {
        Some(0) => HookDecision::allow(),
        Some(2) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = if stderr.trim().is_empty() {
                format!("denied by {}", hook.path.display())
            } else {
                stderr.trim().to_string()
            };
            HookDecision::deny(reason)
        }
        code => HookDecision::deny(format!(
            "hook {} exited {}",
            hook.path.display(),
            code.map(|c| c.to_string()).unwrap_or_else(|| "by signal".to_string())
        )),
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
