// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action router
//!
//! A small registry mapping event names to (condition, action) bindings.
//! Conditions are Boolean combinators over payload fields; actions are
//! pluggable. The router is a bus subscriber: it never blocks the
//! publisher, and a failing action fails loudly into the log, never
//! silently.

use async_trait::async_trait;
use monoco_core::Envelope;
use regex::Regex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Boolean combinators over payload fields.
#[derive(Debug, Clone)]
pub enum Condition {
    Always,
    /// `field == value` (JSON equality)
    FieldEquals {
        field: String,
        value: serde_json::Value,
    },
    /// `field matches regex` (string fields only)
    FieldMatches { field: String, pattern: Regex },
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn field_equals(field: &str, value: impl Into<serde_json::Value>) -> Self {
        Condition::FieldEquals {
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Panics never: a bad pattern becomes a never-matching condition.
    pub fn field_matches(field: &str, pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(re) => Condition::FieldMatches {
                field: field.to_string(),
                pattern: re,
            },
            Err(err) => {
                tracing::error!(pattern, error = %err, "invalid routing regex, condition will never match");
                Condition::Not(Box::new(Condition::Always))
            }
        }
    }

    pub fn eval(&self, envelope: &Envelope) -> bool {
        match self {
            Condition::Always => true,
            Condition::FieldEquals { field, value } => envelope
                .event
                .field(field)
                .map(|actual| actual == *value)
                .unwrap_or(false),
            Condition::FieldMatches { field, pattern } => envelope
                .event
                .field(field)
                .and_then(|v| v.as_str().map(String::from))
                .map(|s| pattern.is_match(&s))
                .unwrap_or(false),
            Condition::All(conditions) => conditions.iter().all(|c| c.eval(envelope)),
            Condition::Any(conditions) => conditions.iter().any(|c| c.eval(envelope)),
            Condition::Not(condition) => !condition.eval(envelope),
        }
    }
}

/// Outcome of one action invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    Completed,
    /// The action chose not to run (quota, busy issue, empty signal)
    Declined { reason: String },
    Failed { reason: String },
}

/// A routable action.
#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &str;

    /// Cheap precondition; `execute` is skipped when false.
    fn can_execute(&self, _envelope: &Envelope) -> bool {
        true
    }

    async fn execute(&self, envelope: &Envelope) -> ActionResult;
}

/// One registered route.
pub struct Binding {
    pub event: String,
    pub condition: Condition,
    pub action: Arc<dyn Action>,
}

/// The routing table. Enumerate → filter by condition → invoke.
#[derive(Default)]
pub struct Router {
    bindings: Vec<Binding>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, event: &str, condition: Condition, action: Arc<dyn Action>) {
        self.bindings.push(Binding {
            event: event.to_string(),
            condition,
            action,
        });
    }

    pub fn with_bindings(bindings: Vec<Binding>) -> Self {
        Self { bindings }
    }

    /// Route one envelope; returns how many actions ran.
    pub async fn route(&self, envelope: &Envelope) -> usize {
        let mut ran = 0;
        for binding in &self.bindings {
            if binding.event != envelope.event.name() {
                continue;
            }
            if !binding.condition.eval(envelope) {
                continue;
            }
            if !binding.action.can_execute(envelope) {
                tracing::debug!(
                    action = binding.action.name(),
                    event = %envelope.event.name(),
                    "action precondition false, skipping"
                );
                continue;
            }

            ran += 1;
            let result = binding.action.execute(envelope).await;
            match &result {
                ActionResult::Completed => {
                    tracing::info!(
                        action = binding.action.name(),
                        event = %envelope.event.name(),
                        correlation_id = %envelope.correlation_id,
                        "action completed"
                    );
                }
                ActionResult::Declined { reason } => {
                    tracing::warn!(
                        action = binding.action.name(),
                        event = %envelope.event.name(),
                        reason,
                        "action declined"
                    );
                }
                ActionResult::Failed { reason } => {
                    tracing::error!(
                        action = binding.action.name(),
                        event = %envelope.event.name(),
                        reason,
                        "action failed"
                    );
                }
            }
        }
        ran
    }

    /// Run as a bus subscriber until the channel closes.
    pub fn spawn(self: Arc<Self>, mut rx: mpsc::Receiver<Envelope>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                self.route(&envelope).await;
            }
        })
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
