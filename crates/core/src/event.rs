// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types for the Monoco orchestration engine
//!
//! Serializes with `{"type": "issue.field_changed", ...fields}` format;
//! the dotted names are the bus topic names. Unknown type tags deserialize
//! to `Custom` for forward compatibility.

use crate::id::{CorrelationId, IssueId, MemoId, MessageId, SessionId};
use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One parsed memo block carried by `memo.present`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoEntry {
    pub id: MemoId,
    /// Timestamp string from the block header, as written
    pub at: String,
    /// Author from the `**From**:` line, if present
    #[serde(default)]
    pub author: Option<String>,
    pub body: String,
}

/// Events that flow over the in-process bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- issue --
    #[serde(rename = "issue.created")]
    IssueCreated { id: IssueId, path: PathBuf },

    #[serde(rename = "issue.deleted")]
    IssueDeleted { id: IssueId, path: PathBuf },

    /// A YAML preamble field's value transitioned (old → new).
    ///
    /// Only emitted for actual value differences; stage changes drive
    /// engineer scheduling.
    #[serde(rename = "issue.field_changed")]
    IssueFieldChanged {
        id: IssueId,
        path: PathBuf,
        field: String,
        old: serde_json::Value,
        new: serde_json::Value,
    },

    // -- memo --
    /// The memo inbox contains at least one block.
    ///
    /// Presence is the entire signal; there is no per-memo status.
    #[serde(rename = "memo.present")]
    MemoPresent { memos: Vec<MemoEntry> },

    // -- task --
    #[serde(rename = "task.added")]
    TaskAdded { line: String, path: PathBuf },

    // -- pr --
    #[serde(rename = "pr.created")]
    PrCreated {
        branch: String,
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issue_id: Option<IssueId>,
    },

    // -- mailbox --
    /// One debounce window's worth of inbound messages for a chat thread.
    #[serde(rename = "mailbox.inbound.ready")]
    MailboxInboundReady {
        provider: String,
        session_id: String,
        /// Aggregated over the debounce window, oldest first
        message_ids: Vec<MessageId>,
        paths: Vec<PathBuf>,
        /// Concatenated body text, used by routing conditions
        #[serde(default)]
        text: String,
        /// True when the bot was @-mentioned in any message of the window
        #[serde(default)]
        mentioned: bool,
    },

    // -- session --
    #[serde(rename = "session.created")]
    SessionCreated {
        session_id: SessionId,
        role: Role,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issue_id: Option<IssueId>,
    },

    #[serde(rename = "session.completed")]
    SessionCompleted {
        session_id: SessionId,
        role: Role,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issue_id: Option<IssueId>,
        exit_code: i32,
    },

    #[serde(rename = "session.failed")]
    SessionFailed {
        session_id: SessionId,
        role: Role,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issue_id: Option<IssueId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
        reason: String,
        /// Tail of the session log, fed into the Coroner prompt
        #[serde(default)]
        log_tail: String,
    },

    #[serde(rename = "session.timeout")]
    SessionTimeout {
        session_id: SessionId,
        role: Role,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issue_id: Option<IssueId>,
    },

    #[serde(rename = "session.terminated")]
    SessionTerminated {
        session_id: SessionId,
        role: Role,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issue_id: Option<IssueId>,
    },

    // -- action --
    /// A routed action declined to run (quota overflow, failed precondition).
    #[serde(rename = "action.declined")]
    ActionDeclined {
        action: String,
        role: Role,
        reason: String,
    },

    // -- system --
    #[serde(rename = "system.shutdown")]
    Shutdown,

    /// Catch-all for unknown event types (extensibility)
    #[serde(other, skip_serializing)]
    Custom,
}

impl Event {
    /// The bus topic name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Event::IssueCreated { .. } => "issue.created",
            Event::IssueDeleted { .. } => "issue.deleted",
            Event::IssueFieldChanged { .. } => "issue.field_changed",
            Event::MemoPresent { .. } => "memo.present",
            Event::TaskAdded { .. } => "task.added",
            Event::PrCreated { .. } => "pr.created",
            Event::MailboxInboundReady { .. } => "mailbox.inbound.ready",
            Event::SessionCreated { .. } => "session.created",
            Event::SessionCompleted { .. } => "session.completed",
            Event::SessionFailed { .. } => "session.failed",
            Event::SessionTimeout { .. } => "session.timeout",
            Event::SessionTerminated { .. } => "session.terminated",
            Event::ActionDeclined { .. } => "action.declined",
            Event::Shutdown => "system.shutdown",
            Event::Custom => "custom",
        }
    }

    /// The issue this event concerns, if any.
    pub fn issue_id(&self) -> Option<&IssueId> {
        match self {
            Event::IssueCreated { id, .. }
            | Event::IssueDeleted { id, .. }
            | Event::IssueFieldChanged { id, .. } => Some(id),
            Event::PrCreated { issue_id, .. }
            | Event::SessionCreated { issue_id, .. }
            | Event::SessionCompleted { issue_id, .. }
            | Event::SessionFailed { issue_id, .. }
            | Event::SessionTimeout { issue_id, .. }
            | Event::SessionTerminated { issue_id, .. } => issue_id.as_ref(),
            _ => None,
        }
    }

    /// Look up a payload field by dotted path against the serialized form.
    ///
    /// Router conditions address fields this way (`field`, `new`, `text`).
    pub fn field(&self, path: &str) -> Option<serde_json::Value> {
        let value = serde_json::to_value(self).ok()?;
        let mut cursor = &value;
        for part in path.split('.') {
            cursor = cursor.get(part)?;
        }
        Some(cursor.clone())
    }

    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            Event::IssueCreated { id, .. } | Event::IssueDeleted { id, .. } => {
                format!("{t} id={id}")
            }
            Event::IssueFieldChanged {
                id, field, old, new, ..
            } => format!("{t} id={id} field={field} {old}->{new}"),
            Event::MemoPresent { memos } => format!("{t} count={}", memos.len()),
            Event::TaskAdded { line, .. } => format!("{t} line={line:?}"),
            Event::PrCreated { branch, .. } => format!("{t} branch={branch}"),
            Event::MailboxInboundReady {
                provider,
                session_id,
                message_ids,
                ..
            } => format!(
                "{t} provider={provider} session={session_id} messages={}",
                message_ids.len()
            ),
            Event::SessionCreated {
                session_id, role, ..
            } => format!("{t} id={} role={role}", session_id.short(8)),
            Event::SessionCompleted {
                session_id,
                role,
                exit_code,
                ..
            } => format!("{t} id={} role={role} exit={exit_code}", session_id.short(8)),
            Event::SessionFailed {
                session_id,
                role,
                reason,
                ..
            } => format!("{t} id={} role={role} reason={reason}", session_id.short(8)),
            Event::SessionTimeout {
                session_id, role, ..
            }
            | Event::SessionTerminated {
                session_id, role, ..
            } => format!("{t} id={} role={role}", session_id.short(8)),
            Event::ActionDeclined {
                action,
                role,
                reason,
            } => format!("{t} action={action} role={role} reason={reason}"),
            Event::Shutdown | Event::Custom => t.to_string(),
        }
    }
}

/// Bus envelope: an event plus delivery metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub event: Event,
    /// Wall-clock milliseconds at publish time
    pub epoch_ms: u64,
    /// Threaded from the originating watcher through every downstream hop
    pub correlation_id: CorrelationId,
}

impl Envelope {
    pub fn new(event: Event, epoch_ms: u64) -> Self {
        Self {
            event,
            epoch_ms,
            correlation_id: CorrelationId::new(uuid::Uuid::new_v4().to_string()),
        }
    }

    /// Re-wrap a follow-up event under the same correlation id.
    pub fn follow_up(&self, event: Event, epoch_ms: u64) -> Self {
        Self {
            event,
            epoch_ms,
            correlation_id: self.correlation_id.clone(),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
