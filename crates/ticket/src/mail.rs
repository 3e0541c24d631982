// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mailbox message files
//!
//! One message is one `<timestamp>_<id>.md` file: YAML preamble (common to
//! inbound, outbound, archive, and dead-letter) plus Markdown body. The
//! timestamp prefix keeps directory listings time-sorted.

use crate::frontmatter;
use crate::TicketError;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use monoco_core::MessageId;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Delivery lifecycle for outbound, claim lifecycle bookkeeping for inbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailStatus {
    #[default]
    Pending,
    Sent,
    Failed,
    Dead,
}

/// Chat session the message belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailSession {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionType {
    User,
    All,
    Channel,
    Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    #[serde(rename = "type")]
    pub mention_type: MentionType,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Participants {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<Mention>,
}

impl Participants {
    /// Whether the bot (or everyone) was mentioned.
    pub fn mentions_bot(&self, bot: &str) -> bool {
        self.mentions.iter().any(|m| match m.mention_type {
            MentionType::All | MentionType::Channel => true,
            MentionType::User | MentionType::Role => m.target == bot,
        })
    }
}

/// Length of the content-addressed short hash used for artifact ids.
pub const ARTIFACT_HASH_LEN: usize = 7;

/// Short content hash identifying a blob in the global artifact store.
pub fn artifact_hash(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(ARTIFACT_HASH_LEN);
    for byte in digest.iter() {
        hex.push_str(&format!("{byte:02x}"));
        if hex.len() >= ARTIFACT_HASH_LEN {
            break;
        }
    }
    hex.truncate(ARTIFACT_HASH_LEN);
    hex
}

/// Reference to a content-addressed blob in the global artifact store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Short hash into the blob store
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Artifact {
    /// Whether a blob's contents match this reference.
    pub fn matches(&self, bytes: &[u8]) -> bool {
        self.id == artifact_hash(bytes) && self.size == bytes.len() as u64
    }
}

/// The common mailbox preamble plus body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailMessage {
    pub id: MessageId,
    pub provider: String,
    pub direction: Direction,
    pub content_type: String,
    pub created_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub status: MailStatus,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_retry_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub session: MailSession,
    #[serde(default)]
    pub participants: Participants,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
    #[serde(flatten)]
    pub extras: IndexMap<String, serde_yaml::Value>,
    #[serde(skip)]
    pub body: String,
}

impl MailMessage {
    pub fn parse(text: &str) -> Result<Self, TicketError> {
        let (mut message, body): (MailMessage, String) = frontmatter::parse(text)?;
        message.body = body;
        message.validate()?;
        Ok(message)
    }

    pub fn render(&self) -> Result<String, TicketError> {
        frontmatter::render(self, &self.body)
    }

    pub fn load(path: &Path) -> Result<Self, TicketError> {
        let text = std::fs::read_to_string(path).map_err(|source| TicketError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Persist atomically so a concurrent watcher never sees half a preamble.
    pub fn save(&self, path: &Path) -> Result<(), TicketError> {
        let text = self.render()?;
        monoco_storage::write_atomic(path, text.as_bytes())?;
        Ok(())
    }

    /// Schema validation beyond what serde enforces.
    pub fn validate(&self) -> Result<(), TicketError> {
        if self.id.as_str().is_empty() {
            return Err(TicketError::validation("id", "non-empty message id"));
        }
        if self.provider.is_empty() {
            return Err(TicketError::validation("provider", "non-empty provider"));
        }
        if self.session.id.is_empty() {
            return Err(TicketError::validation("session.id", "non-empty session id"));
        }
        if self.content_type.is_empty() {
            return Err(TicketError::validation(
                "content_type",
                "a MIME type such as text/markdown",
            ));
        }
        for (i, artifact) in self.artifacts.iter().enumerate() {
            if artifact.id.is_empty() {
                return Err(TicketError::validation(
                    &format!("artifacts[{i}].id"),
                    "content-addressed short hash",
                ));
            }
        }
        Ok(())
    }

    /// Time-sortable file name: `<compact-ISO>_<id>.md`.
    pub fn file_name(&self) -> String {
        format!("{}_{}.md", self.created_at.format("%Y%m%dT%H%M%S"), self.id)
    }
}

#[cfg(test)]
#[path = "mail_tests.rs"]
mod tests;
