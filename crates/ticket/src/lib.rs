// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! monoco-ticket: on-disk entity formats
//!
//! Everything Monoco tracks is content-on-disk first: issues are Markdown
//! files with a YAML preamble, memos are blocks in one inbox file, mailbox
//! messages are YAML+Markdown files. This crate owns parsing and rendering
//! of those formats, including the `extras` passthrough that keeps unknown
//! preamble keys intact across read/write round-trips.

pub mod config;
pub mod frontmatter;
pub mod issue;
pub mod lint;
pub mod mail;
pub mod memo;
pub mod paths;
pub mod slug;

pub use config::{HttpConfig, MailboxConfig, ProjectConfig, RoleConfig};
pub use frontmatter::Document;
pub use issue::{
    find_issue, next_issue_id, scan_issues, Criticality, Isolation, IsolationType, Issue,
    IssueType, Solution, Stage, Status,
};
pub use lint::{lint_issue, LintViolation};
pub use mail::{
    artifact_hash, Artifact, Direction, MailMessage, MailSession, MailStatus, Mention,
    MentionType, Participants,
};
pub use memo::{drain_inbox, parse_inbox, render_memo};
pub use paths::ProjectPaths;
pub use slug::slugify;

use std::path::PathBuf;
use thiserror::Error;

/// Errors from parsing or validating on-disk entities.
#[derive(Debug, Error)]
pub enum TicketError {
    #[error("missing YAML front matter (expected leading '---' fence)")]
    MissingPreamble,

    #[error("unterminated YAML front matter (no closing '---' fence)")]
    UnterminatedPreamble,

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid {field}: expected {expected}")]
    Validation { field: String, expected: String },

    #[error("unknown issue id: {0}")]
    UnknownIssue(String),

    #[error("config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Storage(#[from] monoco_storage::StorageError),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TicketError {
    pub(crate) fn validation(field: &str, expected: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            expected: expected.into(),
        }
    }
}

impl monoco_core::error::Classified for TicketError {
    fn class(&self) -> monoco_core::ErrorClass {
        match self {
            TicketError::Config { .. } => monoco_core::ErrorClass::Fatal,
            TicketError::Storage(e) => e.class(),
            TicketError::Io { .. } => monoco_core::ErrorClass::TransientIo,
            _ => monoco_core::ErrorClass::Validation,
        }
    }
}
