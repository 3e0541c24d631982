// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue tickets on disk
//!
//! An issue is one Markdown file with a YAML preamble, living under
//! `Issues/<PluralType>/<status>/<id>-<slug>.md`. The directory encodes the
//! status; moving the file IS the status transition.

use crate::frontmatter;
use crate::slug::{slugify, MAX_SLUG_LEN};
use crate::TicketError;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use monoco_core::IssueId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Ticket kind; determines the id prefix and the plural directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Epic,
    Feature,
    Fix,
    Chore,
}

impl IssueType {
    pub fn id_prefix(self) -> &'static str {
        match self {
            IssueType::Epic => "EPIC",
            IssueType::Feature => "FEAT",
            IssueType::Fix => "FIX",
            IssueType::Chore => "CHORE",
        }
    }

    pub fn plural_dir(self) -> &'static str {
        match self {
            IssueType::Epic => "Epics",
            IssueType::Feature => "Features",
            IssueType::Fix => "Fixes",
            IssueType::Chore => "Chores",
        }
    }

    pub fn from_id(id: &IssueId) -> Option<Self> {
        match id.prefix() {
            "EPIC" => Some(IssueType::Epic),
            "FEAT" => Some(IssueType::Feature),
            "FIX" => Some(IssueType::Fix),
            "CHORE" => Some(IssueType::Chore),
            _ => None,
        }
    }

    pub fn all() -> [IssueType; 4] {
        [
            IssueType::Epic,
            IssueType::Feature,
            IssueType::Fix,
            IssueType::Chore,
        ]
    }
}

/// Where the issue lives; must always equal its parent directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Open,
    Closed,
    Backlog,
    Archived,
}

impl Status {
    pub fn dir_name(self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::Closed => "closed",
            Status::Backlog => "backlog",
            Status::Archived => "archived",
        }
    }

    /// Statuses shown by default list views (archived is excluded).
    pub fn default_views() -> [Status; 3] {
        [Status::Open, Status::Closed, Status::Backlog]
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// Workflow stage within a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Draft,
    Todo,
    Doing,
    Review,
    Done,
    Freezed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Draft => "draft",
            Stage::Todo => "todo",
            Stage::Doing => "doing",
            Stage::Review => "review",
            Stage::Done => "done",
            Stage::Freezed => "freezed",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Terminal marker; set only when closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Solution {
    Implemented,
    Cancelled,
    Wontfix,
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationType {
    Branch,
    Worktree,
}

/// Present after `start`: names the branch/worktree the work happens on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Isolation {
    #[serde(rename = "type")]
    pub isolation_type: IsolationType,
    #[serde(rename = "ref")]
    pub ref_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub created_at: NaiveDateTime,
}

/// One issue ticket: typed preamble plus Markdown body.
///
/// Unknown preamble keys land in `extras` and survive round-trips; tools
/// newer than this daemon may rely on their own keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub status: Status,
    pub stage: Stage,
    pub title: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<IssueId>,
    #[serde(default)]
    pub dependencies: Vec<IssueId>,
    #[serde(default)]
    pub related: Vec<IssueId>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Scope of the merge at close; refreshed by sync-files
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isolation: Option<Isolation>,
    #[serde(default)]
    pub criticality: Criticality,
    /// Serialized even when null; `solution: null` is part of the format
    pub solution: Option<Solution>,
    #[serde(flatten)]
    pub extras: IndexMap<String, serde_yaml::Value>,
    #[serde(skip)]
    pub body: String,
}

impl Issue {
    pub fn new(id: IssueId, issue_type: IssueType, title: impl Into<String>, now: NaiveDateTime) -> Self {
        Self {
            id,
            issue_type,
            status: Status::Open,
            stage: Stage::Draft,
            title: title.into(),
            created_at: now,
            updated_at: now,
            parent: None,
            dependencies: Vec::new(),
            related: Vec::new(),
            domains: Vec::new(),
            tags: Vec::new(),
            files: Vec::new(),
            isolation: None,
            criticality: Criticality::Medium,
            solution: None,
            extras: IndexMap::new(),
            body: String::new(),
        }
    }

    /// Parse an issue document.
    pub fn parse(text: &str) -> Result<Self, TicketError> {
        let (mut issue, body): (Issue, String) = frontmatter::parse(text)?;
        issue.body = body;
        Ok(issue)
    }

    /// Render back to a document, preamble first.
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

    /// Persist atomically (write-temp-rename).
    pub fn save(&self, path: &Path) -> Result<(), TicketError> {
        let text = self.render()?;
        monoco_storage::write_atomic(path, text.as_bytes())?;
        Ok(())
    }

    /// `<id>-<slug>.md`
    pub fn file_name(&self) -> String {
        let slug = slugify(&self.title, MAX_SLUG_LEN);
        if slug.is_empty() {
            format!("{}.md", self.id)
        } else {
            format!("{}-{}.md", self.id, slug)
        }
    }

    /// Directory this issue belongs in, per its type and status.
    pub fn expected_dir(&self, issues_root: &Path) -> PathBuf {
        issues_root
            .join(self.issue_type.plural_dir())
            .join(self.status.dir_name())
    }

    /// Full expected path under the issues root.
    pub fn expected_path(&self, issues_root: &Path) -> PathBuf {
        self.expected_dir(issues_root).join(self.file_name())
    }

    pub fn touch(&mut self, now: NaiveDateTime) {
        self.updated_at = now;
    }
}

/// Walk the issues tree, yielding `(path, issue)` for everything that parses.
///
/// Files that fail to parse are skipped with a warning; a concurrent writer
/// may be mid-rename.
pub fn scan_issues(issues_root: &Path) -> Vec<(PathBuf, Issue)> {
    let mut found = Vec::new();
    let mut stack = vec![issues_root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|e| e.to_str()) == Some("md") {
                match Issue::load(&path) {
                    Ok(issue) => found.push((path, issue)),
                    Err(err) => {
                        tracing::debug!(path = %path.display(), error = %err, "skipping unparseable issue file");
                    }
                }
            }
        }
    }
    found.sort_by(|(a, _), (b, _)| a.cmp(b));
    found
}

/// Locate an issue file by id anywhere under the issues root.
pub fn find_issue(issues_root: &Path, id: &IssueId) -> Option<PathBuf> {
    let prefix = format!("{id}");
    scan_issues(issues_root)
        .into_iter()
        .find(|(path, issue)| {
            issue.id == *id
                || path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(&prefix))
                    .unwrap_or(false)
        })
        .map(|(path, _)| path)
}

/// Allocate the next free number for an issue type by scanning existing ids.
pub fn next_issue_id(issues_root: &Path, issue_type: IssueType) -> IssueId {
    let prefix = issue_type.id_prefix();
    let max = scan_issues(issues_root)
        .into_iter()
        .filter(|(_, issue)| issue.id.prefix() == prefix)
        .map(|(_, issue)| issue.id.number())
        .max()
        .unwrap_or(0);
    IssueId::from_parts(prefix, max + 1)
}

#[cfg(test)]
#[path = "issue_tests.rs"]
mod tests;
