// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue lint checks
//!
//! The structural invariants every issue must satisfy. Invoked from the
//! pre-submit hook chain, the HTTP PATCH gate, and the `lint` verb.

use crate::issue::{Issue, IssueType, Status};
use std::collections::HashSet;
use std::path::Path;

/// One lint finding; `field` is the preamble path it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintViolation {
    pub field: String,
    pub message: String,
}

impl LintViolation {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for LintViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Directory component the file actually sits in, accounting for the
/// `archived/<year>/` nesting.
fn status_dir_of(path: &Path) -> Option<String> {
    let parent = path.parent()?;
    let name = parent.file_name()?.to_string_lossy();
    if name.chars().all(|c| c.is_ascii_digit()) && name.len() == 4 {
        // archived/<year>/<file>
        let grand = parent.parent()?.file_name()?.to_string_lossy();
        return Some(grand.to_string());
    }
    Some(name.to_string())
}

/// Lint one issue against its location and the set of known issue ids.
pub fn lint_issue(issue: &Issue, path: &Path, known_ids: &HashSet<String>) -> Vec<LintViolation> {
    let mut violations = Vec::new();

    // Id prefix must agree with the declared type
    if IssueType::from_id(&issue.id) != Some(issue.issue_type) {
        violations.push(LintViolation::new(
            "id",
            format!(
                "prefix {} does not match type {:?}",
                issue.id.prefix(),
                issue.issue_type
            ),
        ));
    }

    // Directory location must equal status
    match status_dir_of(path) {
        Some(dir) if dir == issue.status.dir_name() => {}
        Some(dir) => violations.push(LintViolation::new(
            "status",
            format!("file sits in {dir:?} but status is {}", issue.status),
        )),
        None => violations.push(LintViolation::new("status", "file has no parent directory")),
    }

    // Closed requires a solution; everything else forbids one
    match (issue.status, issue.solution) {
        (Status::Closed, None) => violations.push(LintViolation::new(
            "solution",
            "closed issue must carry a solution",
        )),
        (status, Some(solution)) if status != Status::Closed => {
            violations.push(LintViolation::new(
                "solution",
                format!("{solution:?} set while status is {status}"),
            ))
        }
        _ => {}
    }

    // Dependencies must resolve to existing issues
    for dep in &issue.dependencies {
        if !known_ids.contains(dep.as_str()) {
            violations.push(LintViolation::new(
                "dependencies",
                format!("{dep} does not resolve to an existing issue"),
            ));
        }
    }

    // The files list must not claim the ticket itself
    let own_name = issue.file_name();
    if issue.files.iter().any(|f| f.ends_with(&own_name)) {
        violations.push(LintViolation::new(
            "files",
            "the issue ticket file must not appear in its own files list",
        ));
    }

    violations
}

#[cfg(test)]
#[path = "lint_tests.rs"]
mod tests;
