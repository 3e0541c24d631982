// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook definitions and header parsing
//!
//! A hook file stays directly executable: its metadata lives as YAML inside
//! the first `#` comment block, between `---` fences:
//!
//! ```text
//! #!/bin/sh
//! # ---
//! # type: issue
//! # event: pre-submit
//! # priority: 10
//! # ---
//! exec my-linter "$@"
//! ```

use crate::HookError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Which call-site family a hook attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookType {
    Git,
    Ide,
    Agent,
    Issue,
}

/// Raw header as written in the file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Header {
    #[serde(rename = "type")]
    hook_type: HookType,
    event: String,
    #[serde(default)]
    matcher: Option<String>,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    priority: i32,
    #[serde(default, rename = "async")]
    run_async: bool,
    #[serde(default = "default_timeout")]
    timeout: u64,
}

fn default_timeout() -> u64 {
    30
}

/// One discovered hook.
#[derive(Debug, Clone, PartialEq)]
pub struct HookDef {
    pub hook_type: HookType,
    /// Unified event name (`before-tool`, `pre-submit`, `pre-commit`, ...)
    pub event: String,
    pub matcher: Option<String>,
    pub provider: Option<String>,
    /// Higher runs first
    pub priority: i32,
    /// Fire-and-forget; no return-value effect
    pub run_async: bool,
    /// Synchronous timeout in seconds; async hooks ignore it
    pub timeout_secs: u64,
    pub path: PathBuf,
}

impl HookDef {
    /// Parse the header out of a script's text.
    pub fn parse(path: &Path, text: &str) -> Result<Self, HookError> {
        let yaml = extract_comment_yaml(text).ok_or_else(|| HookError::MissingHeader(path.to_path_buf()))?;
        let header: Header =
            serde_yaml::from_str(&yaml).map_err(|err| HookError::BadHeader {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;

        if header.hook_type == HookType::Agent && header.provider.is_none() {
            return Err(HookError::BadHeader {
                path: path.to_path_buf(),
                message: "agent hooks require a provider".to_string(),
            });
        }

        Ok(Self {
            hook_type: header.hook_type,
            event: header.event,
            matcher: header.matcher,
            provider: header.provider,
            priority: header.priority,
            run_async: header.run_async,
            timeout_secs: header.timeout,
            path: path.to_path_buf(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, HookError> {
        let text = std::fs::read_to_string(path).map_err(|source| HookError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    /// Whether this hook applies to the given tool name.
    pub fn matches_tool(&self, tool: Option<&str>) -> bool {
        match (&self.matcher, tool) {
            (None, _) => true,
            (Some(_), None) => true,
            (Some(pattern), Some(tool)) => crate::glob_match(pattern, tool),
        }
    }
}

/// Pull the YAML between `---` fences out of the first comment block.
fn extract_comment_yaml(text: &str) -> Option<String> {
    let mut yaml = String::new();
    let mut in_fence = false;
    let mut seen_comment = false;

    for line in text.lines() {
        if line.starts_with("#!") && !seen_comment {
            continue; // shebang
        }
        let Some(stripped) = line.strip_prefix('#') else {
            // First comment block ended
            if seen_comment {
                break;
            }
            continue;
        };
        seen_comment = true;
        let content = stripped.strip_prefix(' ').unwrap_or(stripped);

        if content.trim_end() == "---" {
            if in_fence {
                return Some(yaml);
            }
            in_fence = true;
            continue;
        }
        if in_fence {
            yaml.push_str(content);
            yaml.push('\n');
        }
    }
    None
}

#[cfg(test)]
#[path = "def_tests.rs"]
mod tests;
