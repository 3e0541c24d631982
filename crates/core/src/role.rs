// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent role profiles

use std::time::Duration;

/// A named agent profile with its own concurrency quota and prompt defaults.
///
/// The built-ins cover the default routing table; projects may configure
/// additional roles, which round-trip as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    /// Designs issues from memos and tasks
    Architect,
    /// Implements a doing issue
    Engineer,
    /// Inspects a pull request
    Reviewer,
    /// Diagnoses a failed session
    Coroner,
    /// Handles inbound chat
    Prime,
    /// Project-defined role
    Custom(String),
}

impl Role {
    /// Canonical lowercase name used in config keys and session files.
    pub fn name(&self) -> &str {
        match self {
            Role::Architect => "architect",
            Role::Engineer => "engineer",
            Role::Reviewer => "reviewer",
            Role::Coroner => "coroner",
            Role::Prime => "prime",
            Role::Custom(name) => name,
        }
    }

    /// Parse a role name (case-insensitive for the built-ins).
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "architect" => Role::Architect,
            "engineer" => Role::Engineer,
            "reviewer" => Role::Reviewer,
            "coroner" => Role::Coroner,
            "prime" => Role::Prime,
            _ => Role::Custom(s.to_string()),
        }
    }

    /// Default concurrency cap when the project config does not override it.
    pub fn default_concurrency(&self) -> usize {
        match self {
            Role::Engineer => 2,
            _ => 1,
        }
    }

    /// Default wall-clock timeout for sessions of this role.
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(15 * 60)
    }

    pub fn builtin() -> [Role; 5] {
        [
            Role::Architect,
            Role::Engineer,
            Role::Reviewer,
            Role::Coroner,
            Role::Prime,
        ]
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl serde::Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> serde::Deserialize<'de> for Role {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Role::parse(&s))
    }
}

#[cfg(test)]
#[path = "role_tests.rs"]
mod tests;
