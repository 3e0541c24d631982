// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration
//!
//! `.monoco/config.toml`. A missing file means defaults; a malformed file is
//! fatal at daemon start rather than silently half-applied.

use crate::{ProjectPaths, TicketError};
use monoco_core::Role;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Trunk branch; when unset, `main` with a fallback to `master`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trunk: Option<String>,

    #[serde(default = "default_engine")]
    pub default_engine: String,

    /// Per-role overrides, keyed by role name
    #[serde(default)]
    pub roles: HashMap<String, RoleConfig>,

    #[serde(default)]
    pub mailbox: MailboxConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

fn default_engine() -> String {
    "claude".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    /// Overrides the built-in prompt template for this role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MailboxConfig {
    /// Dispatch attempts before a message goes to the dead-letter directory
    pub max_retries: u32,
    /// Exponential backoff base
    pub backoff_base_secs: u64,
    /// Backoff ceiling
    pub backoff_cap_secs: u64,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_base_secs: 5,
            backoff_cap_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// First port tried; scanning walks forward from here
    pub port: u16,
    /// How many ports to try before giving up
    pub scan_range: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8642,
            scan_range: 32,
        }
    }
}

impl ProjectConfig {
    /// Load the project config, defaulting when the file is absent.
    pub fn load(paths: &ProjectPaths) -> Result<Self, TicketError> {
        let path = paths.config_file();
        let Some(text) = monoco_storage::read_if_exists(&path)? else {
            return Ok(Self::default());
        };
        toml::from_str(&text).map_err(|err| TicketError::Config {
            path,
            message: err.to_string(),
        })
    }

    fn role_config(&self, role: &Role) -> Option<&RoleConfig> {
        self.roles.get(role.name())
    }

    pub fn concurrency_for(&self, role: &Role) -> usize {
        self.role_config(role)
            .and_then(|c| c.concurrency)
            .unwrap_or_else(|| role.default_concurrency())
            .max(1)
    }

    pub fn timeout_for(&self, role: &Role) -> Duration {
        self.role_config(role)
            .and_then(|c| c.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or_else(|| role.default_timeout())
    }

    pub fn engine_for(&self, role: &Role) -> &str {
        self.role_config(role)
            .and_then(|c| c.engine.as_deref())
            .unwrap_or(&self.default_engine)
    }

    pub fn prompt_for(&self, role: &Role) -> Option<&str> {
        self.role_config(role).and_then(|c| c.prompt.as_deref())
    }

    /// Trunk candidates in preference order.
    pub fn trunk_candidates(&self) -> Vec<String> {
        match &self.trunk {
            Some(trunk) => vec![trunk.clone()],
            None => vec!["main".to_string(), "master".to_string()],
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
