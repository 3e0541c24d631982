// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command handlers

pub mod daemon;
pub mod hook;
pub mod issue;
pub mod memo;
pub mod send;

use anyhow::{Context, Result};
use monoco_hooks::{discover_hooks, HookEngine};
use monoco_ticket::{ProjectConfig, ProjectPaths};
use std::path::PathBuf;

/// Project context every handler starts from: the current directory.
pub fn project() -> Result<(ProjectPaths, ProjectConfig)> {
    let root = std::env::current_dir().context("cannot determine working directory")?;
    let paths = ProjectPaths::new(root);
    let config = ProjectConfig::load(&paths).context("loading .monoco/config.toml")?;
    Ok((paths, config))
}

/// Hook engine over the documented discovery directories.
pub fn hook_engine() -> Result<HookEngine> {
    let (paths, _) = project()?;
    let mut dirs: Vec<PathBuf> = vec![paths.hooks_dir()];
    if let Some(config_home) = dirs_config() {
        dirs.push(config_home.join("agents").join("hooks"));
    }
    let dir_refs: Vec<&std::path::Path> = dirs.iter().map(PathBuf::as_path).collect();
    Ok(HookEngine::new(discover_hooks(&dir_refs)))
}

/// Transition core wired the way the daemon wires it, for CLI-local issue
/// operations.
pub fn transition_core() -> Result<monoco_engine::TransitionCore> {
    let (paths, config) = project()?;
    let hooks = hook_engine()?;
    Ok(monoco_engine::TransitionCore::new(paths, config, hooks))
}

fn dirs_config() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}
