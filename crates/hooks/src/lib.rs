// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! monoco-hooks: the universal interception layer
//!
//! Hooks are executable scripts carrying a YAML header in their first
//! comment block. The engine discovers them across project, user, and
//! bundled directories, dispatches them priority-ordered at each call site
//! (agent tool calls, issue transitions, git lifecycle), and normalizes
//! every outcome into the unified allow/deny/ask decision protocol.
//! Provider-native event names and decision schemas stop at the ACL; the
//! daemon never consumes them directly.

pub mod acl;
pub mod def;
pub mod discover;
pub mod engine;
pub mod install;
pub mod matcher;

pub use acl::{from_native_decision, to_native_decision, to_native_event, to_unified_event};
pub use def::{HookDef, HookType};
pub use discover::discover_hooks;
pub use engine::{HookEngine, HookSite};
pub use install::{install_git_hooks, GIT_HOOKS};
pub use matcher::glob_match;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("no hook header in {0} (expected YAML between '---' fences in the first comment block)")]
    MissingHeader(PathBuf),

    #[error("bad hook header in {path}: {message}")]
    BadHeader { path: PathBuf, message: String },

    #[error("hook {path} failed to run: {message}")]
    Exec { path: PathBuf, message: String },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl monoco_core::error::Classified for HookError {
    fn class(&self) -> monoco_core::ErrorClass {
        match self {
            HookError::MissingHeader(_) | HookError::BadHeader { .. } => {
                monoco_core::ErrorClass::Validation
            }
            _ => monoco_core::ErrorClass::TransientIo,
        }
    }
}
