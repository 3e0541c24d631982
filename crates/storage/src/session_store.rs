// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk session store
//!
//! One JSON file per agent session under `.monoco/sessions/`. Every state
//! transition rewrites the file atomically; a daemon restart rebuilds its
//! in-memory view from this directory.

use crate::{write_atomic, StorageError};
use monoco_core::{AgentSession, SessionId, SessionMode, SessionState};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session not found: {0}")]
    NotFound(SessionId),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("corrupt session file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Store rooted at a sessions directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &SessionId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Persist a session record atomically.
    pub fn save(&self, session: &AgentSession) -> Result<(), SessionStoreError> {
        let json = serde_json::to_vec_pretty(session).map_err(StorageError::Serde)?;
        write_atomic(&self.path_for(&session.session_id), &json)?;
        Ok(())
    }

    /// Load one session; records loaded from disk are observers.
    pub fn load(&self, id: &SessionId) -> Result<AgentSession, SessionStoreError> {
        let path = self.path_for(id);
        let contents = crate::read_if_exists(&path)?
            .ok_or_else(|| SessionStoreError::NotFound(id.clone()))?;
        let mut session: AgentSession = serde_json::from_str(&contents)
            .map_err(|source| SessionStoreError::Corrupt { path, source })?;
        session.mode = SessionMode::Observer;
        Ok(session)
    }

    /// Scan the whole directory, skipping files that do not parse.
    ///
    /// A concurrent writer may be mid-rename; unparseable files are logged
    /// and ignored rather than failing the scan.
    pub fn scan(&self) -> Result<Vec<AgentSession>, SessionStoreError> {
        let mut sessions = Vec::new();
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(sessions),
            Err(err) => {
                return Err(StorageError::Io {
                    path: self.dir.clone(),
                    source: err,
                }
                .into())
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Ok(contents) = std::fs::read_to_string(&path) else {
                continue;
            };
            match serde_json::from_str::<AgentSession>(&contents) {
                Ok(mut session) => {
                    session.mode = SessionMode::Observer;
                    sessions.push(session);
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping corrupt session file");
                }
            }
        }
        sessions.sort_by_key(|s| s.started_at);
        Ok(sessions)
    }

    /// Startup reconciliation: non-terminal records whose pid is dead become
    /// `terminated`; live ones stay as observers.
    ///
    /// Returns the reconciled set. `alive` is injected so tests control
    /// liveness without real processes.
    pub fn reconcile(
        &self,
        now_ms: u64,
        alive: impl Fn(u32) -> bool,
    ) -> Result<Vec<AgentSession>, SessionStoreError> {
        let mut sessions = self.scan()?;
        for session in &mut sessions {
            if session.state.is_terminal() {
                continue;
            }
            let pid_live = session.pid.map(&alive).unwrap_or(false);
            if !pid_live {
                tracing::info!(
                    session_id = %session.session_id,
                    role = %session.role,
                    "marking dead session terminated at startup"
                );
                session.transition(SessionState::Terminated, now_ms);
                self.save(session)?;
            }
        }
        Ok(sessions)
    }
}

#[cfg(test)]
#[path = "session_store_tests.rs"]
mod tests;
