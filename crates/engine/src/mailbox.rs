// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mailbox protocol
//!
//! `.monoco/mailbox/{inbound,outbound,archive,.deadletter}/<provider>/`.
//! Every message is one atomically-written file; claim/done/fail serialize
//! per message through sibling lock files; outbound dispatch retries with
//! exponential backoff and jitter until the dead-letter threshold.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use monoco_storage::{ClaimLock, LockError};
use monoco_ticket::{Direction, MailMessage, MailStatus, MailboxConfig, ProjectPaths, TicketError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("message not found: {0}")]
    NotFound(String),

    #[error("message {id} already claimed by {owner}")]
    AlreadyClaimed { id: String, owner: String },

    #[error("no adapter registered for provider {0}")]
    UnknownProvider(String),

    #[error(transparent)]
    Ticket(#[from] TicketError),

    #[error("lock: {0}")]
    Lock(#[from] LockError),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl monoco_core::error::Classified for MailboxError {
    fn class(&self) -> monoco_core::ErrorClass {
        match self {
            MailboxError::NotFound(_) => monoco_core::ErrorClass::Validation,
            MailboxError::AlreadyClaimed { .. } => monoco_core::ErrorClass::Precondition,
            MailboxError::UnknownProvider(_) => monoco_core::ErrorClass::Validation,
            MailboxError::Ticket(e) => e.class(),
            _ => monoco_core::ErrorClass::TransientIo,
        }
    }
}

/// Wire-level packing of one chat provider; the concrete codecs live
/// outside the core.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> &str;

    /// Deliver one outbound message. An `Err` counts against the retry
    /// budget.
    async fn send(&self, message: &MailMessage) -> Result<(), String>;
}

/// Adapters looked up by provider name.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters
            .insert(adapter.provider().to_string(), adapter);
    }

    pub fn resolve(&self, provider: &str) -> Result<Arc<dyn ProviderAdapter>, MailboxError> {
        self.adapters
            .get(provider)
            .cloned()
            .ok_or_else(|| MailboxError::UnknownProvider(provider.to_string()))
    }
}

fn io_err(path: &Path, source: std::io::Error) -> MailboxError {
    MailboxError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Move a file across mailbox directories, creating the target dir.
fn move_file(from: &Path, to: &Path) -> Result<(), MailboxError> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    std::fs::rename(from, to).map_err(|e| io_err(from, e))
}

/// The mailbox tree of one project.
#[derive(Debug, Clone)]
pub struct Mailbox {
    paths: ProjectPaths,
    config: MailboxConfig,
}

impl Mailbox {
    pub fn new(paths: ProjectPaths, config: MailboxConfig) -> Self {
        Self { paths, config }
    }

    /// Locate a message file by id under a mailbox area (`inbound`,
    /// `outbound`, ...), across providers.
    fn find_in(&self, area: &str, id: &str) -> Option<PathBuf> {
        let area_root = self.paths.mailbox_root().join(area);
        let suffix = format!("_{id}.md");
        let providers = std::fs::read_dir(&area_root).ok()?;
        for provider in providers.flatten() {
            let Ok(entries) = std::fs::read_dir(provider.path()) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                let name = entry.file_name().to_string_lossy().to_string();
                if name.ends_with(&suffix) {
                    return Some(path);
                }
            }
        }
        None
    }

    /// Validate a draft and atomically move it into `outbound/<provider>/`.
    ///
    /// The draft file is consumed. Validation failures leave it in place.
    pub fn submit_draft(&self, draft_path: &Path) -> Result<PathBuf, MailboxError> {
        let mut message = MailMessage::load(draft_path)?;
        if message.direction != Direction::Outbound {
            return Err(TicketError::Validation {
                field: "direction".to_string(),
                expected: "outbound".to_string(),
            }
            .into());
        }
        message.status = MailStatus::Pending;

        let target = self
            .paths
            .mailbox_outbound(&message.provider)
            .join(message.file_name());
        // Rewrite (atomic) into the outbound directory, then drop the draft
        message.save(&target)?;
        std::fs::remove_file(draft_path).map_err(|e| io_err(draft_path, e))?;
        Ok(target)
    }

    /// Claim an inbound message for a consumer.
    pub fn claim(&self, id: &str, claimer: &str, now_ms: u64) -> Result<PathBuf, MailboxError> {
        let path = self
            .find_in("inbound", id)
            .ok_or_else(|| MailboxError::NotFound(id.to_string()))?;
        match ClaimLock::acquire(&path, claimer, now_ms) {
            Ok(_) => Ok(path),
            Err(LockError::AlreadyLocked { owner }) => Err(MailboxError::AlreadyClaimed {
                id: id.to_string(),
                owner,
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Finish a claimed message: archive it and drop the lock.
    pub fn done(&self, id: &str, claimer: &str) -> Result<PathBuf, MailboxError> {
        let path = self
            .find_in("inbound", id)
            .ok_or_else(|| MailboxError::NotFound(id.to_string()))?;
        let message = MailMessage::load(&path)?;

        let target = self
            .paths
            .mailbox_archive(&message.provider)
            .join(message.file_name());
        move_file(&path, &target)?;
        ClaimLock::release(&path, claimer)?;
        Ok(target)
    }

    /// Fail a claimed message: bump the retry counter, reschedule or
    /// dead-letter, release the lock.
    pub fn fail(
        &self,
        id: &str,
        claimer: &str,
        reason: &str,
        now: NaiveDateTime,
    ) -> Result<MailStatus, MailboxError> {
        let path = self
            .find_in("inbound", id)
            .ok_or_else(|| MailboxError::NotFound(id.to_string()))?;
        let mut message = MailMessage::load(&path)?;

        message.retry_count += 1;
        message.error_message = Some(reason.to_string());

        let status = if message.retry_count > self.config.max_retries {
            message.status = MailStatus::Dead;
            message.next_retry_at = None;
            let target = self
                .paths
                .mailbox_deadletter(&message.provider)
                .join(message.file_name());
            message.save(&path)?;
            move_file(&path, &target)?;
            MailStatus::Dead
        } else {
            message.status = MailStatus::Failed;
            message.next_retry_at = Some(now + backoff(&self.config, message.retry_count));
            message.save(&path)?;
            MailStatus::Failed
        };

        ClaimLock::release(&path, claimer)?;
        Ok(status)
    }

    /// Providers that currently have outbound files pending.
    fn outbound_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let outbound_root = self.paths.mailbox_root().join("outbound");
        let Ok(providers) = std::fs::read_dir(&outbound_root) else {
            return files;
        };
        for provider in providers.flatten() {
            let Ok(entries) = std::fs::read_dir(provider.path()) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some("md") {
                    files.push(path);
                }
            }
        }
        files.sort();
        files
    }
}

/// Exponential backoff with ±20% jitter: base × 2^(n−1), capped.
fn backoff(config: &MailboxConfig, retry_count: u32) -> chrono::Duration {
    let exponent = retry_count.saturating_sub(1).min(20);
    let raw = config
        .backoff_base_secs
        .saturating_mul(1u64 << exponent)
        .min(config.backoff_cap_secs);
    let jitter_span = (raw as f64) * 0.2;
    let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_span;
    let secs = ((raw as f64) + jitter).max(1.0) as i64;
    chrono::Duration::seconds(secs)
}

/// Background outbound dispatcher.
///
/// Polls `outbound/<provider>/`, takes a per-file claim so two daemons on
/// the same tree cannot double-send, dispatches via the provider adapter,
/// archives on success, and applies the retry/dead-letter policy on
/// failure.
pub struct OutboundDispatcher {
    mailbox: Mailbox,
    providers: ProviderRegistry,
    poll_interval: Duration,
}

impl OutboundDispatcher {
    pub fn new(mailbox: Mailbox, providers: ProviderRegistry) -> Self {
        Self {
            mailbox,
            providers,
            poll_interval: Duration::from_secs(2),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// One pass over the outbound tree. Returns how many sends succeeded.
    pub async fn dispatch_once(&self, now: NaiveDateTime, now_ms: u64) -> usize {
        let mut sent = 0;
        for path in self.mailbox.outbound_files() {
            match self.dispatch_file(&path, now, now_ms).await {
                Ok(true) => sent += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "outbound dispatch error");
                }
            }
        }
        sent
    }

    async fn dispatch_file(
        &self,
        path: &Path,
        now: NaiveDateTime,
        now_ms: u64,
    ) -> Result<bool, MailboxError> {
        let mut message = match MailMessage::load(path) {
            Ok(message) => message,
            Err(err) => {
                // Half-written by a concurrent producer; next pass gets it
                tracing::debug!(path = %path.display(), error = %err, "skipping unparseable outbound file");
                return Ok(false);
            }
        };

        if let Some(next_retry_at) = message.next_retry_at {
            if next_retry_at > now {
                return Ok(false);
            }
        }

        const DISPATCHER: &str = "outbound-dispatcher";
        match ClaimLock::acquire(path, DISPATCHER, now_ms) {
            Ok(_) => {}
            Err(LockError::AlreadyLocked { .. }) => return Ok(false),
            Err(err) => return Err(err.into()),
        }

        let adapter = match self.providers.resolve(&message.provider) {
            Ok(adapter) => adapter,
            Err(err) => {
                ClaimLock::release(path, DISPATCHER)?;
                return Err(err);
            }
        };

        let result = adapter.send(&message).await;
        match result {
            Ok(()) => {
                message.status = MailStatus::Sent;
                message.sent_at = Some(now);
                message.error_message = None;
                let target = self
                    .mailbox
                    .paths
                    .mailbox_archive(&message.provider)
                    .join(message.file_name());
                message.save(path)?;
                move_file(path, &target)?;
                ClaimLock::release(path, DISPATCHER)?;
                Ok(true)
            }
            Err(reason) => {
                message.retry_count += 1;
                message.error_message = Some(reason);
                if message.retry_count > self.mailbox.config.max_retries {
                    message.status = MailStatus::Dead;
                    let target = self
                        .mailbox
                        .paths
                        .mailbox_deadletter(&message.provider)
                        .join(message.file_name());
                    message.save(path)?;
                    move_file(path, &target)?;
                } else {
                    message.status = MailStatus::Failed;
                    message.next_retry_at =
                        Some(now + backoff(&self.mailbox.config, message.retry_count));
                    message.save(path)?;
                }
                ClaimLock::release(path, DISPATCHER)?;
                Ok(false)
            }
        }
    }

    /// Run until `shutdown` resolves.
    pub async fn run(self, shutdown: Arc<tokio::sync::Notify>) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = chrono::Utc::now().naive_utc();
                    let now_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
                    self.dispatch_once(now, now_ms).await;
                }
                _ = shutdown.notified() => return,
            }
        }
    }
}

#[cfg(test)]
#[path = "mailbox_tests.rs"]
mod tests;
