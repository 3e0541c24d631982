// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem and inbox watchers
//!
//! Each watcher is a long-running task observing one root and publishing
//! typed events onto the bus. All of them re-scan on native notify ticks
//! with a polling fallback, and tolerate transient parse failures (a
//! concurrent writer mid-rename) by skipping until the file parses.

mod issue;
mod mailbox;
mod memo;
mod task;

pub use issue::IssueWatcher;
pub use mailbox::MailboxInboundWatcher;
pub use memo::MemoWatcher;
pub use task::TaskWatcher;

use tokio::sync::watch;

/// Handle to a running watcher task.
#[derive(Debug)]
pub struct WatcherHandle {
    stop_tx: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl WatcherHandle {
    pub(crate) fn new(stop_tx: watch::Sender<bool>, task: tokio::task::JoinHandle<()>) -> Self {
        Self { stop_tx, task }
    }

    /// Signal the watcher to stop and wait for it to wind down.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }
}

pub(crate) fn stop_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}
