// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem change signal
//!
//! Native notify events where the platform supports them, with a polling
//! tick as fallback; both collapse into one "something changed, re-scan"
//! signal. Consumers re-read the watched root on every tick, so a missed
//! notify event costs at most one poll interval of latency.

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

/// A stream of change ticks for one watched root.
///
/// Dropping the stream stops both the native watcher and the poll task.
pub struct ChangeStream {
    rx: mpsc::Receiver<()>,
    // NOTE(lifetime): held to keep the native watcher registered; dropped with self
    _watcher: Option<RecommendedWatcher>,
    poll_task: tokio::task::JoinHandle<()>,
}

impl ChangeStream {
    /// Wait for the next change tick. Returns `None` only if both the
    /// watcher and the poll task are gone (cannot happen before drop).
    pub async fn changed(&mut self) -> Option<()> {
        self.rx.recv().await
    }
}

impl Drop for ChangeStream {
    fn drop(&mut self) {
        self.poll_task.abort();
    }
}

/// Watch `path` (recursively when it is a directory).
///
/// `poll_interval` bounds staleness when native notification is missing or
/// silently broken; watchers pass 1-5 s.
pub fn watch(path: &Path, poll_interval: Duration) -> ChangeStream {
    let (tx, rx) = mpsc::channel(8);

    // Native watcher: any event becomes a tick. Errors degrade to polling.
    let notify_tx = tx.clone();
    let watcher = RecommendedWatcher::new(
        move |result: Result<notify::Event, notify::Error>| {
            if result.is_ok() {
                // Full channel means a tick is already pending
                let _ = notify_tx.try_send(());
            }
        },
        notify::Config::default(),
    )
    .and_then(|mut w| {
        w.watch(path, RecursiveMode::Recursive)?;
        Ok(w)
    });

    let watcher = match watcher {
        Ok(w) => Some(w),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "native watch unavailable, polling only");
            None
        }
    };

    let poll_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if tx.send(()).await.is_err() {
                return;
            }
        }
    });

    ChangeStream {
        rx,
        _watcher: watcher,
        poll_task,
    }
}

#[cfg(test)]
#[path = "fswatch_tests.rs"]
mod tests;
