// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Memo inbox watcher
//!
//! Presence is the entire signal: whenever the inbox file holds at least
//! one memo block (and its contents changed since the last emit), one
//! `memo.present` fires carrying the parsed list. Per-memo status does not
//! exist; consumption empties the file, which is exactly what stops the
//! watcher from re-firing.

use crate::event_bus::EventBus;
use crate::watchers::{stop_channel, WatcherHandle};
use monoco_core::{Clock, Event};
use monoco_ticket::memo::parse_inbox;
use std::path::PathBuf;
use std::time::Duration;

pub struct MemoWatcher<C: Clock> {
    inbox: PathBuf,
    bus: EventBus<C>,
    poll_interval: Duration,
}

impl<C: Clock + 'static> MemoWatcher<C> {
    pub fn new(inbox: PathBuf, bus: EventBus<C>) -> Self {
        Self {
            inbox,
            bus,
            poll_interval: Duration::from_secs(1),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn start(self) -> WatcherHandle {
        let (stop_tx, mut stop_rx) = stop_channel();
        let task = tokio::spawn(async move {
            if let Some(parent) = self.inbox.parent() {
                std::fs::create_dir_all(parent).ok();
            }
            let watch_root = self
                .inbox
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| self.inbox.clone());
            let mut stream = monoco_adapters::fswatch::watch(&watch_root, self.poll_interval);

            // An inbox with pending memos at startup fires immediately:
            // those memos were never consumed.
            let mut last_emitted: Option<String> = None;

            loop {
                tokio::select! {
                    changed = stream.changed() => {
                        if changed.is_none() {
                            return;
                        }
                        let contents = std::fs::read_to_string(&self.inbox).unwrap_or_default();
                        let memos = parse_inbox(&contents);
                        if memos.is_empty() {
                            last_emitted = None;
                            continue;
                        }
                        if last_emitted.as_deref() == Some(contents.as_str()) {
                            continue;
                        }
                        self.bus.publish(Event::MemoPresent { memos });
                        last_emitted = Some(contents);
                    }
                    _ = stop_rx.changed() => return,
                }
            }
        });
        WatcherHandle::new(stop_tx, task)
    }
}

#[cfg(test)]
#[path = "memo_tests.rs"]
mod tests;
