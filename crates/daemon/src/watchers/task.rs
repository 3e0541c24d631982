// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task file watcher
//!
//! Watches `tasks.md` at the project root and emits `task.added` for each
//! line that was not present before. Lines already in the file when the
//! watcher starts are not replayed.

use crate::event_bus::EventBus;
use crate::watchers::{stop_channel, WatcherHandle};
use monoco_core::{Clock, Event};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct TaskWatcher<C: Clock> {
    tasks_file: PathBuf,
    bus: EventBus<C>,
    poll_interval: Duration,
}

fn task_lines(path: &Path) -> HashSet<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

impl<C: Clock + 'static> TaskWatcher<C> {
    pub fn new(tasks_file: PathBuf, bus: EventBus<C>) -> Self {
        Self {
            tasks_file,
            bus,
            poll_interval: Duration::from_secs(2),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn start(self) -> WatcherHandle {
        let (stop_tx, mut stop_rx) = stop_channel();
        let task = tokio::spawn(async move {
            let watch_root = self
                .tasks_file
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| self.tasks_file.clone());
            let mut stream = monoco_adapters::fswatch::watch(&watch_root, self.poll_interval);
            let mut known = task_lines(&self.tasks_file);

            loop {
                tokio::select! {
                    changed = stream.changed() => {
                        if changed.is_none() {
                            return;
                        }
                        let current = task_lines(&self.tasks_file);
                        for line in current.difference(&known) {
                            self.bus.publish(Event::TaskAdded {
                                line: line.clone(),
                                path: self.tasks_file.clone(),
                            });
                        }
                        known = current;
                    }
                    _ = stop_rx.changed() => return,
                }
            }
        });
        WatcherHandle::new(stop_tx, task)
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
