// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue directory watcher
//!
//! Keeps a preamble snapshot per file and emits `issue.created`,
//! `issue.deleted`, and per-field `issue.field_changed` only for actual
//! value differences. The very first scan primes the cache silently so a
//! daemon restart does not replay the whole tree as creations.

use crate::event_bus::EventBus;
use crate::watchers::{stop_channel, WatcherHandle};
use monoco_core::{Clock, Event, IssueId};
use monoco_ticket::frontmatter;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

type Preamble = serde_json::Map<String, serde_json::Value>;

pub struct IssueWatcher<C: Clock> {
    issues_root: PathBuf,
    bus: EventBus<C>,
    poll_interval: Duration,
}

impl<C: Clock + 'static> IssueWatcher<C> {
    pub fn new(issues_root: PathBuf, bus: EventBus<C>) -> Self {
        Self {
            issues_root,
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
            std::fs::create_dir_all(&self.issues_root).ok();
            let mut stream = monoco_adapters::fswatch::watch(&self.issues_root, self.poll_interval);
            let mut cache = snapshot(&self.issues_root);

            loop {
                tokio::select! {
                    changed = stream.changed() => {
                        if changed.is_none() {
                            return;
                        }
                        let current = snapshot(&self.issues_root);
                        for event in diff(&cache, &current) {
                            self.bus.publish(event);
                        }
                        cache = current;
                    }
                    _ = stop_rx.changed() => return,
                }
            }
        });
        WatcherHandle::new(stop_tx, task)
    }
}

/// Parse every issue preamble under the root. Files that do not parse are
/// left out of the snapshot entirely: no events until they settle.
fn snapshot(root: &Path) -> HashMap<PathBuf, (IssueId, Preamble)> {
    let mut snap = HashMap::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let Ok(text) = std::fs::read_to_string(&path) else {
                continue;
            };
            let Ok(doc) = frontmatter::split(&text) else {
                continue;
            };
            let Ok(serde_json::Value::Object(preamble)) = serde_json::to_value(&doc.preamble)
            else {
                continue;
            };
            let Some(id) = preamble
                .get("id")
                .and_then(|v| v.as_str())
                .and_then(IssueId::parse)
            else {
                continue;
            };
            snap.insert(path, (id, preamble));
        }
    }
    snap
}

fn diff(
    old: &HashMap<PathBuf, (IssueId, Preamble)>,
    new: &HashMap<PathBuf, (IssueId, Preamble)>,
) -> Vec<Event> {
    let mut events = Vec::new();

    for (path, (id, _)) in new {
        if !old.contains_key(path) {
            events.push(Event::IssueCreated {
                id: id.clone(),
                path: path.clone(),
            });
        }
    }
    for (path, (id, _)) in old {
        if !new.contains_key(path) {
            events.push(Event::IssueDeleted {
                id: id.clone(),
                path: path.clone(),
            });
        }
    }

    for (path, (id, new_pre)) in new {
        let Some((_, old_pre)) = old.get(path) else {
            continue;
        };
        let mut fields: Vec<&String> = old_pre.keys().chain(new_pre.keys()).collect();
        fields.sort();
        fields.dedup();
        for field in fields {
            let old_value = old_pre.get(field).cloned().unwrap_or(serde_json::Value::Null);
            let new_value = new_pre.get(field).cloned().unwrap_or(serde_json::Value::Null);
            if old_value != new_value {
                events.push(Event::IssueFieldChanged {
                    id: id.clone(),
                    path: path.clone(),
                    field: field.clone(),
                    old: old_value,
                    new: new_value,
                });
            }
        }
    }
    events
}

#[cfg(test)]
#[path = "issue_tests.rs"]
mod tests;
