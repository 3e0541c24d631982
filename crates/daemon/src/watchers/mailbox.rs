// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mailbox inbound watcher
//!
//! Watches `mailbox/inbound/<provider>/` across providers and coalesces new
//! message files per `(provider, session_id)`: a 5 s quiet window with a
//! 30 s hard ceiling, so a burst of IM messages in one chat thread surfaces
//! as a single `mailbox.inbound.ready` carrying the aggregated ids. Files
//! stay on disk; claims are the consumption protocol.

use crate::event_bus::EventBus;
use crate::watchers::{stop_channel, WatcherHandle};
use monoco_adapters::Debouncer;
use monoco_core::{Clock, Event, MessageId};
use monoco_ticket::{MailMessage, ProjectPaths};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// One inbound file waiting in a debounce window.
struct PendingMessage {
    id: MessageId,
    path: PathBuf,
    text: String,
    mentioned: bool,
}

pub struct MailboxInboundWatcher<C: Clock> {
    paths: ProjectPaths,
    bus: EventBus<C>,
    /// Bot identity used for mention detection
    bot_name: String,
    quiet: Duration,
    ceiling: Duration,
    poll_interval: Duration,
}

impl<C: Clock + 'static> MailboxInboundWatcher<C> {
    pub fn new(paths: ProjectPaths, bus: EventBus<C>, bot_name: impl Into<String>) -> Self {
        Self {
            paths,
            bus,
            bot_name: bot_name.into(),
            quiet: Duration::from_secs(5),
            ceiling: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
        }
    }

    pub fn with_windows(mut self, quiet: Duration, ceiling: Duration) -> Self {
        self.quiet = quiet;
        self.ceiling = ceiling;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn scan(
        &self,
        known: &mut HashSet<PathBuf>,
        debouncer: &mut Debouncer<(String, String), PendingMessage>,
        now: Instant,
    ) {
        let inbound_root = self.paths.mailbox_root().join("inbound");
        let Ok(providers) = std::fs::read_dir(&inbound_root) else {
            return;
        };
        for provider_entry in providers.flatten() {
            if !provider_entry.path().is_dir() {
                continue;
            }
            let provider = provider_entry.file_name().to_string_lossy().to_string();
            let Ok(entries) = std::fs::read_dir(provider_entry.path()) else {
                continue;
            };
            let mut paths: Vec<PathBuf> = entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("md"))
                .collect();
            // Time-sortable names keep aggregation oldest-first
            paths.sort();

            for path in paths {
                if known.contains(&path) {
                    continue;
                }
                // Partial writes from a concurrent adapter parse later
                let Ok(message) = MailMessage::load(&path) else {
                    continue;
                };
                known.insert(path.clone());
                let mentioned = message.participants.mentions_bot(&self.bot_name);
                debouncer.push(
                    (provider.clone(), message.session.id.clone()),
                    PendingMessage {
                        id: message.id.clone(),
                        path,
                        text: message.body.trim().to_string(),
                        mentioned,
                    },
                    now,
                );
            }
        }
    }

    fn flush(&self, debouncer: &mut Debouncer<(String, String), PendingMessage>, now: Instant) {
        for ((provider, session_id), pending) in debouncer.ready(now) {
            let event = Event::MailboxInboundReady {
                provider,
                session_id,
                message_ids: pending.iter().map(|p| p.id.clone()).collect(),
                paths: pending.iter().map(|p| p.path.clone()).collect(),
                text: pending
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n"),
                mentioned: pending.iter().any(|p| p.mentioned),
            };
            self.bus.publish(event);
        }
    }

    pub fn start(self) -> WatcherHandle {
        let (stop_tx, mut stop_rx) = stop_channel();
        let task = tokio::spawn(async move {
            let inbound_root = self.paths.mailbox_root().join("inbound");
            std::fs::create_dir_all(&inbound_root).ok();
            let mut stream = monoco_adapters::fswatch::watch(&inbound_root, self.poll_interval);

            let mut known: HashSet<PathBuf> = HashSet::new();
            let mut debouncer: Debouncer<(String, String), PendingMessage> =
                Debouncer::new(self.quiet, self.ceiling);

            loop {
                // Sleep until the nearest window deadline (or far future)
                let deadline = debouncer
                    .next_deadline()
                    .map(tokio::time::Instant::from_std)
                    .unwrap_or_else(|| {
                        tokio::time::Instant::now() + Duration::from_secs(3600)
                    });

                tokio::select! {
                    changed = stream.changed() => {
                        if changed.is_none() {
                            return;
                        }
                        let now = Instant::now();
                        self.scan(&mut known, &mut debouncer, now);
                        self.flush(&mut debouncer, now);
                    }
                    _ = tokio::time::sleep_until(deadline) => {
                        self.flush(&mut debouncer, Instant::now());
                    }
                    _ = stop_rx.changed() => return,
                }
            }
        });
        WatcherHandle::new(stop_tx, task)
    }
}

#[cfg(test)]
#[path = "mailbox_tests.rs"]
mod tests;
