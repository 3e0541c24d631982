// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keyed debouncer with quiet window and hard ceiling
//!
//! Watchers coalesce bursts per logical key: a window opens on the first
//! item, extends while items keep arriving within the quiet interval, and
//! flushes either when the stream goes quiet or when the window has been
//! open for the hard ceiling, so a chatty thread cannot defer its event
//! forever.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

struct Window<V> {
    items: Vec<V>,
    opened_at: Instant,
    last_item_at: Instant,
}

/// Per-key aggregation of items into flush batches.
pub struct Debouncer<K, V> {
    quiet: Duration,
    ceiling: Duration,
    windows: HashMap<K, Window<V>>,
}

impl<K: Eq + Hash + Clone, V> Debouncer<K, V> {
    pub fn new(quiet: Duration, ceiling: Duration) -> Self {
        Self {
            quiet,
            ceiling,
            windows: HashMap::new(),
        }
    }

    /// Add an item to its key's window, opening one if needed.
    pub fn push(&mut self, key: K, item: V, now: Instant) {
        let window = self.windows.entry(key).or_insert_with(|| Window {
            items: Vec::new(),
            opened_at: now,
            last_item_at: now,
        });
        window.items.push(item);
        window.last_item_at = now;
    }

    /// Drain every window that is ready to flush.
    pub fn ready(&mut self, now: Instant) -> Vec<(K, Vec<V>)> {
        let quiet = self.quiet;
        let ceiling = self.ceiling;
        let ripe: Vec<K> = self
            .windows
            .iter()
            .filter(|(_, w)| {
                now.duration_since(w.last_item_at) >= quiet
                    || now.duration_since(w.opened_at) >= ceiling
            })
            .map(|(k, _)| k.clone())
            .collect();

        ripe.into_iter()
            .filter_map(|key| self.windows.remove_entry(&key))
            .map(|(key, window)| (key, window.items))
            .collect()
    }

    /// Earliest instant at which some window becomes ready.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.windows
            .values()
            .map(|w| (w.last_item_at + self.quiet).min(w.opened_at + self.ceiling))
            .min()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
#[path = "debounce_tests.rs"]
mod tests;
