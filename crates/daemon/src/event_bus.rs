// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process event bus
//!
//! One publish/subscribe fabric for the whole daemon. Delivery is
//! at-least-once per live subscriber and FIFO per subscriber; publishing
//! never blocks: a subscriber that cannot keep up loses events (with a
//! warning) rather than stalling producers. There is no cross-process
//! delivery; external consumers take the SSE stream.

use monoco_core::{Clock, Envelope, Event};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Per-subscriber queue depth.
const SUBSCRIBER_CAPACITY: usize = 256;

/// Depth of the ingest channel handed to producers.
const INGEST_CAPACITY: usize = 512;

#[derive(Debug)]
struct Inner<C: Clock> {
    clock: C,
    subscribers: Mutex<Vec<mpsc::Sender<Envelope>>>,
}

/// The bus. Cheap to clone; all clones share the subscriber set.
#[derive(Debug)]
pub struct EventBus<C: Clock> {
    inner: Arc<Inner<C>>,
}

impl<C: Clock> Clone for EventBus<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Clock + 'static> EventBus<C> {
    pub fn new(clock: C) -> Self {
        Self {
            inner: Arc::new(Inner {
                clock,
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register a subscriber. Only events published after registration are
    /// delivered.
    pub fn subscribe(&self) -> mpsc::Receiver<Envelope> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        self.inner.subscribers.lock().push(tx);
        rx
    }

    /// Wrap and fan out a new event.
    pub fn publish(&self, event: Event) -> Envelope {
        let envelope = Envelope::new(event, self.inner.clock.epoch_ms());
        self.publish_envelope(envelope.clone());
        envelope
    }

    /// Fan out an existing envelope (correlation id preserved).
    pub fn publish_envelope(&self, envelope: Envelope) {
        tracing::debug!(
            event = %envelope.event.log_summary(),
            correlation_id = %envelope.correlation_id,
            "publish"
        );
        let mut subscribers = self.inner.subscribers.lock();
        subscribers.retain(|tx| match tx.try_send(envelope.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    event = %envelope.event.name(),
                    "subscriber queue full, dropping event for it"
                );
                true
            }
            // Receiver dropped; forget the subscriber
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    /// A producer-side sender: envelopes pushed into it are fanned out by a
    /// background pump. Components that only emit (the scheduler, actions)
    /// hold this instead of the bus itself.
    pub fn ingest_sender(&self) -> mpsc::Sender<Envelope> {
        let (tx, mut rx) = mpsc::channel::<Envelope>(INGEST_CAPACITY);
        let bus = self.clone();
        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                bus.publish_envelope(envelope);
            }
        });
        tx
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
