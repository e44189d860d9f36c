// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event fan-out to subscribed operator consoles.
//!
//! A read-only projection of the engine's event stream. Slow consumers lose
//! events (`tokio::sync::broadcast` lag) rather than backpressuring the
//! engine; a console that falls behind re-lists to resynchronize.

use sc_core::Event;
use tokio::sync::broadcast;

const FANOUT_DEPTH: usize = 256;

/// Cloneable fan-out handle.
#[derive(Clone)]
pub struct EventFanout {
    tx: broadcast::Sender<Event>,
}

impl EventFanout {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FANOUT_DEPTH);
        Self { tx }
    }

    /// Publish to every subscriber; a send with no subscribers is fine.
    pub fn publish(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventFanout {
    fn default() -> Self {
        Self::new()
    }
}
