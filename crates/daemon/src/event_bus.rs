// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL-backed event bus.
//!
//! Every producer (console listener, agent connections, the runtime's own
//! result events) funnels through [`EventBus::send`]: non-transient events
//! are appended to the WAL and flushed *before* they are enqueued for the
//! engine loop, so an event the engine sees is already durable and a
//! mutation acknowledged to a caller survives a crash.

use parking_lot::Mutex;
use sc_core::Event;
use sc_storage::{Wal, WalError};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Sending half: clone freely across connection tasks.
#[derive(Clone)]
pub struct EventBus {
    wal: Arc<Mutex<Wal>>,
    tx: mpsc::UnboundedSender<(u64, Event)>,
}

/// Receiving half, owned by the engine loop.
pub struct EventReader {
    rx: mpsc::UnboundedReceiver<(u64, Event)>,
}

impl EventBus {
    pub fn new(wal: Wal) -> (Self, EventReader) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { wal: Arc::new(Mutex::new(wal)), tx }, EventReader { rx })
    }

    /// Persist (unless transient) and enqueue an event.
    ///
    /// Returns the WAL sequence number, or 0 for transient events.
    pub fn send(&self, event: Event) -> Result<u64, WalError> {
        let seq = if event.is_transient() {
            0
        } else {
            let mut wal = self.wal.lock();
            let seq = wal.append(&event)?;
            wal.flush()?;
            seq
        };
        // Receiver only drops at shutdown; losing post-shutdown events is fine
        let _ = self.tx.send((seq, event));
        Ok(seq)
    }

    /// Shared WAL handle (checkpointing).
    pub fn wal(&self) -> Arc<Mutex<Wal>> {
        Arc::clone(&self.wal)
    }
}

impl EventReader {
    /// Next event, or `None` when every sender is gone.
    pub async fn recv(&mut self) -> Option<(u64, Event)> {
        self.rx.recv().await
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
