// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, engine loop, shutdown.

mod config;
mod startup;

pub use config::Config;
pub use startup::{startup, StartupResult};

use std::fs::File;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use sc_core::{Clock, Effect, Event, SystemClock};
use sc_storage::{Checkpointer, MaterializedState};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::broadcast::EventFanout;
use crate::engine::{RegistryLink, Runtime, RuntimeError};
use crate::event_bus::{EventBus, EventReader};
use crate::registry::ConnectionRegistry;

/// Daemon runtime with concrete adapter types
pub type DaemonRuntime = Runtime<RegistryLink<SystemClock>, SystemClock>;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("another daemon holds the lock: {0}")]
    LockFailed(std::io::Error),

    #[error("failed to bind {0}: {1}")]
    BindFailed(std::path::PathBuf, std::io::Error),

    #[error("storage error: {0}")]
    Storage(#[from] sc_storage::WalError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] sc_storage::SnapshotError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] sc_storage::CheckpointError),

    #[error("config error: {0}")]
    Config(String),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

/// Daemon state during operation.
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): held to maintain the exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub state: Arc<Mutex<MaterializedState>>,
    pub runtime: Arc<DaemonRuntime>,
    pub event_bus: EventBus,
    pub registry: Arc<ConnectionRegistry<SystemClock>>,
    pub fanout: EventFanout,
    pub start_time: Instant,
    checkpointer: Checkpointer,
    clock: SystemClock,
}

impl DaemonState {
    /// Process one event through the runtime.
    ///
    /// The event has already been persisted by whoever put it on the bus.
    /// Result events are sent back through the bus rather than handled
    /// locally, so every event is handled exactly once, in arrival order.
    pub async fn process_event(&mut self, seq: u64, event: Event) -> Result<(), LifecycleError> {
        self.state.lock().apply_event(&event);

        let results = self.runtime.handle_event(event.clone()).await?;
        for result in results {
            self.event_bus.send(result).map_err(LifecycleError::Storage)?;
        }

        // Read-only projection for subscribed consoles
        self.runtime
            .executor
            .execute(Effect::Broadcast { event })
            .await
            .map_err(RuntimeError::Execute)?;

        if seq > 0 {
            // Lock order is state before WAL everywhere (the listener
            // emits while holding the state lock)
            let state = self.state.lock();
            let wal = self.event_bus.wal();
            let mut wal = wal.lock();
            wal.mark_processed(seq);
            self.checkpointer.maybe_checkpoint(&mut wal, &state)?;
        }
        Ok(())
    }

    /// Liveness sweep: expire silent sessions, and (past the startup
    /// grace window) agents the recovered state believes are online but
    /// that never reconnected.
    pub fn sweep(&self, startup_grace_until: Instant) -> Vec<Event> {
        let now_ms = self.clock.epoch_ms();
        let mut events = Vec::new();

        for agent_id in self.registry.sweep() {
            events.push(Event::AgentOffline { id: agent_id, at_ms: now_ms });
        }

        if self.clock.now() >= startup_grace_until {
            let state = self.state.lock();
            for agent in state.agents.values() {
                if !agent.state.is_offline() && !self.registry.is_connected(&agent.id) {
                    events.push(Event::AgentOffline { id: agent.id.clone(), at_ms: now_ms });
                }
            }
        }
        events
    }
}

/// Run the engine loop until shutdown.
///
/// The single writer: every mutation in the system happens on this task,
/// serialized in event-arrival order.
pub async fn run_engine(
    mut daemon: DaemonState,
    mut reader: EventReader,
    shutdown: CancellationToken,
) -> Result<DaemonState, LifecycleError> {
    let heartbeat_interval =
        std::time::Duration::from_millis(daemon.runtime.settings().heartbeat_interval_ms);
    let startup_grace_until = Instant::now()
        + std::time::Duration::from_millis(daemon.runtime.settings().heartbeat_timeout_ms);
    let mut sweep_ticker = tokio::time::interval(heartbeat_interval);
    sweep_ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            received = reader.recv() => {
                let Some((seq, event)) = received else { break };
                if matches!(event, Event::Shutdown) {
                    info!("shutdown event received");
                    shutdown.cancel();
                    break;
                }
                match daemon.process_event(seq, event).await {
                    Ok(()) => {}
                    // A handler-level fault (e.g. a job deleted out from
                    // under a queued event) must not take the daemon down;
                    // the serialized-mutation guarantee holds regardless
                    Err(LifecycleError::Runtime(e)) => {
                        tracing::error!(error = %e, "event handler failed, continuing");
                    }
                    Err(fatal) => return Err(fatal),
                }
            }
            _ = sweep_ticker.tick() => {
                for event in daemon.sweep(startup_grace_until) {
                    daemon.event_bus.send(event).map_err(LifecycleError::Storage)?;
                }
            }
            _ = shutdown.cancelled() => {
                info!("shutdown requested");
                break;
            }
        }
    }

    // Final checkpoint so restart replays as little as possible
    {
        let state = daemon.state.lock();
        let wal = daemon.event_bus.wal();
        let mut wal = wal.lock();
        daemon.checkpointer.checkpoint(&mut wal, &state)?;
    }
    Ok(daemon)
}
