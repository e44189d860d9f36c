// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effect executor

use crate::broadcast::EventFanout;
use crate::engine::link::AgentLink;
use crate::event_bus::EventBus;
use parking_lot::Mutex;
use sc_core::{Clock, Effect, Event, TimerId};
use sc_storage::MaterializedState;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Errors that can occur during effect execution
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("storage error: {0}")]
    Storage(#[from] sc_storage::WalError),
}

/// Executes effects produced by the runtime's handlers.
pub struct Executor<L: AgentLink, C: Clock> {
    link: L,
    state: Arc<Mutex<MaterializedState>>,
    fanout: EventFanout,
    clock: C,
    /// Bus feeding timer firings back into the engine loop
    bus: EventBus,
    timers: Mutex<HashMap<TimerId, JoinHandle<()>>>,
}

impl<L, C> Executor<L, C>
where
    L: AgentLink,
    C: Clock + 'static,
{
    pub fn new(
        link: L,
        state: Arc<Mutex<MaterializedState>>,
        fanout: EventFanout,
        clock: C,
        bus: EventBus,
    ) -> Self {
        Self { link, state, fanout, clock, bus, timers: Mutex::new(HashMap::new()) }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn state(&self) -> Arc<Mutex<MaterializedState>> {
        Arc::clone(&self.state)
    }

    pub fn fanout(&self) -> &EventFanout {
        &self.fanout
    }

    /// Execute a single effect with tracing.
    ///
    /// Returns an optional event that should be fed back into the event loop.
    pub async fn execute(&self, effect: Effect) -> Result<Option<Event>, ExecuteError> {
        let info: String =
            effect.fields().iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(" ");
        let op = effect.name();
        let verbose = effect.verbose();
        if verbose {
            tracing::info!("executing effect={} {}", op, info);
        } else {
            tracing::debug!("executing effect={} {}", op, info);
        }

        let result = self.execute_inner(effect).await;
        if let Err(ref e) = result {
            tracing::error!(error = %e, "error effect={} {}", op, info);
        }
        result
    }

    /// Execute a batch, collecting result events.
    pub async fn execute_all(&self, effects: Vec<Effect>) -> Result<Vec<Event>, ExecuteError> {
        let mut events = Vec::new();
        for effect in effects {
            if let Some(event) = self.execute(effect).await? {
                events.push(event);
            }
        }
        Ok(events)
    }

    async fn execute_inner(&self, effect: Effect) -> Result<Option<Event>, ExecuteError> {
        match effect {
            Effect::Emit { event } => {
                // Apply for immediate visibility; the same event is applied
                // again when it returns through the WAL, which is harmless
                // because apply_event is idempotent.
                self.state.lock().apply_event(&event);
                Ok(Some(event))
            }

            Effect::SendToAgent { agent_id, command } => {
                let link = self.link.clone();
                tokio::spawn(async move {
                    if !link.send(&agent_id, command.clone().into()).await {
                        tracing::warn!(
                            agent_id = %agent_id,
                            command = command.name(),
                            "SendToAgent dropped: no live connection"
                        );
                    }
                });
                Ok(None)
            }

            Effect::Broadcast { event } => {
                self.fanout.publish(event);
                Ok(None)
            }

            Effect::SetTimer { id, duration } => {
                let bus = self.bus.clone();
                let timer_id = id.clone();
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(duration).await;
                    // TimerFired is transient: enqueued, never persisted
                    let _ = bus.send(Event::TimerFired { id: timer_id });
                });
                // Re-arming an id replaces the pending deadline
                if let Some(old) = self.timers.lock().insert(id, handle) {
                    old.abort();
                }
                Ok(None)
            }

            Effect::CancelTimer { id } => {
                if let Some(handle) = self.timers.lock().remove(&id) {
                    handle.abort();
                }
                Ok(None)
            }
        }
    }
}
