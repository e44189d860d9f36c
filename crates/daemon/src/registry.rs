// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection registry: live agent transport sessions.
//!
//! Each connection attempt gets a monotonic generation number. A new hello
//! for an agent id supersedes the previous session; every inbound frame is
//! checked against the current generation before it may touch shared state,
//! so a stale connection's events are discarded rather than interleaved.

use parking_lot::Mutex;
use sc_core::{AgentId, Clock};
use sc_wire::DaemonMessage;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Outbound queue depth per agent connection. Commands are small and rare;
/// a full queue means the writer is wedged and the message is dropped.
const OUTBOUND_DEPTH: usize = 64;

struct Session {
    generation: u64,
    outbound: mpsc::Sender<DaemonMessage>,
    last_seen: Instant,
}

/// Registry of live agent connections, shared between the listener (which
/// registers and touches sessions) and the engine (which sends commands and
/// sweeps for heartbeat timeouts).
pub struct ConnectionRegistry<C: Clock> {
    sessions: Mutex<HashMap<AgentId, Session>>,
    next_generation: AtomicU64,
    clock: C,
    heartbeat_timeout: Duration,
}

impl<C: Clock> ConnectionRegistry<C> {
    pub fn new(clock: C, heartbeat_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
            clock,
            heartbeat_timeout,
        })
    }

    /// Bind a connection to an agent id, superseding any live session.
    ///
    /// Returns the new generation. The superseded session's outbound sender
    /// is dropped, which ends its writer task; its reader task notices via
    /// [`is_current`](Self::is_current) and discards anything in flight.
    pub fn register(&self, agent_id: AgentId, outbound: mpsc::Sender<DaemonMessage>) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let mut sessions = self.sessions.lock();
        if let Some(old) = sessions.insert(
            agent_id.clone(),
            Session { generation, outbound, last_seen: self.clock.now() },
        ) {
            tracing::info!(
                agent_id = %agent_id,
                old_generation = old.generation,
                new_generation = generation,
                "connection superseded"
            );
        }
        generation
    }

    /// Whether `generation` is still the live session for this agent.
    pub fn is_current(&self, agent_id: &AgentId, generation: u64) -> bool {
        self.sessions
            .lock()
            .get(agent_id)
            .is_some_and(|session| session.generation == generation)
    }

    /// Refresh the liveness deadline; ignored for superseded generations.
    pub fn touch(&self, agent_id: &AgentId, generation: u64) {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.get_mut(agent_id) {
            if session.generation == generation {
                session.last_seen = self.clock.now();
            }
        }
    }

    /// Remove the session if `generation` is still current.
    ///
    /// Returns true when the removal happened (the caller should declare
    /// the agent offline); false when a newer session already took over.
    pub fn disconnect(&self, agent_id: &AgentId, generation: u64) -> bool {
        let mut sessions = self.sessions.lock();
        match sessions.get(agent_id) {
            Some(session) if session.generation == generation => {
                sessions.remove(agent_id);
                true
            }
            _ => false,
        }
    }

    /// Drop every session whose heartbeat deadline has lapsed.
    ///
    /// Returns the ids to declare offline.
    pub fn sweep(&self) -> Vec<AgentId> {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock();
        let expired: Vec<AgentId> = sessions
            .iter()
            .filter(|(_, s)| now.duration_since(s.last_seen) >= self.heartbeat_timeout)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            sessions.remove(id);
            tracing::warn!(agent_id = %id, "heartbeat timeout, dropping session");
        }
        expired
    }

    pub fn is_connected(&self, agent_id: &AgentId) -> bool {
        self.sessions.lock().contains_key(agent_id)
    }

    pub fn connected_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Queue a message for the agent's current connection.
    ///
    /// Fire-and-forget: no live session or a wedged writer drops the
    /// message with a warning; acknowledgment arrives (or not) as a later
    /// agent event.
    pub fn send(&self, agent_id: &AgentId, message: DaemonMessage) -> bool {
        let outbound = {
            let sessions = self.sessions.lock();
            match sessions.get(agent_id) {
                Some(session) => session.outbound.clone(),
                None => {
                    tracing::warn!(agent_id = %agent_id, "no live connection, dropping message");
                    return false;
                }
            }
        };
        match outbound.try_send(message) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(agent_id = %agent_id, error = %e, "outbound queue full, dropping message");
                false
            }
        }
    }

    /// Standard outbound channel for a new connection.
    pub fn outbound_channel() -> (mpsc::Sender<DaemonMessage>, mpsc::Receiver<DaemonMessage>) {
        mpsc::channel(OUTBOUND_DEPTH)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
