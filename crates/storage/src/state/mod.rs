// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

mod agents;
mod helpers;
mod jobs;

use sc_core::{AgentRecord, Event, Job, JobId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Materialized state built from WAL operations
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub jobs: HashMap<String, Job>,
    /// Agent directory: records are never hard-deleted, only marked offline,
    /// so metadata and history survive reconnect.
    #[serde(default)]
    pub agents: HashMap<String, AgentRecord>,
    /// idempotency_key -> job id, for create deduplication
    #[serde(default)]
    pub idempotency: HashMap<String, JobId>,
}

impl MaterializedState {
    /// Get a job by ID or unique prefix (like git commit hashes)
    pub fn get_job(&self, id: &str) -> Option<&Job> {
        helpers::find_by_prefix(&self.jobs, id)
    }

    pub fn get_job_mut(&mut self, id: &str) -> Option<&mut Job> {
        let key = helpers::find_by_prefix(&self.jobs, id).map(|j| j.id.to_string())?;
        self.jobs.get_mut(&key)
    }

    /// Look up a job by its creator-supplied idempotency key.
    pub fn job_for_idempotency_key(&self, key: &str) -> Option<&Job> {
        let id = self.idempotency.get(key)?;
        self.jobs.get(id.as_str())
    }

    /// Count of non-terminal jobs.
    pub fn active_jobs(&self) -> usize {
        self.jobs.values().filter(|j| !j.is_terminal()).count()
    }

    /// Agents for presentation, deduplicated by display name.
    ///
    /// When multiple stored records share a display name (a re-provisioned
    /// host), prefer the one in a non-offline state, else the most recently
    /// seen. Storage keeps all of them; only the listing collapses.
    pub fn agents_for_listing(&self) -> Vec<&AgentRecord> {
        let mut best: HashMap<&str, &AgentRecord> = HashMap::new();
        for agent in self.agents.values() {
            match best.get(agent.name.as_str()) {
                Some(current) if !prefer(agent, current) => {}
                _ => {
                    best.insert(agent.name.as_str(), agent);
                }
            }
        }
        let mut list: Vec<&AgentRecord> = best.into_values().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    /// Apply an event to derive state changes.
    ///
    /// This is the event-sourcing approach where state is derived from
    /// events. Events are facts about what happened; state is derived from
    /// those facts.
    ///
    /// # Idempotency Requirement
    ///
    /// **All event handlers MUST be idempotent.** Applying the same event
    /// twice must produce the same state as applying it once: events are
    /// applied once for immediate visibility and again when they come back
    /// through WAL replay after a restart.
    ///
    /// Guidelines:
    /// - Use assignment (`=`) instead of mutation (`+=`, `-=`)
    /// - Guard inserts with existence checks
    /// - Guard transitions through `Job::advance`, which ignores edges the
    ///   state machine has already taken
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::JobCreated { .. }
            | Event::JobQueued { .. }
            | Event::JobAssigned { .. }
            | Event::JobAccepted { .. }
            | Event::JobRejected { .. }
            | Event::JobStarting { .. }
            | Event::JobRunning { .. }
            | Event::JobStopping { .. }
            | Event::JobStopped { .. }
            | Event::JobFailed { .. }
            | Event::JobCanceled { .. }
            | Event::JobDismissed { .. }
            | Event::JobDeleted { .. }
            | Event::JobMetadata { .. }
            | Event::JobRestartScheduled { .. } => jobs::apply(self, event),

            Event::AgentConnected { .. }
            | Event::AgentSeen { .. }
            | Event::AgentStateChanged { .. }
            | Event::AgentOffline { .. }
            | Event::AgentDrain { .. } => agents::apply(self, event),

            // Control events carry no state
            Event::Shutdown | Event::TimerFired { .. } => {}
        }
    }
}

/// Whether `candidate` beats `current` for same-name presentation dedup.
fn prefer(candidate: &AgentRecord, current: &AgentRecord) -> bool {
    match (candidate.state.is_offline(), current.state.is_offline()) {
        (false, true) => true,
        (true, false) => false,
        _ => candidate.last_seen_ms > current.last_seen_ms,
    }
}

#[cfg(test)]
#[path = "../state_tests/mod.rs"]
mod tests;
