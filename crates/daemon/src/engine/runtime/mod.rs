// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime for the stagecast engine

mod handlers;

use crate::engine::executor::Executor;
use crate::engine::link::AgentLink;
use crate::engine::scheduler::{Assignment, Scheduler};
use crate::engine::RuntimeError;
use parking_lot::Mutex;
use sc_core::{
    AgentId, Clock, Effect, Event, Job, MetadataPatch, RestartTracker, TimerId,
};
use sc_storage::MaterializedState;
use std::collections::{HashMap, HashSet};

/// Tunable coordination intervals, shared with agents at hello.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub heartbeat_interval_ms: u64,
    pub heartbeat_timeout_ms: u64,
    pub stop_grace_ms: u64,
    pub kill_after_ms: u64,
    /// Coalescing window for operator metadata edits before the merged
    /// patch is forwarded to the agent
    pub metadata_debounce_ms: u64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: 5_000,
            heartbeat_timeout_ms: 15_000,
            stop_grace_ms: 10_000,
            kill_after_ms: 30_000,
            metadata_debounce_ms: 750,
        }
    }
}

/// Runtime that coordinates the system.
///
/// All mutating logic runs on the single engine loop; the runtime's own
/// side tables (restart budget, backoff holds, pending metadata) are
/// ephemeral and rebuilt empty after a restart.
pub struct Runtime<L: AgentLink, C: Clock> {
    pub executor: Executor<L, C>,
    pub(crate) settings: RuntimeSettings,
    pub(crate) restarts: Mutex<RestartTracker>,
    /// Jobs pulled off a dead agent, parked until their backoff timer fires
    pub(crate) held: Mutex<HashSet<String>>,
    /// Debounced operator metadata per job: pending delta + one scheduled flush
    pub(crate) pending_meta: Mutex<HashMap<String, MetadataPatch>>,
}

impl<L, C> Runtime<L, C>
where
    L: AgentLink,
    C: Clock + 'static,
{
    pub fn new(executor: Executor<L, C>, settings: RuntimeSettings) -> Self {
        Self {
            executor,
            settings,
            restarts: Mutex::new(RestartTracker::new()),
            held: Mutex::new(HashSet::new()),
            pending_meta: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    /// Helper to lock state for reading
    pub(crate) fn lock_state<T>(&self, f: impl FnOnce(&MaterializedState) -> T) -> T {
        let state = self.executor.state();
        let guard = state.lock();
        f(&guard)
    }

    /// Get a specific job by ID or unique prefix
    pub fn get_job(&self, id: &str) -> Option<Job> {
        self.lock_state(|state| state.get_job(id).cloned())
    }

    pub(crate) fn require_job(&self, id: &str) -> Result<Job, RuntimeError> {
        self.get_job(id).ok_or_else(|| RuntimeError::JobNotFound(id.to_string()))
    }

    /// One scheduling pass over every pending job.
    ///
    /// Assignments are applied to state as they are made (via `Emit`), so a
    /// single pass never double-books an agent. `exclude` drops one agent
    /// from consideration for this pass (an agent that just rejected).
    pub(crate) async fn scheduling_pass(
        &self,
        exclude: Option<&AgentId>,
    ) -> Result<Vec<Event>, RuntimeError> {
        let pending = self.lock_state(Scheduler::pending_jobs);
        let mut events = Vec::new();
        for job_id in pending {
            events.extend(self.try_assign_one(&job_id, exclude).await?);
        }
        Ok(events)
    }

    /// Attempt to place a single job (skipping jobs parked for backoff).
    pub(crate) async fn try_assign_one(
        &self,
        job_id: &str,
        exclude: Option<&AgentId>,
    ) -> Result<Vec<Event>, RuntimeError> {
        if self.held.lock().contains(job_id) {
            return Ok(Vec::new());
        }
        let now_ms = self.executor.clock().epoch_ms();
        let assignment = self.lock_state(|state| Scheduler::try_assign(state, job_id, now_ms, exclude));
        match assignment {
            Assignment::Assigned(agent_id) => {
                let id = sc_core::JobId::from_string(job_id);
                tracing::info!(job_id, agent_id = %agent_id, "scheduler matched job to agent");
                Ok(self
                    .executor
                    .execute_all(vec![Effect::Emit {
                        event: Event::JobAssigned { id, agent_id, at_ms: now_ms },
                    }])
                    .await?)
            }
            Assignment::Expired => {
                let id = sc_core::JobId::from_string(job_id);
                tracing::info!(job_id, "job expired before assignment");
                Ok(self
                    .executor
                    .execute_all(vec![Effect::Emit {
                        event: Event::JobCanceled {
                            id,
                            reason: Some("expired".to_string()),
                            at_ms: now_ms,
                        },
                    }])
                    .await?)
            }
            Assignment::Deferred => Ok(Vec::new()),
        }
    }

    /// Forget every ephemeral trace of a job (terminal transition or delete).
    pub(crate) async fn forget_job(&self, job_id: &str) -> Result<(), RuntimeError> {
        let id = sc_core::JobId::from_string(job_id);
        self.restarts.lock().clear(&id);
        self.held.lock().remove(job_id);
        self.pending_meta.lock().remove(job_id);
        self.executor
            .execute_all(vec![
                Effect::CancelTimer { id: TimerId::expiry(&id) },
                Effect::CancelTimer { id: TimerId::restart(&id) },
                Effect::CancelTimer { id: TimerId::metadata_flush(&id) },
            ])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../runtime_tests/mod.rs"]
mod tests;
