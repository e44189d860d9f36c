// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler: matches pending jobs to idle agents.
//!
//! Invoked synchronously from the dispatcher on every capacity-changing
//! event (job creation, agent becoming idle, drain turning off, terminal
//! transitions). There is no background polling loop; every path that frees
//! capacity triggers a pass before control returns to the caller.

use sc_core::AgentId;
use sc_storage::MaterializedState;

/// Outcome of one assignment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// Matched; the dispatcher emits `job:assigned` and sends assign-start
    Assigned(AgentId),
    /// No qualifying agent right now; the job stays Pending
    Deferred,
    /// `expires_at` lapsed before assignment; cancel instead
    Expired,
}

/// The assignment algorithm. Stateless: every decision reads the
/// materialized state the dispatcher already holds locked.
pub struct Scheduler;

impl Scheduler {
    /// Attempt to place one pending job.
    ///
    /// Selects an agent with `state == Idle`, `drain == false` and no
    /// current job. Tie-break is lexicographic by agent id: deterministic
    /// and stable across passes, which is all the fairness the fleet needs
    /// ("eventually tried again on the next pass").
    pub fn try_assign(
        state: &MaterializedState,
        job_id: &str,
        now_ms: u64,
        exclude: Option<&AgentId>,
    ) -> Assignment {
        let Some(job) = state.jobs.get(job_id) else {
            return Assignment::Deferred;
        };
        if job.is_expired(now_ms) {
            return Assignment::Expired;
        }
        if job.status != sc_core::JobStatus::Pending {
            return Assignment::Deferred;
        }

        let mut candidates: Vec<&AgentId> = state
            .agents
            .values()
            .filter(|agent| agent.is_assignable())
            .filter(|agent| exclude != Some(&agent.id))
            .map(|agent| &agent.id)
            .collect();
        candidates.sort();

        match candidates.first() {
            Some(agent_id) => Assignment::Assigned((*agent_id).clone()),
            None => Assignment::Deferred,
        }
    }

    /// Pending jobs in scheduling order: oldest first, id as tie-break so
    /// two jobs created in the same millisecond order deterministically.
    pub fn pending_jobs(state: &MaterializedState) -> Vec<String> {
        let mut pending: Vec<(u64, String)> = state
            .jobs
            .values()
            .filter(|job| job.status == sc_core::JobStatus::Pending)
            .map(|job| (job.created_at_ms, job.id.to_string()))
            .collect();
        pending.sort();
        pending.into_iter().map(|(_, id)| id).collect()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
