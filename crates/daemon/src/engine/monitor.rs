// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure/restart monitor.
//!
//! Decides what happens to a job when the agent holding it disappears:
//! bounded re-queue with backoff under `on-failure`, terminal Failed
//! otherwise. The decision is pure; the runtime applies it as events.

use sc_core::{Job, JobError, RestartPolicy, RestartTracker};

/// What to do with a job whose agent disconnected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorAction {
    /// Schedule a re-queue: emit `job:restart-scheduled` and arm the
    /// backoff timer
    Requeue { attempt: u32, backoff_ms: u64 },
    /// Policy forbids (or budget exhausted): fail terminally now
    Fail(JobError),
    /// Job already terminal or unassigned; nothing to do
    None,
}

/// Apply the restart policy to a job that just lost its agent.
///
/// Duplicate disconnect signals for the same incident are deduplicated
/// upstream by the status machine (a job already pulled back to Pending or
/// already terminal short-circuits to `None` here).
pub fn on_agent_lost(job: &Job, tracker: &mut RestartTracker, now_ms: u64) -> MonitorAction {
    if job.is_terminal() {
        return MonitorAction::None;
    }
    let Some(ref agent_id) = job.assigned_agent_id else {
        return MonitorAction::None;
    };

    match job.restart_policy {
        RestartPolicy::Never => MonitorAction::Fail(JobError::agent_disconnected(agent_id)),
        RestartPolicy::OnFailure => match tracker.begin_attempt(&job.id, now_ms) {
            Some((attempt, backoff_ms)) => MonitorAction::Requeue { attempt, backoff_ms },
            None => MonitorAction::Fail(JobError::restarts_exhausted(tracker.attempts(&job.id))),
        },
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
