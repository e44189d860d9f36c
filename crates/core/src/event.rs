// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events that trigger state transitions in the orchestrator.
//!
//! Events are facts about what happened; all coordination state is derived
//! from them. Every event except the transient ones (see
//! [`Event::is_transient`]) is appended to the WAL before its effects are
//! considered committed.

use crate::agent::AgentId;
use crate::id::JobId;
use crate::job::{JobError, RestartPolicy, StreamConfig};
use crate::metadata::MetadataPatch;
use crate::timer::TimerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Events that trigger state transitions in the system.
///
/// Serializes with `{"type": "event:name", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "system:shutdown")]
    Shutdown,

    #[serde(rename = "timer:fired")]
    TimerFired { id: TimerId },

    // -- job lifecycle --
    #[serde(rename = "job:created")]
    JobCreated {
        id: JobId,
        idempotency_key: String,
        name: String,
        stream: StreamConfig,
        restart_policy: RestartPolicy,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expires_at_ms: Option<u64>,
        created_at_ms: u64,
    },

    /// Created -> Pending, immediately after validated creation
    #[serde(rename = "job:queued")]
    JobQueued { id: JobId, at_ms: u64 },

    /// Scheduler matched the job to an agent
    #[serde(rename = "job:assigned")]
    JobAssigned { id: JobId, agent_id: AgentId, at_ms: u64 },

    /// Agent acknowledged the assignment
    #[serde(rename = "job:accepted")]
    JobAccepted { id: JobId, agent_id: AgentId, at_ms: u64 },

    /// Agent turned the assignment down; job goes back to the queue
    #[serde(rename = "job:rejected")]
    JobRejected {
        id: JobId,
        agent_id: AgentId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        at_ms: u64,
    },

    /// Agent-reported pipeline bring-up progress
    #[serde(rename = "job:starting")]
    JobStarting { id: JobId, at_ms: u64 },

    #[serde(rename = "job:running")]
    JobRunning { id: JobId, agent_id: AgentId, at_ms: u64 },

    /// Stop was requested and forwarded to the agent
    #[serde(rename = "job:stopping")]
    JobStopping {
        id: JobId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        at_ms: u64,
    },

    #[serde(rename = "job:stopped")]
    JobStopped { id: JobId, at_ms: u64 },

    #[serde(rename = "job:failed")]
    JobFailed { id: JobId, error: JobError, at_ms: u64 },

    #[serde(rename = "job:canceled")]
    JobCanceled {
        id: JobId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        at_ms: u64,
    },

    /// Operator acknowledged a terminal outcome (visibility flag only)
    #[serde(rename = "job:dismissed")]
    JobDismissed { id: JobId, at_ms: u64 },

    /// Operator explicitly removed the job from the store
    #[serde(rename = "job:deleted")]
    JobDeleted { id: JobId },

    /// Metadata pushed up from the agent or edited at the console
    #[serde(rename = "job:metadata")]
    JobMetadata {
        id: JobId,
        patch: MetadataPatch,
        /// Agent-originated patches are never forwarded back to the agent
        #[serde(default)]
        from_agent: bool,
    },

    /// Restart monitor scheduled a bounded re-queue after disconnect
    #[serde(rename = "job:restart-scheduled")]
    JobRestartScheduled { id: JobId, attempt: u32, backoff_ms: u64, at_ms: u64 },

    // -- agent directory --
    /// Successful hello handshake (first contact or reconnect)
    #[serde(rename = "agent:connected")]
    AgentConnected {
        id: AgentId,
        name: String,
        slots: u32,
        drain: bool,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        meta: BTreeMap<String, String>,
        /// Job the agent claims to still be running (reconnect mid-job);
        /// reconciled against the store by the dispatcher
        #[serde(default, skip_serializing_if = "Option::is_none")]
        active_job: Option<JobId>,
        at_ms: u64,
    },

    /// Heartbeat or any other sign of life; transient, never persisted
    #[serde(rename = "agent:seen")]
    AgentSeen { id: AgentId, at_ms: u64 },

    /// Agent-reported lifecycle state change (idle/starting/running/stopping)
    #[serde(rename = "agent:state")]
    AgentStateChanged { id: AgentId, state: crate::agent::AgentState, at_ms: u64 },

    /// Heartbeat timeout or connection loss
    #[serde(rename = "agent:offline")]
    AgentOffline { id: AgentId, at_ms: u64 },

    /// Operator toggled the drain flag
    #[serde(rename = "agent:drain")]
    AgentDrain { id: AgentId, drain: bool, at_ms: u64 },
}

impl Event {
    /// Transient events refresh liveness bookkeeping but carry no
    /// coordination fact worth a WAL append; they bypass persistence.
    pub fn is_transient(&self) -> bool {
        matches!(self, Event::AgentSeen { .. } | Event::TimerFired { .. })
    }

    /// The job this event concerns, if any.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Event::JobCreated { id, .. }
            | Event::JobQueued { id, .. }
            | Event::JobAssigned { id, .. }
            | Event::JobAccepted { id, .. }
            | Event::JobRejected { id, .. }
            | Event::JobStarting { id, .. }
            | Event::JobRunning { id, .. }
            | Event::JobStopping { id, .. }
            | Event::JobStopped { id, .. }
            | Event::JobFailed { id, .. }
            | Event::JobCanceled { id, .. }
            | Event::JobDismissed { id, .. }
            | Event::JobDeleted { id }
            | Event::JobMetadata { id, .. }
            | Event::JobRestartScheduled { id, .. } => Some(id),
            _ => None,
        }
    }

    /// One-line summary for structured logging.
    pub fn log_summary(&self) -> String {
        match self {
            Event::Shutdown => "shutdown".to_string(),
            Event::TimerFired { id } => format!("timer-fired {}", id),
            Event::JobCreated { id, name, .. } => format!("job-created {} name={}", id, name),
            Event::JobQueued { id, .. } => format!("job-queued {}", id),
            Event::JobAssigned { id, agent_id, .. } => {
                format!("job-assigned {} agent={}", id, agent_id)
            }
            Event::JobAccepted { id, agent_id, .. } => {
                format!("job-accepted {} agent={}", id, agent_id)
            }
            Event::JobRejected { id, agent_id, .. } => {
                format!("job-rejected {} agent={}", id, agent_id)
            }
            Event::JobStarting { id, .. } => format!("job-starting {}", id),
            Event::JobRunning { id, agent_id, .. } => {
                format!("job-running {} agent={}", id, agent_id)
            }
            Event::JobStopping { id, .. } => format!("job-stopping {}", id),
            Event::JobStopped { id, .. } => format!("job-stopped {}", id),
            Event::JobFailed { id, error, .. } => format!("job-failed {} {}", id, error.code),
            Event::JobCanceled { id, .. } => format!("job-canceled {}", id),
            Event::JobDismissed { id, .. } => format!("job-dismissed {}", id),
            Event::JobDeleted { id } => format!("job-deleted {}", id),
            Event::JobMetadata { id, .. } => format!("job-metadata {}", id),
            Event::JobRestartScheduled { id, attempt, backoff_ms, .. } => {
                format!("job-restart-scheduled {} attempt={} backoff_ms={}", id, attempt, backoff_ms)
            }
            Event::AgentConnected { id, .. } => format!("agent-connected {}", id),
            Event::AgentSeen { id, .. } => format!("agent-seen {}", id),
            Event::AgentStateChanged { id, state, .. } => {
                format!("agent-state {} {}", id, state)
            }
            Event::AgentOffline { id, .. } => format!("agent-offline {}", id),
            Event::AgentDrain { id, drain, .. } => format!("agent-drain {} drain={}", id, drain),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
