// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier and status state machine.

use crate::agent::AgentId;
use crate::id::JobId;
use crate::metadata::StreamMetadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle status of a job.
///
/// Legal edges are encoded in [`JobStatus::can_transition`]; everything in
/// the dispatcher validates against that table before mutating, so a status
/// only ever moves along the edges below:
///
/// ```text
/// Created -> Pending -> Assigned -> Accepted -> Starting -> Running
///                 ^          |
///                 +----------+  (agent reject)
/// Running -> Stopping -> Stopped
/// any non-terminal -> Failed | Canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Created,
    Pending,
    Assigned,
    Accepted,
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
    Canceled,
}

crate::simple_display! {
    JobStatus {
        Created => "created",
        Pending => "pending",
        Assigned => "assigned",
        Accepted => "accepted",
        Starting => "starting",
        Running => "running",
        Stopping => "stopping",
        Stopped => "stopped",
        Failed => "failed",
        Canceled => "canceled",
    }
}

impl JobStatus {
    /// No further lifecycle transition is legal from these.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Stopped | JobStatus::Failed | JobStatus::Canceled)
    }

    /// Whether the status-machine edge `self -> to` is legal.
    pub fn can_transition(&self, to: JobStatus) -> bool {
        use JobStatus::*;
        if self.is_terminal() {
            return false;
        }
        match (self, to) {
            (Created, Pending) => true,
            (Pending, Assigned) => true,
            (Assigned, Accepted) => true,
            (Accepted, Starting) => true,
            (Starting, Running) => true,
            // Agents may report running without a distinct starting phase
            (Accepted, Running) => true,
            // Operator stop is forwarded to the agent from any post-accept state
            (Accepted | Starting | Running, Stopping) => true,
            (Stopping, Stopped) => true,
            // Agent self-reported clean shutdown without a stopping phase
            (Running, Stopped) => true,
            // Agent reject, or the restart monitor re-queueing a job it
            // pulled off a dead agent
            (Assigned | Accepted | Starting | Running | Stopping, Pending) => true,
            // Any non-terminal state can fail or be canceled
            (_, Failed) => true,
            (_, Canceled) => true,
            _ => false,
        }
    }

    /// Statuses from which pause/unpause/mute/unmute are accepted.
    pub fn accepts_controls(&self) -> bool {
        matches!(self, JobStatus::Running)
    }
}

/// Error recorded on a job's transition to Failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    pub code: String,
    pub message: String,
}

impl JobError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }

    /// Orchestrator-detected agent disconnect while the job was live.
    pub fn agent_disconnected(agent_id: &AgentId) -> Self {
        Self::new("agent-disconnected", format!("agent {} disconnected", agent_id))
    }

    /// Restart policy exhausted its attempt budget.
    pub fn restarts_exhausted(attempts: u32) -> Self {
        Self::new("restarts-exhausted", format!("gave up after {} restart attempts", attempts))
    }
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Per-job rule governing whether a disconnect/crash triggers reassignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    #[default]
    Never,
    OnFailure,
}

crate::simple_display! {
    RestartPolicy {
        Never => "never",
        OnFailure => "on-failure",
    }
}

/// Creator-supplied stream payload, opaque to the coordination core beyond
/// being forwarded to the agent at assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Platform ingest key
    pub stream_key: String,
    /// Display name for the broadcast
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Anything else the agent's pipeline controller understands
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

/// Configuration for creating a new job
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub id: JobId,
    pub idempotency_key: String,
    pub name: String,
    pub stream: StreamConfig,
    pub restart_policy: RestartPolicy,
    pub expires_at_ms: Option<u64>,
}

impl JobConfig {
    pub fn builder(id: impl Into<JobId>, idempotency_key: impl Into<String>) -> JobConfigBuilder {
        let key = idempotency_key.into();
        JobConfigBuilder {
            id: id.into(),
            idempotency_key: key.clone(),
            name: key,
            stream: StreamConfig::default(),
            restart_policy: RestartPolicy::default(),
            expires_at_ms: None,
        }
    }
}

pub struct JobConfigBuilder {
    id: JobId,
    idempotency_key: String,
    name: String,
    stream: StreamConfig,
    restart_policy: RestartPolicy,
    expires_at_ms: Option<u64>,
}

impl JobConfigBuilder {
    crate::setters! {
        into {
            name: String,
        }
        set {
            stream: StreamConfig,
            restart_policy: RestartPolicy,
        }
        option {
            expires_at_ms: u64,
        }
    }

    pub fn build(self) -> JobConfig {
        JobConfig {
            id: self.id,
            idempotency_key: self.idempotency_key,
            name: self.name,
            stream: self.stream,
            restart_policy: self.restart_policy,
            expires_at_ms: self.expires_at_ms,
        }
    }
}

/// One unit of "run this stream" work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Caller-supplied dedup token; a repeat create with the same key
    /// returns this job instead of creating another
    pub idempotency_key: String,
    pub name: String,
    pub status: JobStatus,
    /// Operator acknowledgment of a terminal outcome; a visibility flag,
    /// never a lifecycle transition
    #[serde(default)]
    pub dismissed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_agent_id: Option<AgentId>,
    pub stream: StreamConfig,
    #[serde(default)]
    pub restart_policy: RestartPolicy,
    #[serde(default)]
    pub metadata: StreamMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
    /// Hard deadline: still Pending/Assigned past this -> Canceled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at_ms: Option<u64>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Job {
    /// Create a new job in Created with explicit epoch_ms (for WAL replay)
    pub fn new_with_epoch_ms(config: JobConfig, epoch_ms: u64) -> Self {
        Self {
            id: config.id,
            idempotency_key: config.idempotency_key,
            name: config.name,
            status: JobStatus::Created,
            dismissed: false,
            assigned_agent_id: None,
            stream: config.stream,
            restart_policy: config.restart_policy,
            metadata: StreamMetadata::default(),
            error: None,
            expires_at_ms: config.expires_at_ms,
            created_at_ms: epoch_ms,
            updated_at_ms: epoch_ms,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// True when `expires_at_ms` has passed and the job never reached
    /// Accepted (late acceptance must be rejected per the expiry contract).
    pub fn is_expired(&self, now_ms: u64) -> bool {
        matches!(self.status, JobStatus::Created | JobStatus::Pending | JobStatus::Assigned)
            && self.expires_at_ms.is_some_and(|deadline| now_ms >= deadline)
    }

    /// Apply a legal status transition; illegal edges are ignored so event
    /// replay stays idempotent (the dispatcher has already validated the
    /// edge before the event was ever written).
    pub fn advance(&mut self, to: JobStatus, epoch_ms: u64) -> bool {
        if !self.status.can_transition(to) {
            return false;
        }
        self.status = to;
        self.updated_at_ms = epoch_ms;
        if to.is_terminal() {
            self.assigned_agent_id = None;
        }
        true
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            id: JobId = "job-test0000000000000000",
            idempotency_key: String = "key-1",
            name: String = "test-stream",
        }
        set {
            status: JobStatus = JobStatus::Pending,
            dismissed: bool = false,
            stream: StreamConfig = StreamConfig::default(),
            restart_policy: RestartPolicy = RestartPolicy::Never,
            metadata: StreamMetadata = StreamMetadata::default(),
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
        option {
            assigned_agent_id: AgentId = None,
            error: JobError = None,
            expires_at_ms: u64 = None,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
