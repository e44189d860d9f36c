// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DTO projections of jobs and agents for the console protocol.
//!
//! These deliberately mirror, rather than reuse, the core structs: the wire
//! surface stays stable while the core types evolve.

use sc_core::{AgentRecord, AgentState, Job, JobError, JobStatus, RestartPolicy, StreamMetadata};
use serde::{Deserialize, Serialize};

/// One row in `sc job list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub name: String,
    pub status: JobStatus,
    pub dismissed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer_count: Option<u64>,
    pub created_at_ms: u64,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.to_string(),
            name: job.name.clone(),
            status: job.status,
            dismissed: job.dismissed,
            agent_id: job.assigned_agent_id.as_ref().map(|a| a.to_string()),
            title: job.metadata.title.as_ref().map(|s| s.value.clone()),
            viewer_count: job.metadata.viewer_count.as_ref().map(|s| s.value),
            created_at_ms: job.created_at_ms,
        }
    }
}

/// Full job detail for `sc job show`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDetail {
    pub id: String,
    pub idempotency_key: String,
    pub name: String,
    pub status: JobStatus,
    pub dismissed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub restart_policy: RestartPolicy,
    pub metadata: StreamMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at_ms: Option<u64>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl From<&Job> for JobDetail {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.to_string(),
            idempotency_key: job.idempotency_key.clone(),
            name: job.name.clone(),
            status: job.status,
            dismissed: job.dismissed,
            agent_id: job.assigned_agent_id.as_ref().map(|a| a.to_string()),
            restart_policy: job.restart_policy,
            metadata: job.metadata.clone(),
            error: job.error.clone(),
            expires_at_ms: job.expires_at_ms,
            created_at_ms: job.created_at_ms,
            updated_at_ms: job.updated_at_ms,
        }
    }
}

/// One row in `sc agent list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub id: String,
    pub name: String,
    pub state: AgentState,
    pub drain: bool,
    pub slots: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_job_id: Option<String>,
    pub last_seen_ms: u64,
}

impl From<&AgentRecord> for AgentSummary {
    fn from(agent: &AgentRecord) -> Self {
        Self {
            id: agent.id.to_string(),
            name: agent.name.clone(),
            state: agent.state,
            drain: agent.drain,
            slots: agent.slots,
            current_job_id: agent.current_job_id.as_ref().map(|j| j.to_string()),
            last_seen_ms: agent.last_seen_ms,
        }
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
