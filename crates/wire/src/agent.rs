// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent protocol message bodies.

use sc_core::{AgentCommand, JobControl, JobError, JobId, JobStatus, MetadataPatch};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Job the agent claims to still be running when it reconnects mid-job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveJob {
    pub job_id: JobId,
    pub status: JobStatus,
}

/// Hello payload: everything the directory needs to upsert the agent.
///
/// The claimed agent id travels on the envelope; `host` is the raw host
/// identity the orchestrator falls back to (and re-derives from) when the
/// claimed id is absent or normalizes badly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentHello {
    /// Raw host identity (hostname or machine id)
    pub host: String,
    pub name: String,
    /// Concurrent job slots
    pub slots: u32,
    #[serde(default)]
    pub drain: bool,
    /// Present when reconnecting mid-job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_job: Option<ActiveJob>,
    pub auth_token: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

/// Messages an agent sends to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AgentMessage {
    Hello(AgentHello),

    /// Periodic liveness signal; optional pipeline metrics ride along
    Heartbeat {
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        metrics: BTreeMap<String, f64>,
    },

    /// Accept or reject an assign-start
    AssignAck {
        job_id: JobId,
        accepted: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Status/metadata push while a job is live
    JobUpdate {
        job_id: JobId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<JobStatus>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<MetadataPatch>,
    },

    /// Terminal report: the pipeline is down
    JobStopped {
        job_id: JobId,
        status: JobStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<JobError>,
    },

    /// Acknowledgment of a pause/unpause/mute/unmute
    ControlAck { job_id: JobId, control: JobControl, applied: bool },
}

/// Handshake parameters returned on successful hello.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloOk {
    pub heartbeat_interval_ms: u64,
    pub heartbeat_timeout_ms: u64,
    /// How long the agent should wait for a clean pipeline stop
    pub stop_grace_ms: u64,
    /// Hard kill of the encoder after this, counted from the stop request
    pub kill_after_ms: u64,
}

/// Messages the orchestrator sends to an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DaemonMessage {
    HelloOk(HelloOk),
    HelloReject { reason: String },
    /// Semantic job command; see [`AgentCommand`] for the variants
    Command(AgentCommand),
}

impl From<AgentCommand> for DaemonMessage {
    fn from(command: AgentCommand) -> Self {
        DaemonMessage::Command(command)
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
