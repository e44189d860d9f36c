// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commands the orchestrator directs at an agent.
//!
//! These are the semantic payloads; the wire layer wraps them in envelopes
//! with message ids and timestamps before they leave the process.

use crate::id::JobId;
use crate::job::StreamConfig;
use crate::metadata::MetadataPatch;
use serde::{Deserialize, Serialize};

/// Runtime control toggles, only legal while a job is Running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobControl {
    Pause,
    Unpause,
    Mute,
    Unmute,
}

crate::simple_display! {
    JobControl {
        Pause => "pause",
        Unpause => "unpause",
        Mute => "mute",
        Unmute => "unmute",
    }
}

/// A command for one agent, dispatched fire-and-forget through the
/// connection registry; acknowledgment arrives later as an independent
/// agent message correlated by job id.
// Tagged with "command" (not "type") so the enum nests cleanly inside the
// wire layer's type-tagged message envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum AgentCommand {
    /// Offer a job; the agent answers with an assign-ack
    AssignStart {
        job_id: JobId,
        idempotency_key: String,
        config: StreamConfig,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expires_at_ms: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<MetadataPatch>,
    },
    /// Stop a job the agent is running
    JobStop {
        job_id: JobId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// Pause/unpause/mute/unmute a running job
    JobControl { job_id: JobId, control: JobControl },
    /// Live metadata change for a running job (already debounced)
    JobMetadata { job_id: JobId, patch: MetadataPatch },
    /// The agent reported a job this orchestrator no longer tracks as
    /// live; tell it to tear the pipeline down
    StopOrphan { job_id: JobId },
}

impl AgentCommand {
    pub fn job_id(&self) -> &JobId {
        match self {
            AgentCommand::AssignStart { job_id, .. }
            | AgentCommand::JobStop { job_id, .. }
            | AgentCommand::JobControl { job_id, .. }
            | AgentCommand::JobMetadata { job_id, .. }
            | AgentCommand::StopOrphan { job_id } => job_id,
        }
    }

    /// Command name for log spans
    pub fn name(&self) -> &'static str {
        match self {
            AgentCommand::AssignStart { .. } => "assign-start",
            AgentCommand::JobStop { .. } => "job-stop",
            AgentCommand::JobControl { .. } => "job-control",
            AgentCommand::JobMetadata { .. } => "job-metadata",
            AgentCommand::StopOrphan { .. } => "stop-orphan",
        }
    }
}
