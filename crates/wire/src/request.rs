// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Console protocol: requests from the operator CLI/console to the daemon.

use sc_core::{MetadataPatch, RestartPolicy, StreamConfig};
use serde::{Deserialize, Serialize};

/// Request from console to daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Create a job (idempotent on `idempotency_key`)
    CreateJob {
        idempotency_key: String,
        name: String,
        stream: StreamConfig,
        #[serde(default)]
        restart_policy: RestartPolicy,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expires_at_ms: Option<u64>,
    },

    /// Stop a non-terminal job (cancels it if nothing accepted it yet)
    StopJob {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Pause/unpause/mute/unmute a running job
    PauseJob { id: String },
    UnpauseJob { id: String },
    MuteJob { id: String },
    UnmuteJob { id: String },

    /// Acknowledge a terminal job (visibility flag)
    DismissJob { id: String },

    /// Remove a job from the store entirely
    DeleteJob { id: String },

    /// Merge a metadata patch (and forward to the agent, debounced)
    UpdateJobMetadata { id: String, patch: MetadataPatch },

    /// List jobs, optionally including dismissed terminal ones
    ListJobs {
        #[serde(default)]
        include_dismissed: bool,
    },

    /// Single job details (accepts a unique id prefix)
    GetJob { id: String },

    /// List agents (deduplicated by display name for presentation)
    ListAgents,

    /// Flip an agent's drain flag
    SetAgentDrain { id: String, drain: bool },

    /// Ask the remote-execution collaborator to reboot an agent host
    RebootAgent { id: String, reason: String },

    /// Switch this connection into a live event feed
    Subscribe,

    /// Daemon status
    Status,

    /// Graceful shutdown
    Shutdown,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
