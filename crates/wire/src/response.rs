// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Console protocol: responses from the daemon.

use sc_core::Event;
use serde::{Deserialize, Serialize};

use super::{AgentSummary, JobDetail, JobSummary};

/// Response from daemon to console
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success
    Ok,

    /// Health check response
    Pong,

    /// Version handshake response
    Hello { version: String },

    /// Daemon is shutting down
    ShuttingDown,

    /// Job created (or found via idempotency key)
    JobCreated {
        id: String,
        /// False when the idempotency key matched an existing job
        created: bool,
    },

    /// List of jobs
    Jobs { jobs: Vec<JobSummary> },

    /// Single job details
    Job { job: Option<Box<JobDetail>> },

    /// List of agents
    Agents { agents: Vec<AgentSummary> },

    /// Daemon status
    Status { uptime_secs: u64, jobs_active: usize, agents_online: usize },

    /// Subscription accepted; event frames follow on this connection
    Subscribed,

    /// One event on a subscribed connection
    Event { event: Event },

    /// Error response (state errors carry the rejection reason)
    Error { message: String },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
