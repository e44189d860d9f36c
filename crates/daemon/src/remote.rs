// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote-execution collaborator for administrative host actions.
//!
//! Rebooting an agent host goes through out-of-band remote administration
//! (credentials live in the agent's opaque `meta` bag), not through the
//! agent connection; the whole point is reaching a host whose agent is
//! wedged. The orchestrator only forwards the intent; it never changes job
//! state on reboot.

use async_trait::async_trait;
use sc_core::AgentRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteExecError {
    #[error("agent {0} has no remote-admin credentials")]
    NoCredentials(String),

    #[error("remote execution failed: {0}")]
    Failed(String),
}

/// External collaborator that can act on an agent's host.
#[async_trait]
pub trait RemoteExec: Send + Sync {
    async fn reboot(&self, agent: &AgentRecord, reason: &str) -> Result<(), RemoteExecError>;
}

/// Default implementation: validates credentials exist and records the
/// intent; the actual transport is deployment-specific and wired in by the
/// operator (e.g. an IPMI or ssh hook watching the log stream).
pub struct LoggingRemoteExec;

#[async_trait]
impl RemoteExec for LoggingRemoteExec {
    async fn reboot(&self, agent: &AgentRecord, reason: &str) -> Result<(), RemoteExecError> {
        if !agent.meta.keys().any(|k| k.starts_with("reboot.")) {
            return Err(RemoteExecError::NoCredentials(agent.id.to_string()));
        }
        tracing::warn!(agent_id = %agent.id, reason, "reboot requested, forwarding to remote admin");
        Ok(())
    }
}
