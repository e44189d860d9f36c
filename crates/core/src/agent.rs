// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identifier and directory record.
//!
//! Agent ids are derived from host identity at hello time, not generated
//! randomly, so an agent keeps its id (and therefore its directory record,
//! metadata, and job history) across reconnects and orchestrator restarts.

use crate::id::JobId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier for an agent, derived from host identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    /// Create an AgentId from an already-derived string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for AgentId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AgentId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for AgentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Derive a normalized agent id from a host-supplied candidate.
///
/// Lowercases, maps runs of non `[a-z0-9-]` characters to a single `-`, and
/// trims leading/trailing dashes. A candidate that normalizes to an empty or
/// digits-only string (which would collide with numeric row ids downstream)
/// is re-derived from a hash of the original instead.
pub fn derive_agent_id(candidate: &str) -> AgentId {
    let mut normalized = String::with_capacity(candidate.len());
    let mut last_dash = true;
    for c in candidate.trim().chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            normalized.push(c);
            last_dash = false;
        } else if !last_dash {
            normalized.push('-');
            last_dash = true;
        }
    }
    while normalized.ends_with('-') {
        normalized.pop();
    }

    let digits_only = !normalized.is_empty() && normalized.bytes().all(|b| b.is_ascii_digit());
    if normalized.is_empty() || digits_only {
        let digest = Sha256::digest(candidate.as_bytes());
        let mut hex = String::with_capacity(8);
        for byte in digest.iter().take(4) {
            // 4 bytes -> 8 hex chars; plenty to avoid host collisions
            hex.push_str(&format!("{:02x}", byte));
        }
        return AgentId(format!("host-{}", hex));
    }

    AgentId(normalized)
}

/// Agent-reported lifecycle state.
///
/// `drain` is deliberately NOT a state: it is an orthogonal operator flag on
/// [`AgentRecord`] so an agent can finish its current job while drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// No live connection
    Offline,
    /// Connected, no current job
    Idle,
    /// Bringing the local pipeline up for an assigned job
    Starting,
    /// Actively streaming
    Running,
    /// Winding the pipeline down
    Stopping,
}

impl AgentState {
    pub fn is_offline(&self) -> bool {
        matches!(self, AgentState::Offline)
    }
}

crate::simple_display! {
    AgentState {
        Offline => "offline",
        Idle => "idle",
        Starting => "starting",
        Running => "running",
        Stopping => "stopping",
    }
}

/// Directory record for a known agent.
///
/// Created on first successful hello and never hard-deleted: disconnects
/// only flip `state` to Offline so metadata and history survive reconnect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: AgentId,
    /// Display name (host name as reported; may collide across re-provisions)
    pub name: String,
    pub state: AgentState,
    /// Operator-controlled: accept no new assignments, keep current job
    #[serde(default)]
    pub drain: bool,
    /// Concurrent job slots the agent declared (current fleet runs 1)
    pub slots: u32,
    /// Job presently assigned, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_job_id: Option<JobId>,
    /// Epoch ms of the last message received from this agent
    pub last_seen_ms: u64,
    /// Opaque key/value bag (e.g. remote-reboot credentials); stored and
    /// forwarded, never interpreted
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

impl AgentRecord {
    /// True when the scheduler may hand this agent a new job.
    pub fn is_assignable(&self) -> bool {
        self.state == AgentState::Idle && !self.drain && self.current_job_id.is_none()
    }
}

crate::builder! {
    pub struct AgentRecordBuilder => AgentRecord {
        into {
            id: AgentId = "cam-01",
            name: String = "cam-01",
        }
        set {
            state: AgentState = AgentState::Idle,
            drain: bool = false,
            slots: u32 = 1,
            last_seen_ms: u64 = 1_000_000,
            meta: BTreeMap<String, String> = BTreeMap::new(),
        }
        option {
            current_job_id: JobId = None,
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
