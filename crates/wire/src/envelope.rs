// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message envelope shared by both directions of the agent protocol.

use sc_core::{AgentId, MsgId};
use serde::{Deserialize, Serialize};

/// Envelope wrapping a typed message body.
///
/// `correlation_id` links a response to the request that caused it (e.g. an
/// assign-ack to its assign-start); the protocol is asynchronous
/// request/response, never a blocking RPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub msg_id: MsgId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<MsgId>,
    pub ts_ms: u64,
    /// Origin agent; absent on orchestrator-originated messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Envelope<T> {
    /// Wrap a body in a fresh envelope.
    pub fn new(body: T, ts_ms: u64) -> Self {
        Self { msg_id: MsgId::new(), correlation_id: None, ts_ms, agent_id: None, body }
    }

    pub fn from_agent(body: T, agent_id: AgentId, ts_ms: u64) -> Self {
        Self { msg_id: MsgId::new(), correlation_id: None, ts_ms, agent_id: Some(agent_id), body }
    }

    /// Link this envelope to the message it answers.
    pub fn correlated_to(mut self, request: MsgId) -> Self {
        self.correlation_id = Some(request);
        self
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
