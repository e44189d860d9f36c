// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound link to agent connections.
//!
//! The executor talks to agents only through this seam, so the runtime can
//! be driven in tests without sockets.

use async_trait::async_trait;
use sc_core::{AgentId, Clock};
use sc_wire::DaemonMessage;
use std::sync::Arc;

use crate::registry::ConnectionRegistry;

/// Fire-and-forget delivery to an agent's current connection.
#[async_trait]
pub trait AgentLink: Clone + Send + Sync + 'static {
    /// Returns false when the agent had no live connection (the message is
    /// dropped; reconciliation at the next hello covers the gap).
    async fn send(&self, agent_id: &AgentId, message: DaemonMessage) -> bool;
}

/// Production link: routes through the connection registry.
#[derive(Clone)]
pub struct RegistryLink<C: Clock> {
    registry: Arc<ConnectionRegistry<C>>,
}

impl<C: Clock> RegistryLink<C> {
    pub fn new(registry: Arc<ConnectionRegistry<C>>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl<C: Clock + 'static> AgentLink for RegistryLink<C> {
    async fn send(&self, agent_id: &AgentId, message: DaemonMessage) -> bool {
        self.registry.send(agent_id, message)
    }
}
