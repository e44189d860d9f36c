// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent directory event handlers.

use sc_core::{AgentRecord, AgentState, Event};

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::AgentConnected { id, name, slots, drain, meta, at_ms, .. } => {
            match state.agents.get_mut(id.as_str()) {
                Some(agent) => {
                    // Reconnect: refresh declared capability, keep history.
                    // current_job_id is settled separately by reconciliation.
                    agent.name = name.clone();
                    agent.slots = *slots;
                    agent.drain = *drain;
                    agent.meta = meta.clone();
                    agent.last_seen_ms = *at_ms;
                    if agent.state == AgentState::Offline {
                        agent.state = AgentState::Idle;
                    }
                }
                None => {
                    state.agents.insert(
                        id.to_string(),
                        AgentRecord {
                            id: id.clone(),
                            name: name.clone(),
                            state: AgentState::Idle,
                            drain: *drain,
                            slots: *slots,
                            current_job_id: None,
                            last_seen_ms: *at_ms,
                            meta: meta.clone(),
                        },
                    );
                }
            }
        }

        Event::AgentSeen { id, at_ms } => {
            if let Some(agent) = state.agents.get_mut(id.as_str()) {
                agent.last_seen_ms = (*at_ms).max(agent.last_seen_ms);
            }
        }

        Event::AgentStateChanged { id, state: agent_state, at_ms } => {
            if let Some(agent) = state.agents.get_mut(id.as_str()) {
                agent.state = *agent_state;
                agent.last_seen_ms = (*at_ms).max(agent.last_seen_ms);
            }
        }

        Event::AgentOffline { id, .. } => {
            if let Some(agent) = state.agents.get_mut(id.as_str()) {
                agent.state = AgentState::Offline;
                agent.current_job_id = None;
            }
        }

        Event::AgentDrain { id, drain, .. } => {
            if let Some(agent) = state.agents.get_mut(id.as_str()) {
                agent.drain = *drain;
            }
        }

        _ => {}
    }
}
