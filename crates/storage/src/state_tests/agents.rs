// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent directory event application tests.

use super::*;
use sc_core::AgentState;

#[test]
fn connect_creates_record_idle() {
    let mut state = MaterializedState::default();
    state.apply_event(&connected("cam-01", "cam-01", 500));

    let agent = &state.agents["cam-01"];
    assert_eq!(agent.state, AgentState::Idle);
    assert_eq!(agent.last_seen_ms, 500);
    assert!(agent.current_job_id.is_none());
}

#[test]
fn offline_marks_but_never_deletes() {
    let mut state = MaterializedState::default();
    let mut connect = connected("cam-01", "cam-01", 500);
    if let Event::AgentConnected { ref mut meta, .. } = connect {
        meta.insert("ipmi_user".into(), "admin".into());
    }
    state.apply_event(&connect);
    state.apply_event(&Event::AgentOffline { id: AgentId::new("cam-01"), at_ms: 9_000 });

    let agent = &state.agents["cam-01"];
    assert_eq!(agent.state, AgentState::Offline);
    // Metadata survives the disconnect
    assert_eq!(agent.meta.get("ipmi_user").map(String::as_str), Some("admin"));
}

#[test]
fn reconnect_refreshes_capability_and_state() {
    let mut state = MaterializedState::default();
    state.apply_event(&connected("cam-01", "cam-01", 500));
    state.apply_event(&Event::AgentOffline { id: AgentId::new("cam-01"), at_ms: 1_000 });

    let mut reconnect = connected("cam-01", "cam-01-renamed", 2_000);
    if let Event::AgentConnected { ref mut slots, .. } = reconnect {
        *slots = 2;
    }
    state.apply_event(&reconnect);

    let agent = &state.agents["cam-01"];
    assert_eq!(agent.state, AgentState::Idle);
    assert_eq!(agent.slots, 2);
    assert_eq!(agent.name, "cam-01-renamed");
    assert_eq!(agent.last_seen_ms, 2_000);
    assert_eq!(state.agents.len(), 1, "reconnect must not duplicate the record");
}

#[test]
fn seen_only_moves_last_seen_forward() {
    let mut state = MaterializedState::default();
    state.apply_event(&connected("cam-01", "cam-01", 500));
    state.apply_event(&Event::AgentSeen { id: AgentId::new("cam-01"), at_ms: 700 });
    assert_eq!(state.agents["cam-01"].last_seen_ms, 700);

    // Out-of-order heartbeat must not rewind liveness
    state.apply_event(&Event::AgentSeen { id: AgentId::new("cam-01"), at_ms: 600 });
    assert_eq!(state.agents["cam-01"].last_seen_ms, 700);
}

#[test]
fn drain_flag_toggles() {
    let mut state = MaterializedState::default();
    state.apply_event(&connected("cam-01", "cam-01", 500));
    state.apply_event(&Event::AgentDrain { id: AgentId::new("cam-01"), drain: true, at_ms: 600 });
    assert!(state.agents["cam-01"].drain);
    state.apply_event(&Event::AgentDrain { id: AgentId::new("cam-01"), drain: false, at_ms: 700 });
    assert!(!state.agents["cam-01"].drain);
}

#[test]
fn listing_dedups_same_name_preferring_online() {
    let mut state = MaterializedState::default();
    // Re-provisioned host: two records share the display name
    state.apply_event(&connected("cam-01-old", "studio-cam", 500));
    state.apply_event(&connected("cam-01-new", "studio-cam", 1_500));
    state.apply_event(&Event::AgentOffline { id: AgentId::new("cam-01-old"), at_ms: 2_000 });

    let listing = state.agents_for_listing();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].id.as_str(), "cam-01-new");

    // Storage still has both
    assert_eq!(state.agents.len(), 2);
}

#[test]
fn listing_dedups_all_offline_preferring_recent() {
    let mut state = MaterializedState::default();
    state.apply_event(&connected("cam-01-old", "studio-cam", 500));
    state.apply_event(&connected("cam-01-new", "studio-cam", 1_500));
    state.apply_event(&Event::AgentOffline { id: AgentId::new("cam-01-old"), at_ms: 2_000 });
    state.apply_event(&Event::AgentOffline { id: AgentId::new("cam-01-new"), at_ms: 2_100 });

    let listing = state.agents_for_listing();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].id.as_str(), "cam-01-new", "more recently seen record wins");
}

#[test]
fn distinct_names_all_listed() {
    let mut state = MaterializedState::default();
    state.apply_event(&connected("cam-01", "cam-01", 500));
    state.apply_event(&connected("cam-02", "cam-02", 600));
    assert_eq!(state.agents_for_listing().len(), 2);
}
