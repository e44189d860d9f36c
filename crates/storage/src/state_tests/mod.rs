// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state tests

mod agents;
mod jobs;

use super::*;
use sc_core::{AgentId, JobId, JobStatus, RestartPolicy, StreamConfig};

pub(crate) fn created(id: &str, key: &str) -> Event {
    Event::JobCreated {
        id: JobId::from_string(id),
        idempotency_key: key.to_string(),
        name: format!("{}-stream", key),
        stream: StreamConfig::default(),
        restart_policy: RestartPolicy::Never,
        expires_at_ms: None,
        created_at_ms: 1_000,
    }
}

pub(crate) fn connected(id: &str, name: &str, at_ms: u64) -> Event {
    Event::AgentConnected {
        id: AgentId::new(id),
        name: name.to_string(),
        slots: 1,
        drain: false,
        meta: Default::default(),
        active_job: None,
        at_ms,
    }
}

/// Drive a job from creation into Running on the given agent.
pub(crate) fn run_job(state: &mut MaterializedState, job: &str, agent: &str) {
    let id = JobId::from_string(job);
    let agent_id = AgentId::new(agent);
    state.apply_event(&created(job, job));
    state.apply_event(&Event::JobQueued { id: id.clone(), at_ms: 2_000 });
    state.apply_event(&Event::JobAssigned { id: id.clone(), agent_id: agent_id.clone(), at_ms: 3_000 });
    state.apply_event(&Event::JobAccepted { id: id.clone(), agent_id: agent_id.clone(), at_ms: 4_000 });
    state.apply_event(&Event::JobStarting { id: id.clone(), at_ms: 5_000 });
    state.apply_event(&Event::JobRunning { id, agent_id, at_ms: 6_000 });
}

#[test]
fn full_lifecycle_reaches_stopped() {
    let mut state = MaterializedState::default();
    state.apply_event(&connected("cam-01", "cam-01", 500));
    run_job(&mut state, "job-1", "cam-01");

    assert_eq!(state.jobs["job-1"].status, JobStatus::Running);
    assert_eq!(state.agents["cam-01"].current_job_id.as_ref().map(|j| j.as_str()), Some("job-1"));

    state.apply_event(&Event::JobStopping { id: JobId::from_string("job-1"), reason: None, at_ms: 7_000 });
    state.apply_event(&Event::JobStopped { id: JobId::from_string("job-1"), at_ms: 8_000 });

    assert_eq!(state.jobs["job-1"].status, JobStatus::Stopped);
    assert!(state.jobs["job-1"].assigned_agent_id.is_none());
    assert!(state.agents["cam-01"].current_job_id.is_none());
}

#[test]
fn apply_event_is_idempotent_for_replay() {
    let mut once = MaterializedState::default();
    let mut twice = MaterializedState::default();

    let events = vec![
        connected("cam-01", "cam-01", 500),
        created("job-1", "k1"),
        Event::JobQueued { id: JobId::from_string("job-1"), at_ms: 2_000 },
        Event::JobAssigned {
            id: JobId::from_string("job-1"),
            agent_id: AgentId::new("cam-01"),
            at_ms: 3_000,
        },
        Event::JobAccepted {
            id: JobId::from_string("job-1"),
            agent_id: AgentId::new("cam-01"),
            at_ms: 4_000,
        },
    ];

    for event in &events {
        once.apply_event(event);
        twice.apply_event(event);
        twice.apply_event(event);
    }

    assert_eq!(once.jobs["job-1"].status, twice.jobs["job-1"].status);
    assert_eq!(once.jobs["job-1"].assigned_agent_id, twice.jobs["job-1"].assigned_agent_id);
    assert_eq!(
        once.agents["cam-01"].current_job_id,
        twice.agents["cam-01"].current_job_id
    );
}

#[test]
fn get_job_resolves_unique_prefix() {
    let mut state = MaterializedState::default();
    state.apply_event(&created("job-abcdef", "k1"));
    state.apply_event(&created("job-xyzzyx", "k2"));

    assert!(state.get_job("job-abc").is_some());
    assert!(state.get_job("job-").is_none(), "ambiguous prefix must not resolve");
}
