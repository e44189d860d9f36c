// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job event application tests.

use super::*;
use sc_core::JobError;

#[test]
fn duplicate_create_keeps_first_record() {
    let mut state = MaterializedState::default();
    state.apply_event(&created("job-1", "k1"));
    state.apply_event(&Event::JobQueued { id: JobId::from_string("job-1"), at_ms: 2_000 });

    // Replay of the same create must not reset status
    state.apply_event(&created("job-1", "k1"));
    assert_eq!(state.jobs["job-1"].status, JobStatus::Pending);
    assert_eq!(state.jobs.len(), 1);
}

#[test]
fn idempotency_key_maps_to_first_job() {
    let mut state = MaterializedState::default();
    state.apply_event(&created("job-1", "shared-key"));

    let found = state.job_for_idempotency_key("shared-key").map(|j| j.id.to_string());
    assert_eq!(found.as_deref(), Some("job-1"));
    assert!(state.job_for_idempotency_key("other").is_none());
}

#[test]
fn reject_returns_job_to_pending_and_frees_agent() {
    let mut state = MaterializedState::default();
    state.apply_event(&connected("cam-01", "cam-01", 500));
    state.apply_event(&created("job-1", "k1"));
    state.apply_event(&Event::JobQueued { id: JobId::from_string("job-1"), at_ms: 2_000 });
    state.apply_event(&Event::JobAssigned {
        id: JobId::from_string("job-1"),
        agent_id: AgentId::new("cam-01"),
        at_ms: 3_000,
    });

    state.apply_event(&Event::JobRejected {
        id: JobId::from_string("job-1"),
        agent_id: AgentId::new("cam-01"),
        reason: Some("busy".into()),
        at_ms: 4_000,
    });

    assert_eq!(state.jobs["job-1"].status, JobStatus::Pending);
    assert!(state.jobs["job-1"].assigned_agent_id.is_none());
    assert!(state.agents["cam-01"].current_job_id.is_none());
}

#[test]
fn failure_records_error_once() {
    let mut state = MaterializedState::default();
    state.apply_event(&connected("cam-01", "cam-01", 500));
    run_job(&mut state, "job-1", "cam-01");

    state.apply_event(&Event::JobFailed {
        id: JobId::from_string("job-1"),
        error: JobError::new("encoder-exit", "ffmpeg exited 1"),
        at_ms: 7_000,
    });
    // Duplicate failure report for the same underlying crash
    state.apply_event(&Event::JobFailed {
        id: JobId::from_string("job-1"),
        error: JobError::new("agent-disconnected", "late duplicate"),
        at_ms: 8_000,
    });

    let job = &state.jobs["job-1"];
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_ref().map(|e| e.code.as_str()), Some("encoder-exit"));
    assert!(state.agents["cam-01"].current_job_id.is_none());
}

#[test]
fn dismiss_only_applies_to_terminal_jobs() {
    let mut state = MaterializedState::default();
    state.apply_event(&created("job-1", "k1"));
    state.apply_event(&Event::JobQueued { id: JobId::from_string("job-1"), at_ms: 2_000 });

    state.apply_event(&Event::JobDismissed { id: JobId::from_string("job-1"), at_ms: 3_000 });
    assert!(!state.jobs["job-1"].dismissed, "non-terminal job must not be dismissible");

    state.apply_event(&Event::JobCanceled {
        id: JobId::from_string("job-1"),
        reason: None,
        at_ms: 4_000,
    });
    state.apply_event(&Event::JobDismissed { id: JobId::from_string("job-1"), at_ms: 5_000 });
    assert!(state.jobs["job-1"].dismissed);
    assert_eq!(state.jobs["job-1"].status, JobStatus::Canceled);

    // Re-dismiss is a no-op
    state.apply_event(&Event::JobDismissed { id: JobId::from_string("job-1"), at_ms: 6_000 });
    assert!(state.jobs["job-1"].dismissed);
    assert_eq!(state.jobs["job-1"].status, JobStatus::Canceled);
}

#[test]
fn delete_removes_job_and_idempotency_mapping() {
    let mut state = MaterializedState::default();
    state.apply_event(&created("job-1", "k1"));
    state.apply_event(&Event::JobDeleted { id: JobId::from_string("job-1") });

    assert!(state.jobs.is_empty());
    assert!(state.job_for_idempotency_key("k1").is_none());
}

#[test]
fn restart_scheduled_requeues_and_clears_assignment() {
    let mut state = MaterializedState::default();
    state.apply_event(&connected("cam-01", "cam-01", 500));
    run_job(&mut state, "job-1", "cam-01");

    state.apply_event(&Event::JobRestartScheduled {
        id: JobId::from_string("job-1"),
        attempt: 1,
        backoff_ms: 2_000,
        at_ms: 7_000,
    });

    assert_eq!(state.jobs["job-1"].status, JobStatus::Pending);
    assert!(state.jobs["job-1"].assigned_agent_id.is_none());
    assert!(state.agents["cam-01"].current_job_id.is_none());
}

#[test]
fn metadata_event_merges_into_job() {
    let mut state = MaterializedState::default();
    state.apply_event(&created("job-1", "k1"));
    state.apply_event(&Event::JobMetadata {
        id: JobId::from_string("job-1"),
        patch: sc_core::MetadataPatch::at(9_000).title("live now"),
        from_agent: true,
    });
    assert_eq!(
        state.jobs["job-1"].metadata.title.as_ref().map(|s| s.value.as_str()),
        Some("live now")
    );
}
