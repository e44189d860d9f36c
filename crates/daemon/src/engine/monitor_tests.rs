// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sc_core::{AgentId, Job, JobStatus, MAX_RESTART_ATTEMPTS};

fn running_job(policy: RestartPolicy) -> Job {
    Job::builder()
        .status(JobStatus::Running)
        .restart_policy(policy)
        .assigned_agent_id(AgentId::new("cam-01"))
        .build()
}

#[test]
fn never_policy_fails_immediately() {
    let job = running_job(RestartPolicy::Never);
    let mut tracker = RestartTracker::new();

    match on_agent_lost(&job, &mut tracker, 1_000) {
        MonitorAction::Fail(error) => assert_eq!(error.code, "agent-disconnected"),
        other => panic!("expected Fail, got {:?}", other),
    }
    assert_eq!(tracker.attempts(&job.id), 0, "never-policy must not burn attempts");
}

#[test]
fn on_failure_requeues_with_growing_backoff() {
    let job = running_job(RestartPolicy::OnFailure);
    let mut tracker = RestartTracker::new();

    let mut last_backoff = 0;
    for expected_attempt in 1..=MAX_RESTART_ATTEMPTS {
        match on_agent_lost(&job, &mut tracker, 1_000) {
            MonitorAction::Requeue { attempt, backoff_ms } => {
                assert_eq!(attempt, expected_attempt);
                assert!(backoff_ms >= last_backoff, "backoff must be non-decreasing");
                last_backoff = backoff_ms;
            }
            other => panic!("expected Requeue, got {:?}", other),
        }
    }

    // Budget exhausted: the fourth disconnect is terminal
    match on_agent_lost(&job, &mut tracker, 1_000) {
        MonitorAction::Fail(error) => assert_eq!(error.code, "restarts-exhausted"),
        other => panic!("expected Fail, got {:?}", other),
    }
}

#[test]
fn terminal_job_is_ignored() {
    let mut job = running_job(RestartPolicy::OnFailure);
    job.status = JobStatus::Failed;
    job.assigned_agent_id = Some(AgentId::new("cam-01"));
    let mut tracker = RestartTracker::new();
    assert_eq!(on_agent_lost(&job, &mut tracker, 1_000), MonitorAction::None);
}

#[test]
fn unassigned_job_is_ignored() {
    let job = Job::builder().status(JobStatus::Pending).build();
    let mut tracker = RestartTracker::new();
    assert_eq!(on_agent_lost(&job, &mut tracker, 1_000), MonitorAction::None);
}
