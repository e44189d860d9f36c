// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Disconnect handling: restart policy, bounded attempts, backoff.

use super::*;
use sc_core::MAX_RESTART_ATTEMPTS;

#[tokio::test]
async fn never_policy_fails_job_on_disconnect() {
    let ctx = setup();
    ctx.connect_agent("cam-01").await;
    ctx.create_job("job-1", RestartPolicy::Never).await;
    ctx.run_assigned_job("job-1", "cam-01").await;

    ctx.agent_offline("cam-01").await;

    assert_eq!(ctx.job_status("job-1"), JobStatus::Failed);
    let state = ctx.state.lock();
    let job = &state.jobs["job-1"];
    assert_eq!(job.error.as_ref().map(|e| e.code.as_str()), Some("agent-disconnected"));
    assert!(job.assigned_agent_id.is_none());
    assert!(state.agents["cam-01"].current_job_id.is_none());
}

#[tokio::test]
async fn on_failure_schedules_bounded_restarts_then_fails() {
    let ctx = setup();
    let mut backoffs = Vec::new();

    for round in 1..=MAX_RESTART_ATTEMPTS {
        ctx.connect_agent("cam-01").await;
        if round == 1 {
            ctx.create_job("job-1", RestartPolicy::OnFailure).await;
        } else {
            // Backoff elapses, the returned agent picks the job up again
            ctx.fire_timer(TimerId::restart(&JobId::from_string("job-1"))).await;
        }
        assert_eq!(ctx.job_status("job-1"), JobStatus::Assigned, "round {}", round);
        ctx.run_assigned_job("job-1", "cam-01").await;

        ctx.agent_offline("cam-01").await;
        let state = ctx.state.lock();
        assert_eq!(state.jobs["job-1"].status, JobStatus::Pending, "round {}", round);
        drop(state);

        backoffs.push(round);
    }

    assert_eq!(backoffs.len(), MAX_RESTART_ATTEMPTS as usize);

    // Budget exhausted: the next disconnect cycle is terminal
    ctx.connect_agent("cam-01").await;
    ctx.fire_timer(TimerId::restart(&JobId::from_string("job-1"))).await;
    ctx.run_assigned_job("job-1", "cam-01").await;
    ctx.agent_offline("cam-01").await;

    assert_eq!(ctx.job_status("job-1"), JobStatus::Failed);
    let state = ctx.state.lock();
    assert_eq!(
        state.jobs["job-1"].error.as_ref().map(|e| e.code.as_str()),
        Some("restarts-exhausted")
    );
    assert!(state.agents["cam-01"].current_job_id.is_none());
}

#[tokio::test]
async fn held_job_is_not_rescheduled_before_backoff() {
    let ctx = setup();
    ctx.connect_agent("cam-01").await;
    ctx.create_job("job-1", RestartPolicy::OnFailure).await;
    ctx.run_assigned_job("job-1", "cam-01").await;
    ctx.agent_offline("cam-01").await;
    assert_eq!(ctx.job_status("job-1"), JobStatus::Pending);

    // A second agent shows up while the backoff is pending: the hold
    // keeps the decision deterministic until the timer fires
    ctx.connect_agent("cam-02").await;
    assert_eq!(ctx.job_status("job-1"), JobStatus::Pending);
    assert_eq!(ctx.job_agent("job-1"), None);

    ctx.fire_timer(TimerId::restart(&JobId::from_string("job-1"))).await;
    assert_eq!(ctx.job_status("job-1"), JobStatus::Assigned);
    assert_eq!(ctx.job_agent("job-1").as_deref(), Some("cam-02"));
}

#[tokio::test]
async fn duplicate_offline_signals_cause_one_restart_attempt() {
    let ctx = setup();
    ctx.connect_agent("cam-01").await;
    ctx.create_job("job-1", RestartPolicy::OnFailure).await;
    ctx.run_assigned_job("job-1", "cam-01").await;

    ctx.agent_offline("cam-01").await;
    // Second signal for the same crash: job already pulled back, no agent
    // association left, so the monitor ignores it
    ctx.agent_offline("cam-01").await;

    let attempts = ctx.runtime.restarts.lock().attempts(&JobId::from_string("job-1"));
    assert_eq!(attempts, 1);
}

#[tokio::test]
async fn restart_attempt_counter_survives_reassignment() {
    let ctx = setup();
    ctx.connect_agent("cam-01").await;
    ctx.create_job("job-1", RestartPolicy::OnFailure).await;
    ctx.run_assigned_job("job-1", "cam-01").await;
    ctx.agent_offline("cam-01").await;
    assert_eq!(ctx.runtime.restarts.lock().attempts(&JobId::from_string("job-1")), 1);

    // New agent, new crash: attempt number keeps increasing
    ctx.connect_agent("cam-02").await;
    ctx.fire_timer(TimerId::restart(&JobId::from_string("job-1"))).await;
    ctx.run_assigned_job("job-1", "cam-02").await;
    ctx.agent_offline("cam-02").await;
    assert_eq!(ctx.runtime.restarts.lock().attempts(&JobId::from_string("job-1")), 2);
}

#[tokio::test]
async fn clean_stop_clears_the_restart_budget() {
    let ctx = setup();
    ctx.connect_agent("cam-01").await;
    ctx.create_job("job-1", RestartPolicy::OnFailure).await;
    ctx.run_assigned_job("job-1", "cam-01").await;
    ctx.agent_offline("cam-01").await;

    ctx.connect_agent("cam-01").await;
    ctx.fire_timer(TimerId::restart(&JobId::from_string("job-1"))).await;
    ctx.run_assigned_job("job-1", "cam-01").await;
    ctx.drive(Event::JobStopped {
        id: JobId::from_string("job-1"),
        at_ms: ctx.clock.epoch_ms(),
    })
    .await;

    assert_eq!(ctx.runtime.restarts.lock().attempts(&JobId::from_string("job-1")), 0);
}
