// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expiry deadlines: lazy checks and the expiry timer.

use super::*;

#[tokio::test]
async fn job_expiring_now_with_no_agents_is_canceled_immediately() {
    let ctx = setup();
    let now = ctx.clock.epoch_ms();
    ctx.create_job_expiring("job-1", RestartPolicy::Never, Some(now)).await;

    // Never assigned, straight to canceled
    assert_eq!(ctx.job_status("job-1"), JobStatus::Canceled);
    assert_eq!(ctx.job_agent("job-1"), None);
}

#[tokio::test]
async fn job_expiring_now_is_canceled_even_with_idle_agents() {
    let ctx = setup();
    ctx.connect_agent("cam-01").await;
    let now = ctx.clock.epoch_ms();
    ctx.create_job_expiring("job-1", RestartPolicy::Never, Some(now)).await;

    assert_eq!(ctx.job_status("job-1"), JobStatus::Canceled);
    assert_eq!(ctx.agent_current_job("cam-01"), None);
    settle().await;
    assert!(ctx.commands_to("cam-01", "assign-start").is_empty());
}

#[tokio::test]
async fn pending_job_is_canceled_when_the_expiry_timer_fires() {
    let ctx = setup();
    let deadline = ctx.clock.epoch_ms() + 60_000;
    ctx.create_job_expiring("job-1", RestartPolicy::Never, Some(deadline)).await;
    assert_eq!(ctx.job_status("job-1"), JobStatus::Pending);

    // Timer fires early (clock not yet at the deadline): nothing happens
    ctx.fire_timer(TimerId::expiry(&JobId::from_string("job-1"))).await;
    assert_eq!(ctx.job_status("job-1"), JobStatus::Pending);

    ctx.clock.advance_ms(60_000);
    ctx.fire_timer(TimerId::expiry(&JobId::from_string("job-1"))).await;
    assert_eq!(ctx.job_status("job-1"), JobStatus::Canceled);
}

#[tokio::test]
async fn accepted_job_outlives_its_deadline() {
    let ctx = setup();
    ctx.connect_agent("cam-01").await;
    let deadline = ctx.clock.epoch_ms() + 60_000;
    ctx.create_job_expiring("job-1", RestartPolicy::Never, Some(deadline)).await;
    ctx.run_assigned_job("job-1", "cam-01").await;

    // The deadline only guards the path to acceptance
    ctx.clock.advance_ms(120_000);
    ctx.fire_timer(TimerId::expiry(&JobId::from_string("job-1"))).await;
    assert_eq!(ctx.job_status("job-1"), JobStatus::Running);
}

#[tokio::test]
async fn expired_job_is_canceled_before_any_late_assignment() {
    let ctx = setup();
    let deadline = ctx.clock.epoch_ms() + 1_000;
    ctx.create_job_expiring("job-1", RestartPolicy::Never, Some(deadline)).await;
    assert_eq!(ctx.job_status("job-1"), JobStatus::Pending);

    // Agent arrives after the deadline: the scheduling pass cancels
    // instead of assigning
    ctx.clock.advance_ms(5_000);
    ctx.connect_agent("cam-01").await;

    assert_eq!(ctx.job_status("job-1"), JobStatus::Canceled);
    settle().await;
    assert!(ctx.commands_to("cam-01", "assign-start").is_empty());
}
