// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assignment flow: creation through the scheduler to the agent.

use super::*;

#[tokio::test]
async fn created_job_is_assigned_to_idle_agent() {
    let ctx = setup();
    ctx.connect_agent("cam-01").await;
    ctx.create_job("job-1", RestartPolicy::Never).await;

    assert_eq!(ctx.job_status("job-1"), JobStatus::Assigned);
    assert_eq!(ctx.job_agent("job-1").as_deref(), Some("cam-01"));
    assert_eq!(ctx.agent_current_job("cam-01").as_deref(), Some("job-1"));

    // assign-start went out to the matched agent
    settle().await;
    let commands = ctx.commands_to("cam-01", "assign-start");
    assert_eq!(commands.len(), 1);
    match &commands[0] {
        AgentCommand::AssignStart { job_id, idempotency_key, .. } => {
            assert_eq!(job_id.as_str(), "job-1");
            assert_eq!(idempotency_key, "key-job-1");
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[tokio::test]
async fn job_without_agents_stays_pending() {
    let ctx = setup();
    ctx.create_job("job-1", RestartPolicy::Never).await;
    assert_eq!(ctx.job_status("job-1"), JobStatus::Pending);
    assert_eq!(ctx.job_agent("job-1"), None);
}

#[tokio::test]
async fn second_job_waits_until_first_finishes() {
    let ctx = setup();
    ctx.connect_agent("cam-01").await;
    ctx.create_job("job-1", RestartPolicy::Never).await;
    ctx.create_job("job-2", RestartPolicy::Never).await;

    // One idle agent: first assigned, second queued
    assert_eq!(ctx.job_status("job-1"), JobStatus::Assigned);
    assert_eq!(ctx.job_status("job-2"), JobStatus::Pending);

    ctx.run_assigned_job("job-1", "cam-01").await;
    ctx.drive(Event::JobStopped {
        id: JobId::from_string("job-1"),
        at_ms: ctx.clock.epoch_ms(),
    })
    .await;

    // Terminal transition freed capacity; no manual intervention needed
    assert_eq!(ctx.job_status("job-1"), JobStatus::Stopped);
    assert_eq!(ctx.job_status("job-2"), JobStatus::Assigned);
    assert_eq!(ctx.agent_current_job("cam-01").as_deref(), Some("job-2"));
}

#[tokio::test]
async fn at_most_one_nonterminal_job_per_agent() {
    let ctx = setup();
    ctx.connect_agent("cam-01").await;
    for n in 1..=4 {
        ctx.create_job(&format!("job-{}", n), RestartPolicy::Never).await;
    }

    let state = ctx.state.lock();
    let assigned_to_cam: Vec<_> = state
        .jobs
        .values()
        .filter(|job| {
            !job.is_terminal()
                && job.assigned_agent_id.as_ref().is_some_and(|a| a.as_str() == "cam-01")
        })
        .collect();
    assert_eq!(assigned_to_cam.len(), 1);
}

#[tokio::test]
async fn rejecting_agent_is_skipped_for_the_pass() {
    let ctx = setup();
    ctx.connect_agent("cam-01").await;
    ctx.create_job("job-1", RestartPolicy::Never).await;
    assert_eq!(ctx.job_status("job-1"), JobStatus::Assigned);

    ctx.drive(Event::JobRejected {
        id: JobId::from_string("job-1"),
        agent_id: AgentId::new("cam-01"),
        reason: Some("busy".to_string()),
        at_ms: ctx.clock.epoch_ms(),
    })
    .await;

    // Back to pending; the rejecting agent was excluded from the retry pass
    assert_eq!(ctx.job_status("job-1"), JobStatus::Pending);
    assert_eq!(ctx.job_agent("job-1"), None);
    assert_eq!(ctx.agent_current_job("cam-01"), None);
}

#[tokio::test]
async fn reject_then_second_agent_picks_up() {
    let ctx = setup();
    ctx.connect_agent("cam-01").await;
    ctx.connect_agent("cam-02").await;
    ctx.create_job("job-1", RestartPolicy::Never).await;
    // Lexicographic tie-break: cam-01 got it
    assert_eq!(ctx.job_agent("job-1").as_deref(), Some("cam-01"));

    ctx.drive(Event::JobRejected {
        id: JobId::from_string("job-1"),
        agent_id: AgentId::new("cam-01"),
        reason: None,
        at_ms: ctx.clock.epoch_ms(),
    })
    .await;

    // The same pass moved on to the other agent
    assert_eq!(ctx.job_status("job-1"), JobStatus::Assigned);
    assert_eq!(ctx.job_agent("job-1").as_deref(), Some("cam-02"));
}

#[tokio::test]
async fn drained_agent_gets_nothing_until_undrained() {
    let ctx = setup();
    ctx.connect_agent("cam-01").await;
    ctx.drive(Event::AgentDrain {
        id: AgentId::new("cam-01"),
        drain: true,
        at_ms: ctx.clock.epoch_ms(),
    })
    .await;

    ctx.create_job("job-1", RestartPolicy::Never).await;
    assert_eq!(ctx.job_status("job-1"), JobStatus::Pending);

    // Drain off triggers a pass that places the waiting job
    ctx.drive(Event::AgentDrain {
        id: AgentId::new("cam-01"),
        drain: false,
        at_ms: ctx.clock.epoch_ms(),
    })
    .await;
    assert_eq!(ctx.job_status("job-1"), JobStatus::Assigned);
}

#[tokio::test]
async fn reconnect_with_stopped_job_gets_stop_orphan() {
    let ctx = setup();
    ctx.connect_agent("cam-01").await;
    ctx.create_job("job-1", RestartPolicy::Never).await;
    ctx.run_assigned_job("job-1", "cam-01").await;
    ctx.drive(Event::JobStopped {
        id: JobId::from_string("job-1"),
        at_ms: ctx.clock.epoch_ms(),
    })
    .await;

    // Agent reconnects still claiming the job the store has as stopped
    ctx.connect_agent_with("cam-01", Some("job-1")).await;
    settle().await;

    let stops = ctx.commands_to("cam-01", "stop-orphan");
    assert_eq!(stops.len(), 1);
    // The store was not reverted
    assert_eq!(ctx.job_status("job-1"), JobStatus::Stopped);
}

#[tokio::test]
async fn reconnect_with_live_job_restores_association() {
    let ctx = setup();
    ctx.connect_agent("cam-01").await;
    ctx.create_job("job-1", RestartPolicy::OnFailure).await;
    ctx.run_assigned_job("job-1", "cam-01").await;

    // Drop and reconnect mid-job: one restart got scheduled, then the
    // same agent came back claiming the job
    ctx.agent_offline("cam-01").await;
    assert_eq!(ctx.job_status("job-1"), JobStatus::Pending);

    ctx.connect_agent_with("cam-01", Some("job-1")).await;

    assert_eq!(ctx.job_status("job-1"), JobStatus::Running);
    assert_eq!(ctx.job_agent("job-1").as_deref(), Some("cam-01"));
    assert_eq!(ctx.agent_current_job("cam-01").as_deref(), Some("job-1"));
    settle().await;
    assert!(ctx.commands_to("cam-01", "stop-orphan").is_empty());
}
