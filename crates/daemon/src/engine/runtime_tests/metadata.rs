// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metadata debounce: pending delta + single scheduled flush.

use super::*;
use sc_core::MetadataPatch;

async fn running_job(ctx: &TestContext) {
    ctx.connect_agent("cam-01").await;
    ctx.create_job("job-1", RestartPolicy::Never).await;
    ctx.run_assigned_job("job-1", "cam-01").await;
}

fn title_patch(ctx: &TestContext, title: &str) -> Event {
    Event::JobMetadata {
        id: JobId::from_string("job-1"),
        patch: MetadataPatch::at(ctx.clock.epoch_ms()).title(title),
        from_agent: false,
    }
}

#[tokio::test]
async fn rapid_edits_flush_as_one_merged_message() {
    let ctx = setup();
    running_job(&ctx).await;

    // Operator types a title: one event per keystroke burst
    ctx.drive(title_patch(&ctx, "ope")).await;
    ctx.clock.advance_ms(50);
    ctx.drive(title_patch(&ctx, "opening")).await;
    ctx.clock.advance_ms(50);
    ctx.drive(title_patch(&ctx, "opening night")).await;

    // Nothing forwarded yet
    settle().await;
    assert!(ctx.commands_to("cam-01", "job-metadata").is_empty());

    ctx.fire_timer(TimerId::metadata_flush(&JobId::from_string("job-1"))).await;
    settle().await;

    let flushed = ctx.commands_to("cam-01", "job-metadata");
    assert_eq!(flushed.len(), 1, "burst must coalesce into one flush");
    match &flushed[0] {
        AgentCommand::JobMetadata { patch, .. } => {
            assert_eq!(patch.title.as_deref(), Some("opening night"));
        }
        other => panic!("unexpected command {:?}", other),
    }

    // The store merged every edit as it arrived
    let state = ctx.state.lock();
    assert_eq!(
        state.jobs["job-1"].metadata.title.as_ref().map(|s| s.value.as_str()),
        Some("opening night")
    );
}

#[tokio::test]
async fn agent_originated_metadata_is_not_echoed_back() {
    let ctx = setup();
    running_job(&ctx).await;

    let mut patch = MetadataPatch::at(ctx.clock.epoch_ms());
    patch.viewer_count = Some(57);
    ctx.drive(Event::JobMetadata {
        id: JobId::from_string("job-1"),
        patch,
        from_agent: true,
    })
    .await;

    ctx.fire_timer(TimerId::metadata_flush(&JobId::from_string("job-1"))).await;
    settle().await;
    assert!(ctx.commands_to("cam-01", "job-metadata").is_empty());

    // Still merged into the store
    let state = ctx.state.lock();
    assert_eq!(state.jobs["job-1"].metadata.viewer_count.as_ref().map(|s| s.value), Some(57));
}

#[tokio::test]
async fn flush_after_terminal_is_dropped() {
    let ctx = setup();
    running_job(&ctx).await;

    ctx.drive(title_patch(&ctx, "final")).await;
    ctx.drive(Event::JobStopped {
        id: JobId::from_string("job-1"),
        at_ms: ctx.clock.epoch_ms(),
    })
    .await;

    ctx.fire_timer(TimerId::metadata_flush(&JobId::from_string("job-1"))).await;
    settle().await;
    assert!(ctx.commands_to("cam-01", "job-metadata").is_empty());
}

#[tokio::test]
async fn unassigned_job_keeps_metadata_local() {
    let ctx = setup();
    ctx.create_job("job-1", RestartPolicy::Never).await;

    ctx.drive(title_patch(&ctx, "early title")).await;
    ctx.fire_timer(TimerId::metadata_flush(&JobId::from_string("job-1"))).await;
    settle().await;

    let state = ctx.state.lock();
    assert_eq!(
        state.jobs["job-1"].metadata.title.as_ref().map(|s| s.value.as_str()),
        Some("early title")
    );
}
