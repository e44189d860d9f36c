// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sc_core::{AgentId, Job, JobStatus, MetadataPatch};

#[test]
fn job_summary_projects_metadata() {
    let mut job = Job::builder().status(JobStatus::Running).build();
    let mut patch = MetadataPatch::at(50).title("semifinal");
    patch.viewer_count = Some(240);
    job.metadata.apply(&patch);
    job.assigned_agent_id = Some(AgentId::new("cam-01"));

    let summary = JobSummary::from(&job);
    assert_eq!(summary.title.as_deref(), Some("semifinal"));
    assert_eq!(summary.viewer_count, Some(240));
    assert_eq!(summary.agent_id.as_deref(), Some("cam-01"));
    assert_eq!(summary.status, JobStatus::Running);
}

#[test]
fn job_detail_keeps_error_and_deadline() {
    let job = Job::builder()
        .status(JobStatus::Failed)
        .error(sc_core::JobError::new("agent-disconnected", "cam-01 went away"))
        .expires_at_ms(5_000u64)
        .build();
    let detail = JobDetail::from(&job);
    assert_eq!(detail.error.as_ref().map(|e| e.code.as_str()), Some("agent-disconnected"));
    assert_eq!(detail.expires_at_ms, Some(5_000));
}

#[test]
fn agent_summary_projects_record() {
    let agent = sc_core::AgentRecord::builder()
        .id("cam-01")
        .name("Cam 01")
        .current_job_id(sc_core::JobId::from_string("job-1"))
        .build();
    let summary = AgentSummary::from(&agent);
    assert_eq!(summary.id, "cam-01");
    assert_eq!(summary.current_job_id.as_deref(), Some("job-1"));
    assert!(!summary.drain);
}
