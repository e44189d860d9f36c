// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle event handlers.

use sc_core::{AgentId, Event, Job, JobConfig, JobStatus};

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::JobCreated {
            id,
            idempotency_key,
            name,
            stream,
            restart_policy,
            expires_at_ms,
            created_at_ms,
        } => {
            // Idempotency: a replayed create must not reset a live job
            if !state.jobs.contains_key(id.as_str()) {
                let mut builder = JobConfig::builder(id.clone(), idempotency_key.clone())
                    .name(name.clone())
                    .stream(stream.clone())
                    .restart_policy(*restart_policy);
                if let Some(deadline) = expires_at_ms {
                    builder = builder.expires_at_ms(*deadline);
                }
                let job = Job::new_with_epoch_ms(builder.build(), *created_at_ms);
                state.jobs.insert(id.to_string(), job);
            }
            state.idempotency.entry(idempotency_key.clone()).or_insert_with(|| id.clone());
        }

        Event::JobQueued { id, at_ms } => {
            advance(state, id.as_str(), JobStatus::Pending, *at_ms);
        }

        Event::JobAssigned { id, agent_id, at_ms } => {
            if let Some(job) = state.jobs.get_mut(id.as_str()) {
                if job.advance(JobStatus::Assigned, *at_ms) {
                    job.assigned_agent_id = Some(agent_id.clone());
                }
            }
            set_agent_current(state, agent_id, Some(id.clone()));
        }

        Event::JobAccepted { id, at_ms, .. } => {
            advance(state, id.as_str(), JobStatus::Accepted, *at_ms);
        }

        Event::JobRejected { id, agent_id, at_ms, .. } => {
            if let Some(job) = state.jobs.get_mut(id.as_str()) {
                if job.advance(JobStatus::Pending, *at_ms) {
                    job.assigned_agent_id = None;
                }
            }
            clear_agent_current(state, agent_id, id.as_str());
        }

        Event::JobStarting { id, at_ms } => {
            advance(state, id.as_str(), JobStatus::Starting, *at_ms);
        }

        Event::JobRunning { id, agent_id, at_ms } => {
            advance(state, id.as_str(), JobStatus::Running, *at_ms);
            set_agent_current(state, agent_id, Some(id.clone()));
        }

        Event::JobStopping { id, at_ms, .. } => {
            advance(state, id.as_str(), JobStatus::Stopping, *at_ms);
        }

        Event::JobStopped { id, at_ms } => {
            finish(state, id.as_str(), JobStatus::Stopped, *at_ms);
        }

        Event::JobFailed { id, error, at_ms } => {
            finish(state, id.as_str(), JobStatus::Failed, *at_ms);
            if let Some(job) = state.jobs.get_mut(id.as_str()) {
                if job.status == JobStatus::Failed && job.error.is_none() {
                    job.error = Some(error.clone());
                }
            }
        }

        Event::JobCanceled { id, at_ms, .. } => {
            finish(state, id.as_str(), JobStatus::Canceled, *at_ms);
        }

        Event::JobDismissed { id, .. } => {
            if let Some(job) = state.jobs.get_mut(id.as_str()) {
                // Visibility flag only; legal only on terminal outcomes
                if job.is_terminal() {
                    job.dismissed = true;
                }
            }
        }

        Event::JobDeleted { id } => {
            if let Some(job) = state.jobs.remove(id.as_str()) {
                state.idempotency.remove(&job.idempotency_key);
            }
        }

        Event::JobMetadata { id, patch, .. } => {
            if let Some(job) = state.jobs.get_mut(id.as_str()) {
                job.metadata.apply(patch);
            }
        }

        Event::JobRestartScheduled { id, at_ms, .. } => {
            // The agent is gone; pull the job back to the queue. The runtime
            // holds it out of scheduling until the backoff timer fires.
            let agent_id = state.jobs.get(id.as_str()).and_then(|j| j.assigned_agent_id.clone());
            if let Some(job) = state.jobs.get_mut(id.as_str()) {
                if job.advance(JobStatus::Pending, *at_ms) {
                    job.assigned_agent_id = None;
                }
            }
            if let Some(agent_id) = agent_id {
                clear_agent_current(state, &agent_id, id.as_str());
            }
        }

        _ => {}
    }
}

fn advance(state: &mut MaterializedState, id: &str, to: JobStatus, at_ms: u64) {
    if let Some(job) = state.jobs.get_mut(id) {
        job.advance(to, at_ms);
    }
}

/// Terminal transition: advance and release the agent slot.
fn finish(state: &mut MaterializedState, id: &str, to: JobStatus, at_ms: u64) {
    let agent_id = state.jobs.get(id).and_then(|j| j.assigned_agent_id.clone());
    if let Some(job) = state.jobs.get_mut(id) {
        job.advance(to, at_ms);
    }
    if let Some(ref agent_id) = agent_id {
        clear_agent_current(state, agent_id, id);
    }
}

fn set_agent_current(state: &mut MaterializedState, agent_id: &AgentId, job_id: Option<sc_core::JobId>) {
    if let Some(agent) = state.agents.get_mut(agent_id.as_str()) {
        agent.current_job_id = job_id;
    }
}

/// Clear the agent's current job only if it still points at this job
/// (a replayed stale event must not clobber a newer assignment).
fn clear_agent_current(state: &mut MaterializedState, agent_id: &AgentId, job_id: &str) {
    if let Some(agent) = state.agents.get_mut(agent_id.as_str()) {
        if agent.current_job_id.as_ref().is_some_and(|current| current.as_str() == job_id) {
            agent.current_job_id = None;
        }
    }
}
