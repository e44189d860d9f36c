// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event handling for the runtime

mod agent;
mod job;
mod timer;

use super::Runtime;
use crate::engine::link::AgentLink;
use crate::engine::RuntimeError;
use sc_core::{Clock, Event};

impl<L, C> Runtime<L, C>
where
    L: AgentLink,
    C: Clock + 'static,
{
    /// Handle an incoming event and return any produced events.
    ///
    /// Called by the engine loop after the event has been applied to the
    /// materialized state; result events go back through the WAL-backed
    /// bus, so each is durable before its own handler runs.
    pub async fn handle_event(&self, event: Event) -> Result<Vec<Event>, RuntimeError> {
        let mut result_events = Vec::new();

        match &event {
            Event::JobCreated { id, expires_at_ms, .. } => {
                result_events.extend(self.handle_job_created(id, *expires_at_ms).await?);
            }

            Event::JobQueued { id, .. } => {
                result_events.extend(self.try_assign_one(id.as_str(), None).await?);
            }

            Event::JobAssigned { id, agent_id, .. } => {
                self.handle_job_assigned(id, agent_id).await?;
            }

            Event::JobAccepted { id, .. } => {
                self.handle_job_accepted(id).await?;
            }

            Event::JobRejected { id, agent_id, reason, .. } => {
                result_events.extend(self.handle_job_rejected(id, agent_id, reason.as_deref()).await?);
            }

            Event::JobStopping { id, reason, .. } => {
                self.handle_job_stopping(id, reason.clone()).await?;
            }

            Event::JobStopped { id, .. }
            | Event::JobFailed { id, .. }
            | Event::JobCanceled { id, .. } => {
                result_events.extend(self.handle_job_terminal(id).await?);
            }

            Event::JobDeleted { id } => {
                self.forget_job(id.as_str()).await?;
            }

            Event::JobMetadata { id, patch, from_agent } => {
                if !*from_agent {
                    self.handle_operator_metadata(id, patch.clone()).await?;
                }
            }

            Event::JobRestartScheduled { id, attempt, backoff_ms, .. } => {
                self.handle_restart_scheduled(id, *attempt, *backoff_ms).await?;
            }

            Event::TimerFired { id } => {
                result_events.extend(self.handle_timer(id).await?);
            }

            Event::AgentConnected { id, active_job, .. } => {
                result_events.extend(self.handle_agent_connected(id, active_job.clone()).await?);
            }

            Event::AgentOffline { id, .. } => {
                result_events.extend(self.handle_agent_offline(id).await?);
            }

            Event::AgentStateChanged { state, .. } => {
                // An agent settling back to idle frees capacity
                if *state == sc_core::AgentState::Idle {
                    result_events.extend(self.scheduling_pass(None).await?);
                }
            }

            Event::AgentDrain { drain, .. } => {
                // Drain turning off frees capacity
                if !*drain {
                    result_events.extend(self.scheduling_pass(None).await?);
                }
            }

            // No-op: liveness bookkeeping applied by the state layer
            Event::AgentSeen { .. }
            | Event::JobStarting { .. }
            | Event::JobRunning { .. }
            | Event::JobDismissed { .. }
            | Event::Shutdown => {}
        }

        Ok(result_events)
    }
}
