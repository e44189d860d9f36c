// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle handlers.

use crate::engine::link::AgentLink;
use crate::engine::runtime::Runtime;
use crate::engine::RuntimeError;
use sc_core::{
    AgentCommand, AgentId, Clock, Effect, Event, JobId, MetadataPatch, TimerId,
};
use std::time::Duration;

impl<L, C> Runtime<L, C>
where
    L: AgentLink,
    C: Clock + 'static,
{
    /// A validated job entered the store: arm its expiry deadline and move
    /// it to the queue.
    pub(crate) async fn handle_job_created(
        &self,
        id: &JobId,
        expires_at_ms: Option<u64>,
    ) -> Result<Vec<Event>, RuntimeError> {
        let now_ms = self.executor.clock().epoch_ms();
        let mut effects = Vec::new();
        if let Some(deadline) = expires_at_ms {
            // A deadline already in the past still goes through the timer
            // path, which funnels into the same canceled transition
            let delay = deadline.saturating_sub(now_ms);
            effects.push(Effect::SetTimer {
                id: TimerId::expiry(id),
                duration: Duration::from_millis(delay),
            });
        }
        effects.push(Effect::Emit { event: Event::JobQueued { id: id.clone(), at_ms: now_ms } });
        Ok(self.executor.execute_all(effects).await?)
    }

    /// Scheduler matched: send assign-start to the chosen agent.
    ///
    /// Runs after `job:assigned` is durable, so a crash between the match
    /// and the send leaves a consistent store (the agent simply never
    /// hears about it and the assignment is reconciled at reconnect).
    pub(crate) async fn handle_job_assigned(
        &self,
        id: &JobId,
        agent_id: &AgentId,
    ) -> Result<(), RuntimeError> {
        let job = self.require_job(id.as_str())?;
        // Reconnect reconciliation re-walks the assignment edges with the
        // job already past Assigned; the agent is mid-job and must not be
        // offered a second start
        if job.status != sc_core::JobStatus::Assigned
            || job.assigned_agent_id.as_ref() != Some(agent_id)
        {
            return Ok(());
        }
        let metadata = job.metadata.to_patch();
        let command = AgentCommand::AssignStart {
            job_id: job.id.clone(),
            idempotency_key: job.idempotency_key.clone(),
            config: job.stream.clone(),
            expires_at_ms: job.expires_at_ms,
            metadata: if metadata.is_empty() { None } else { Some(metadata) },
        };
        self.executor
            .execute_all(vec![Effect::SendToAgent { agent_id: agent_id.clone(), command }])
            .await?;
        Ok(())
    }

    /// Acceptance closes the expiry window.
    pub(crate) async fn handle_job_accepted(&self, id: &JobId) -> Result<(), RuntimeError> {
        self.executor
            .execute_all(vec![Effect::CancelTimer { id: TimerId::expiry(id) }])
            .await?;
        Ok(())
    }

    /// Agent turned the assignment down: back to the queue, try the next
    /// agent now but skip the one that just said no for this pass.
    pub(crate) async fn handle_job_rejected(
        &self,
        id: &JobId,
        agent_id: &AgentId,
        reason: Option<&str>,
    ) -> Result<Vec<Event>, RuntimeError> {
        tracing::info!(
            job_id = %id,
            agent_id = %agent_id,
            reason = reason.unwrap_or("unspecified"),
            "assignment rejected"
        );
        self.try_assign_one(id.as_str(), Some(agent_id)).await
    }

    /// Operator stop was recorded: forward to the agent holding the job.
    pub(crate) async fn handle_job_stopping(
        &self,
        id: &JobId,
        reason: Option<String>,
    ) -> Result<(), RuntimeError> {
        let job = self.require_job(id.as_str())?;
        let Some(agent_id) = job.assigned_agent_id else {
            // Assignment vanished between request and processing; the
            // offline path owns this job now
            return Ok(());
        };
        self.executor
            .execute_all(vec![Effect::SendToAgent {
                agent_id,
                command: AgentCommand::JobStop { job_id: id.clone(), reason },
            }])
            .await?;
        Ok(())
    }

    /// Terminal transition: drop ephemeral tracking and re-run the
    /// scheduler: the agent that held this job is capacity again.
    pub(crate) async fn handle_job_terminal(
        &self,
        id: &JobId,
    ) -> Result<Vec<Event>, RuntimeError> {
        self.forget_job(id.as_str()).await?;
        self.scheduling_pass(None).await
    }

    /// Operator metadata edit: coalesce into the pending delta and arm a
    /// single flush timer (per-keystroke updates must not reach the agent).
    pub(crate) async fn handle_operator_metadata(
        &self,
        id: &JobId,
        patch: MetadataPatch,
    ) -> Result<(), RuntimeError> {
        let job = self.require_job(id.as_str())?;
        if job.is_terminal() || job.assigned_agent_id.is_none() {
            return Ok(());
        }

        let first = {
            let mut pending = self.pending_meta.lock();
            match pending.get_mut(id.as_str()) {
                Some(existing) => {
                    existing.absorb(patch);
                    false
                }
                None => {
                    pending.insert(id.to_string(), patch);
                    true
                }
            }
        };
        if first {
            self.executor
                .execute_all(vec![Effect::SetTimer {
                    id: TimerId::metadata_flush(id),
                    duration: Duration::from_millis(self.settings.metadata_debounce_ms),
                }])
                .await?;
        }
        Ok(())
    }

    /// Restart decision was recorded: park the job and arm the backoff.
    pub(crate) async fn handle_restart_scheduled(
        &self,
        id: &JobId,
        attempt: u32,
        backoff_ms: u64,
    ) -> Result<(), RuntimeError> {
        tracing::warn!(job_id = %id, attempt, backoff_ms, "restart scheduled");
        self.held.lock().insert(id.to_string());
        self.executor
            .execute_all(vec![Effect::SetTimer {
                id: TimerId::restart(id),
                duration: Duration::from_millis(backoff_ms),
            }])
            .await?;
        Ok(())
    }
}
