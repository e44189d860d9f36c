// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer routing: restart backoff, job expiry, metadata flush.

use crate::engine::link::AgentLink;
use crate::engine::runtime::Runtime;
use crate::engine::RuntimeError;
use sc_core::{AgentCommand, Clock, Effect, Event, JobId, TimerId, TimerKind};

impl<L, C> Runtime<L, C>
where
    L: AgentLink,
    C: Clock + 'static,
{
    pub(crate) async fn handle_timer(&self, id: &TimerId) -> Result<Vec<Event>, RuntimeError> {
        match id.kind() {
            Some(TimerKind::Restart { job_id }) => {
                // Backoff elapsed: the job re-enters scheduling
                let job_id = job_id.to_string();
                self.held.lock().remove(&job_id);
                self.try_assign_one(&job_id, None).await
            }

            Some(TimerKind::Expiry { job_id }) => {
                let now_ms = self.executor.clock().epoch_ms();
                let expired = self
                    .get_job(job_id)
                    .map(|job| job.is_expired(now_ms))
                    .unwrap_or(false);
                if !expired {
                    return Ok(Vec::new());
                }
                let id = JobId::from_string(job_id);
                Ok(self
                    .executor
                    .execute_all(vec![Effect::Emit {
                        event: Event::JobCanceled {
                            id,
                            reason: Some("expired".to_string()),
                            at_ms: now_ms,
                        },
                    }])
                    .await?)
            }

            Some(TimerKind::MetadataFlush { job_id }) => {
                let Some(patch) = self.pending_meta.lock().remove(job_id) else {
                    return Ok(Vec::new());
                };
                let Some(job) = self.get_job(job_id) else {
                    return Ok(Vec::new());
                };
                let Some(agent_id) = job.assigned_agent_id else {
                    // Assignment moved while the patch was pending; the
                    // next assign-start ships the merged metadata anyway
                    return Ok(Vec::new());
                };
                self.executor
                    .execute_all(vec![Effect::SendToAgent {
                        agent_id,
                        command: AgentCommand::JobMetadata { job_id: job.id.clone(), patch },
                    }])
                    .await?;
                Ok(Vec::new())
            }

            None => {
                tracing::debug!(timer_id = %id, "unrecognized timer id, ignoring");
                Ok(Vec::new())
            }
        }
    }
}
