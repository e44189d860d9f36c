// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent directory handlers: reconnect reconciliation and disconnects.

use crate::engine::link::AgentLink;
use crate::engine::monitor::{self, MonitorAction};
use crate::engine::runtime::Runtime;
use crate::engine::RuntimeError;
use sc_core::{AgentCommand, AgentId, Clock, Effect, Event, Job, JobId, TimerId};

impl<L, C> Runtime<L, C>
where
    L: AgentLink,
    C: Clock + 'static,
{
    /// Hello processed: reconcile any job the agent claims to be running,
    /// then see whether new capacity places a pending job.
    pub(crate) async fn handle_agent_connected(
        &self,
        agent_id: &AgentId,
        active_job: Option<JobId>,
    ) -> Result<Vec<Event>, RuntimeError> {
        let mut events = Vec::new();
        if let Some(job_id) = active_job {
            events.extend(self.reconcile_active_job(agent_id, &job_id).await?);
        }
        events.extend(self.scheduling_pass(None).await?);
        Ok(events)
    }

    /// Settle an agent's claimed mid-job state against the store (the
    /// store wins): a non-terminal job still owed to this agent is
    /// restored; anything else is an orphan the agent must tear down.
    async fn reconcile_active_job(
        &self,
        agent_id: &AgentId,
        job_id: &JobId,
    ) -> Result<Vec<Event>, RuntimeError> {
        let job = self.get_job(job_id.as_str());
        let restorable = job.as_ref().is_some_and(|job| {
            !job.is_terminal()
                && job
                    .assigned_agent_id
                    .as_ref()
                    .map_or(true, |assigned| assigned == agent_id)
        });

        if !restorable {
            tracing::info!(agent_id = %agent_id, job_id = %job_id, "orphaned job reported, instructing stop");
            self.executor
                .execute_all(vec![Effect::SendToAgent {
                    agent_id: agent_id.clone(),
                    command: AgentCommand::StopOrphan { job_id: job_id.clone() },
                }])
                .await?;
            return Ok(Vec::new());
        }

        tracing::info!(agent_id = %agent_id, job_id = %job_id, "restoring job association after reconnect");

        // The restart hold (if any) is moot: the original agent is back
        self.held.lock().remove(job_id.as_str());
        self.restarts.lock().clear(job_id);

        let now_ms = self.executor.clock().epoch_ms();
        // Re-walk the assignment edges; advance() ignores whichever of
        // these the store already took, so this is safe from any starting
        // status (Pending after a restart hold, or still Running when the
        // orchestrator never noticed the drop).
        let mut effects = vec![Effect::CancelTimer { id: TimerId::restart(job_id) }];
        for event in [
            Event::JobAssigned { id: job_id.clone(), agent_id: agent_id.clone(), at_ms: now_ms },
            Event::JobAccepted { id: job_id.clone(), agent_id: agent_id.clone(), at_ms: now_ms },
            Event::JobRunning { id: job_id.clone(), agent_id: agent_id.clone(), at_ms: now_ms },
        ] {
            effects.push(Effect::Emit { event });
        }
        Ok(self.executor.execute_all(effects).await?)
    }

    /// Agent went offline (heartbeat timeout or connection loss): apply
    /// the restart policy to whatever it was holding.
    pub(crate) async fn handle_agent_offline(
        &self,
        agent_id: &AgentId,
    ) -> Result<Vec<Event>, RuntimeError> {
        let now_ms = self.executor.clock().epoch_ms();
        let orphaned: Vec<Job> = self.lock_state(|state| {
            state
                .jobs
                .values()
                .filter(|job| {
                    !job.is_terminal()
                        && job.assigned_agent_id.as_ref() == Some(agent_id)
                })
                .cloned()
                .collect()
        });

        let mut effects = Vec::new();
        for job in orphaned {
            let action = {
                let mut tracker = self.restarts.lock();
                monitor::on_agent_lost(&job, &mut tracker, now_ms)
            };
            match action {
                MonitorAction::Requeue { attempt, backoff_ms } => {
                    effects.push(Effect::Emit {
                        event: Event::JobRestartScheduled {
                            id: job.id.clone(),
                            attempt,
                            backoff_ms,
                            at_ms: now_ms,
                        },
                    });
                }
                MonitorAction::Fail(error) => {
                    effects.push(Effect::Emit {
                        event: Event::JobFailed { id: job.id.clone(), error, at_ms: now_ms },
                    });
                }
                MonitorAction::None => {}
            }
        }
        Ok(self.executor.execute_all(effects).await?)
    }
}
