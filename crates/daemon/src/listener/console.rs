// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Console connection handling: operator requests and the event feed.

use std::sync::Arc;

use sc_core::{Clock, Event, JobControl, JobId};
use sc_wire::{
    decode, encode, read_message, write_message, AgentSummary, JobDetail, JobSummary, Request,
    Response,
};
use tokio::io::AsyncWrite;
use tokio::net::UnixStream;
use tracing::debug;

use super::{ConnectionError, ListenCtx};
use crate::env::PROTOCOL_VERSION;

pub(crate) async fn handle_console_connection<C: Clock + 'static>(
    stream: UnixStream,
    ctx: &Arc<ListenCtx<C>>,
) -> Result<(), ConnectionError> {
    let (mut reader, mut writer) = stream.into_split();

    loop {
        let frame = match read_message(&mut reader).await {
            Ok(frame) => frame,
            Err(sc_wire::ProtocolError::ConnectionClosed) => return Ok(()),
            Err(e) => {
                debug!(error = %e, "console read error");
                return Ok(());
            }
        };
        let request: Request = match decode(&frame) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "malformed console request dropped");
                continue;
            }
        };

        let subscribe = matches!(request, Request::Subscribe);
        let response =
            match tokio::time::timeout(crate::env::ipc_timeout(), handle_request(ctx, request))
                .await
            {
                Ok(response) => response,
                Err(_) => Response::Error { message: "request timed out".to_string() },
            };
        write_message(&mut writer, &encode(&response)?).await?;

        if subscribe {
            return run_event_feed(&mut writer, ctx).await;
        }
    }
}

/// Stream events to a subscribed console until it goes away.
async fn run_event_feed<C: Clock, W: AsyncWrite + Unpin>(
    writer: &mut W,
    ctx: &ListenCtx<C>,
) -> Result<(), ConnectionError> {
    let mut events = ctx.fanout.subscribe();
    loop {
        match events.recv().await {
            Ok(event) => {
                let response = Response::Event { event };
                if write_message(writer, &encode(&response)?).await.is_err() {
                    return Ok(());
                }
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                debug!(missed, "console subscriber lagged, events dropped");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => return Ok(()),
        }
    }
}

/// Validate and apply one operator request.
///
/// State errors never mutate anything: the legality check and the event
/// emission happen under one state lock, so a command validated against
/// stale state cannot slip through.
pub(crate) async fn handle_request<C: Clock>(ctx: &ListenCtx<C>, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { .. } => Response::Hello { version: PROTOCOL_VERSION.to_string() },

        Request::CreateJob { idempotency_key, name, stream, restart_policy, expires_at_ms } => {
            let now_ms = ctx.clock.epoch_ms();
            let mut state = ctx.state.lock();
            // Idempotency: a previously-seen key returns the existing job
            if let Some(job) = state.job_for_idempotency_key(&idempotency_key) {
                return Response::JobCreated { id: job.id.to_string(), created: false };
            }
            let id = JobId::new();
            let event = Event::JobCreated {
                id: id.clone(),
                idempotency_key,
                name,
                stream,
                restart_policy,
                expires_at_ms,
                created_at_ms: now_ms,
            };
            if ctx.event_bus.send(event.clone()).is_err() {
                return Response::Error { message: "failed to persist job".to_string() };
            }
            state.apply_event(&event);
            Response::JobCreated { id: id.to_string(), created: true }
        }

        Request::StopJob { id, reason } => {
            let now_ms = ctx.clock.epoch_ms();
            let state = ctx.state.lock();
            let Some(job) = state.get_job(&id) else {
                return Response::Error { message: format!("job not found: {}", id) };
            };
            if job.is_terminal() {
                return Response::Error {
                    message: format!("job {} is already {}", job.id, job.status),
                };
            }
            let event = if job.status.can_transition(sc_core::JobStatus::Stopping) {
                // An agent holds the pipeline; ask it to wind down
                Event::JobStopping { id: job.id.clone(), reason, at_ms: now_ms }
            } else if job.status == sc_core::JobStatus::Stopping {
                return Response::Error { message: format!("job {} is already stopping", job.id) };
            } else {
                // Nothing accepted it yet; cancel directly
                Event::JobCanceled { id: job.id.clone(), reason, at_ms: now_ms }
            };
            emit_locked(ctx, state, event)
        }

        Request::PauseJob { id } => control(ctx, &id, JobControl::Pause),
        Request::UnpauseJob { id } => control(ctx, &id, JobControl::Unpause),
        Request::MuteJob { id } => control(ctx, &id, JobControl::Mute),
        Request::UnmuteJob { id } => control(ctx, &id, JobControl::Unmute),

        Request::DismissJob { id } => {
            let now_ms = ctx.clock.epoch_ms();
            let state = ctx.state.lock();
            let Some(job) = state.get_job(&id) else {
                return Response::Error { message: format!("job not found: {}", id) };
            };
            if !job.is_terminal() {
                return Response::Error {
                    message: format!("cannot dismiss {} job {}", job.status, job.id),
                };
            }
            let event = Event::JobDismissed { id: job.id.clone(), at_ms: now_ms };
            emit_locked(ctx, state, event)
        }

        Request::DeleteJob { id } => {
            let state = ctx.state.lock();
            let Some(job) = state.get_job(&id) else {
                return Response::Error { message: format!("job not found: {}", id) };
            };
            if !job.is_terminal() {
                return Response::Error {
                    message: format!("cannot delete {} job {}; stop it first", job.status, job.id),
                };
            }
            let event = Event::JobDeleted { id: job.id.clone() };
            emit_locked(ctx, state, event)
        }

        Request::UpdateJobMetadata { id, mut patch } => {
            let now_ms = ctx.clock.epoch_ms();
            let state = ctx.state.lock();
            let Some(job) = state.get_job(&id) else {
                return Response::Error { message: format!("job not found: {}", id) };
            };
            if job.is_terminal() {
                return Response::Error {
                    message: format!("cannot update metadata of {} job {}", job.status, job.id),
                };
            }
            if patch.ts_ms == 0 {
                patch.ts_ms = now_ms;
            }
            let event = Event::JobMetadata { id: job.id.clone(), patch, from_agent: false };
            emit_locked(ctx, state, event)
        }

        Request::ListJobs { include_dismissed } => {
            let state = ctx.state.lock();
            let mut jobs: Vec<JobSummary> = state
                .jobs
                .values()
                .filter(|job| include_dismissed || !job.dismissed)
                .map(JobSummary::from)
                .collect();
            jobs.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms).then(a.id.cmp(&b.id)));
            Response::Jobs { jobs }
        }

        Request::GetJob { id } => {
            let state = ctx.state.lock();
            Response::Job { job: state.get_job(&id).map(|job| Box::new(JobDetail::from(job))) }
        }

        Request::ListAgents => {
            let state = ctx.state.lock();
            let agents: Vec<AgentSummary> =
                state.agents_for_listing().into_iter().map(AgentSummary::from).collect();
            Response::Agents { agents }
        }

        Request::SetAgentDrain { id, drain } => {
            let now_ms = ctx.clock.epoch_ms();
            let state = ctx.state.lock();
            if !state.agents.contains_key(id.as_str()) {
                return Response::Error { message: format!("agent not found: {}", id) };
            }
            let event = Event::AgentDrain { id: sc_core::AgentId::new(id), drain, at_ms: now_ms };
            emit_locked(ctx, state, event)
        }

        Request::RebootAgent { id, reason } => {
            let agent = {
                let state = ctx.state.lock();
                state.agents.get(id.as_str()).cloned()
            };
            let Some(agent) = agent else {
                return Response::Error { message: format!("agent not found: {}", id) };
            };
            // Forwarded out of band; job state is deliberately untouched
            match ctx.remote.reboot(&agent, &reason).await {
                Ok(()) => Response::Ok,
                Err(e) => Response::Error { message: e.to_string() },
            }
        }

        Request::Subscribe => Response::Subscribed,

        Request::Status => {
            let state = ctx.state.lock();
            Response::Status {
                uptime_secs: ctx.start_time.elapsed().as_secs(),
                jobs_active: state.active_jobs(),
                agents_online: ctx.registry.connected_count(),
            }
        }

        Request::Shutdown => {
            if ctx.event_bus.send(Event::Shutdown).is_err() {
                return Response::Error { message: "failed to persist shutdown".to_string() };
            }
            ctx.shutdown.cancel();
            Response::ShuttingDown
        }
    }
}

/// Pause/unpause/mute/unmute: legal only while Running; forwarded to the
/// agent, whose ack updates the paused/muted metadata.
fn control<C: Clock>(ctx: &ListenCtx<C>, id: &str, control: JobControl) -> Response {
    let (job_id, agent_id) = {
        let state = ctx.state.lock();
        let Some(job) = state.get_job(id) else {
            return Response::Error { message: format!("job not found: {}", id) };
        };
        if !job.status.accepts_controls() {
            return Response::Error {
                message: format!("cannot {} {} job {}", control, job.status, job.id),
            };
        }
        let Some(agent_id) = job.assigned_agent_id.clone() else {
            return Response::Error { message: format!("job {} has no agent", job.id) };
        };
        (job.id.clone(), agent_id)
    };
    ctx.registry.send(
        &agent_id,
        sc_core::AgentCommand::JobControl { job_id, control }.into(),
    );
    Response::Ok
}

/// Emit while still holding the state lock, then apply, then reply Ok.
fn emit_locked<C: Clock>(
    ctx: &ListenCtx<C>,
    mut state: parking_lot::MutexGuard<'_, sc_storage::MaterializedState>,
    event: Event,
) -> Response {
    if ctx.event_bus.send(event.clone()).is_err() {
        return Response::Error { message: "failed to persist mutation".to_string() };
    }
    state.apply_event(&event);
    Response::Ok
}
