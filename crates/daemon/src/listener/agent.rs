// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent connection lifecycle: hello handshake, frame loop, disconnect.

use std::sync::Arc;

use sc_core::{derive_agent_id, AgentId, AgentState, Clock, Event, JobControl, MetadataPatch};
use sc_wire::{
    decode, encode, read_message, write_message, AgentHello, AgentMessage, DaemonMessage, Envelope,
};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{ConnectionError, ListenCtx};
use crate::registry::ConnectionRegistry;

pub(crate) async fn handle_agent_connection<C: Clock + 'static>(
    stream: TcpStream,
    ctx: &Arc<ListenCtx<C>>,
) -> Result<(), ConnectionError> {
    let (mut reader, writer) = stream.into_split();

    // First frame must be a hello; anything else is a protocol error and
    // the connection is dropped silently.
    let first = read_message(&mut reader).await?;
    let envelope: Envelope<AgentMessage> = match decode(&first) {
        Ok(env) => env,
        Err(e) => {
            debug!(error = %e, "malformed first frame, dropping connection");
            return Ok(());
        }
    };
    let AgentMessage::Hello(hello) = envelope.body else {
        debug!("first frame was not hello, dropping connection");
        return Ok(());
    };

    // Auth happens before the directory ever hears about the connection
    if hello.auth_token != ctx.auth_token {
        warn!(host = %hello.host, "agent hello rejected: bad token");
        let mut writer = writer;
        let reject = Envelope::new(
            DaemonMessage::HelloReject { reason: "invalid auth token".to_string() },
            ctx.clock.epoch_ms(),
        );
        let _ = write_message(&mut writer, &encode(&reject)?).await;
        return Ok(());
    }

    // Claimed id from the envelope, falling back to host identity; both
    // are normalized (a digits-only id is re-derived from a hash)
    let claimed = envelope
        .agent_id
        .as_ref()
        .map(|id| id.as_str())
        .unwrap_or(hello.host.as_str());
    let agent_id = derive_agent_id(claimed);

    let (outbound_tx, outbound_rx) = ConnectionRegistry::<C>::outbound_channel();
    let generation = ctx.registry.register(agent_id.clone(), outbound_tx);
    info!(agent_id = %agent_id, generation, name = %hello.name, "agent connected");

    spawn_writer(writer, outbound_rx, ctx.clock.clone());

    // Handshake parameters, then the durable connected fact
    ctx.registry.send(
        &agent_id,
        DaemonMessage::HelloOk(sc_wire::HelloOk {
            heartbeat_interval_ms: ctx.settings.heartbeat_interval_ms,
            heartbeat_timeout_ms: ctx.settings.heartbeat_timeout_ms,
            stop_grace_ms: ctx.settings.stop_grace_ms,
            kill_after_ms: ctx.settings.kill_after_ms,
        }),
    );
    emit(
        ctx,
        Event::AgentConnected {
            id: agent_id.clone(),
            name: hello.name.clone(),
            slots: hello.slots,
            drain: hello.drain,
            meta: hello.meta.clone(),
            active_job: hello.active_job.as_ref().map(|aj| aj.job_id.clone()),
            at_ms: ctx.clock.epoch_ms(),
        },
    )?;

    let result = read_loop(&mut reader, ctx, &agent_id, generation).await;

    // Only the current generation's teardown declares the agent offline; a
    // superseded connection dying must not take the new one's state down.
    if ctx.registry.disconnect(&agent_id, generation) {
        info!(agent_id = %agent_id, generation, "agent disconnected");
        emit(ctx, Event::AgentOffline { id: agent_id.clone(), at_ms: ctx.clock.epoch_ms() })?;
    }

    result
}

async fn read_loop<C: Clock + 'static, R: AsyncRead + Unpin>(
    reader: &mut R,
    ctx: &Arc<ListenCtx<C>>,
    agent_id: &AgentId,
    generation: u64,
) -> Result<(), ConnectionError> {
    loop {
        let frame = match read_message(reader).await {
            Ok(frame) => frame,
            Err(sc_wire::ProtocolError::ConnectionClosed) => return Ok(()),
            Err(e) => {
                debug!(agent_id = %agent_id, error = %e, "read error, closing connection");
                return Ok(());
            }
        };

        // An event arriving on a superseded connection must be ignored,
        // not just logged: stop reading entirely.
        if !ctx.registry.is_current(agent_id, generation) {
            debug!(agent_id = %agent_id, generation, "connection superseded, discarding frame");
            return Ok(());
        }

        let envelope: Envelope<AgentMessage> = match decode(&frame) {
            Ok(env) => env,
            Err(e) => {
                // Protocol errors are dropped at the transport boundary
                debug!(agent_id = %agent_id, error = %e, "malformed frame dropped");
                continue;
            }
        };

        ctx.registry.touch(agent_id, generation);
        for event in map_agent_message(ctx, agent_id, envelope.body) {
            emit(ctx, event)?;
        }
    }
}

/// Translate one agent message into events, validating against current
/// state. Isolation per id: nothing here can touch another agent's or
/// job's records, however hostile the payload.
fn map_agent_message<C: Clock>(
    ctx: &ListenCtx<C>,
    agent_id: &AgentId,
    message: AgentMessage,
) -> Vec<Event> {
    let now_ms = ctx.clock.epoch_ms();
    match message {
        AgentMessage::Hello(AgentHello { .. }) => {
            // Repeat hello on a live connection carries nothing new
            debug!(agent_id = %agent_id, "duplicate hello ignored");
            vec![]
        }

        AgentMessage::Heartbeat { .. } => {
            vec![Event::AgentSeen { id: agent_id.clone(), at_ms: now_ms }]
        }

        AgentMessage::AssignAck { job_id, accepted, reason } => {
            let state = ctx.state.lock();
            let current = state.jobs.get(job_id.as_str());
            let still_ours = current
                .is_some_and(|job| job.assigned_agent_id.as_ref() == Some(agent_id));
            if !still_ours {
                // Stale ack: the job was canceled, reassigned, or never
                // existed. An acceptance would leave the agent streaming
                // into the void, so tell it to tear the pipeline down.
                debug!(agent_id = %agent_id, job_id = %job_id, "stale assign-ack");
                if accepted {
                    drop(state);
                    ctx.registry.send(
                        agent_id,
                        DaemonMessage::Command(sc_core::AgentCommand::StopOrphan {
                            job_id: job_id.clone(),
                        }),
                    );
                }
                return vec![];
            }
            // Borrow again now that the job is known to be ours
            let Some(job) = state.jobs.get(job_id.as_str()) else {
                return vec![];
            };
            if !accepted {
                return vec![Event::JobRejected {
                    id: job_id,
                    agent_id: agent_id.clone(),
                    reason,
                    at_ms: now_ms,
                }];
            }
            if job.is_expired(now_ms) {
                // Acceptance after the hard deadline is itself rejected
                info!(job_id = %job_id, "acceptance after expiry, canceling");
                drop(state);
                ctx.registry.send(
                    agent_id,
                    DaemonMessage::Command(sc_core::AgentCommand::StopOrphan {
                        job_id: job_id.clone(),
                    }),
                );
                return vec![Event::JobCanceled {
                    id: job_id,
                    reason: Some("expired".to_string()),
                    at_ms: now_ms,
                }];
            }
            vec![Event::JobAccepted { id: job_id, agent_id: agent_id.clone(), at_ms: now_ms }]
        }

        AgentMessage::JobUpdate { job_id, status, metadata } => {
            let state = ctx.state.lock();
            let Some(job) = state.jobs.get(job_id.as_str()) else {
                return vec![];
            };
            if job.assigned_agent_id.as_ref() != Some(agent_id) {
                return vec![];
            }
            drop(state);

            let mut events = Vec::new();
            match status {
                Some(sc_core::JobStatus::Starting) => {
                    events.push(Event::JobStarting { id: job_id.clone(), at_ms: now_ms });
                    events.push(Event::AgentStateChanged {
                        id: agent_id.clone(),
                        state: AgentState::Starting,
                        at_ms: now_ms,
                    });
                }
                Some(sc_core::JobStatus::Running) => {
                    events.push(Event::JobRunning {
                        id: job_id.clone(),
                        agent_id: agent_id.clone(),
                        at_ms: now_ms,
                    });
                    events.push(Event::AgentStateChanged {
                        id: agent_id.clone(),
                        state: AgentState::Running,
                        at_ms: now_ms,
                    });
                }
                Some(sc_core::JobStatus::Stopping) => {
                    events.push(Event::JobStopping { id: job_id.clone(), reason: None, at_ms: now_ms });
                    events.push(Event::AgentStateChanged {
                        id: agent_id.clone(),
                        state: AgentState::Stopping,
                        at_ms: now_ms,
                    });
                }
                Some(other) => {
                    debug!(job_id = %job_id, status = %other, "unexpected status in job-update ignored");
                }
                None => {}
            }
            if let Some(patch) = metadata {
                events.push(Event::JobMetadata { id: job_id, patch, from_agent: true });
            }
            events
        }

        AgentMessage::JobStopped { job_id, status, error } => {
            let state = ctx.state.lock();
            let Some(job) = state.jobs.get(job_id.as_str()) else {
                return vec![];
            };
            // Duplicate terminal reports (or reports for a job already
            // rescheduled elsewhere) must not cause a second transition
            if job.is_terminal() || job.assigned_agent_id.as_ref() != Some(agent_id) {
                return vec![];
            }
            drop(state);

            let terminal = match status {
                sc_core::JobStatus::Failed => Event::JobFailed {
                    id: job_id,
                    error: error.unwrap_or_else(|| {
                        sc_core::JobError::new("agent-reported", "agent reported failure")
                    }),
                    at_ms: now_ms,
                },
                sc_core::JobStatus::Canceled => {
                    Event::JobCanceled { id: job_id, reason: None, at_ms: now_ms }
                }
                _ => Event::JobStopped { id: job_id, at_ms: now_ms },
            };
            vec![
                terminal,
                Event::AgentStateChanged {
                    id: agent_id.clone(),
                    state: AgentState::Idle,
                    at_ms: now_ms,
                },
            ]
        }

        AgentMessage::ControlAck { job_id, control, applied } => {
            if !applied {
                debug!(job_id = %job_id, control = %control, "control not applied by agent");
                return vec![];
            }
            let mut patch = MetadataPatch::at(now_ms);
            match control {
                JobControl::Pause => patch.paused = Some(true),
                JobControl::Unpause => patch.paused = Some(false),
                JobControl::Mute => patch.muted = Some(true),
                JobControl::Unmute => patch.muted = Some(false),
            }
            vec![Event::JobMetadata { id: job_id, patch, from_agent: true }]
        }
    }
}

fn spawn_writer<C: Clock + 'static, W: AsyncWrite + Unpin + Send + 'static>(
    mut writer: W,
    mut outbound: mpsc::Receiver<DaemonMessage>,
    clock: C,
) {
    tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let envelope = Envelope::new(message, clock.epoch_ms());
            let bytes = match encode(&envelope) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, "failed to encode outbound message");
                    continue;
                }
            };
            if write_message(&mut writer, &bytes).await.is_err() {
                break;
            }
        }
        let _ = writer.shutdown().await;
    });
}

fn emit<C: Clock>(ctx: &ListenCtx<C>, event: Event) -> Result<(), ConnectionError> {
    // Apply immediately (under the same lock discipline as the engine) so
    // the next message on this connection validates against fresh state;
    // apply_event is idempotent when the event returns through the bus.
    ctx.event_bus.send(event.clone()).map_err(|_| ConnectionError::Wal)?;
    ctx.state.lock().apply_event(&event);
    Ok(())
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
