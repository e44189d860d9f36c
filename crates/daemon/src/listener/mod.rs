// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener tasks for socket I/O.
//!
//! Consoles connect over the unix socket; agents over TCP. Connection
//! tasks never mutate coordination state directly: they validate, then
//! emit events onto the WAL-backed bus for the engine loop (the single
//! writer) to process.

mod agent;
mod console;


use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use sc_core::Clock;
use sc_storage::MaterializedState;
use thiserror::Error;
use tokio::net::{TcpListener, UnixListener};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::broadcast::EventFanout;
use crate::engine::RuntimeSettings;
use crate::event_bus::EventBus;
use crate::registry::ConnectionRegistry;
use crate::remote::RemoteExec;

pub(crate) use agent::handle_agent_connection;
pub(crate) use console::handle_console_connection;

/// Shared daemon context for all connection handlers.
pub struct ListenCtx<C: Clock> {
    pub event_bus: EventBus,
    pub state: Arc<Mutex<MaterializedState>>,
    pub registry: Arc<ConnectionRegistry<C>>,
    pub fanout: EventFanout,
    pub remote: Arc<dyn RemoteExec>,
    pub settings: RuntimeSettings,
    pub clock: C,
    /// Shared secret agents must present at hello
    pub auth_token: String,
    pub state_dir: PathBuf,
    pub start_time: Instant,
    pub shutdown: CancellationToken,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] sc_wire::ProtocolError),

    #[error("WAL error")]
    Wal,
}

/// Listener task for accepting socket connections.
pub struct Listener<C: Clock> {
    console: UnixListener,
    agents: TcpListener,
    ctx: Arc<ListenCtx<C>>,
}

impl<C: Clock + 'static> Listener<C> {
    pub fn new(console: UnixListener, agents: TcpListener, ctx: Arc<ListenCtx<C>>) -> Self {
        Self { console, agents, ctx }
    }

    /// Run the accept loop until shutdown, spawning a task per connection.
    pub async fn run(self) {
        loop {
            tokio::select! {
                result = self.console.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            let ctx = Arc::clone(&self.ctx);
                            tokio::spawn(async move {
                                if let Err(e) = handle_console_connection(stream, &ctx).await {
                                    log_connection_error(e);
                                }
                            });
                        }
                        Err(e) => error!("console accept error: {}", e),
                    }
                }
                result = self.agents.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            debug!("agent connection from {}", addr);
                            let ctx = Arc::clone(&self.ctx);
                            tokio::spawn(async move {
                                if let Err(e) = handle_agent_connection(stream, &ctx).await {
                                    log_connection_error(e);
                                }
                            });
                        }
                        Err(e) => error!("agent accept error: {}", e),
                    }
                }
                _ = self.ctx.shutdown.cancelled() => {
                    debug!("listener shutting down");
                    return;
                }
            }
        }
    }
}

fn log_connection_error(e: ConnectionError) {
    match e {
        // Clean disconnects and malformed frames are business as usual
        ConnectionError::Protocol(sc_wire::ProtocolError::ConnectionClosed) => {}
        ConnectionError::Protocol(inner) => debug!("connection protocol error: {}", inner),
        ConnectionError::Wal => error!("WAL write failed while handling connection"),
    }
}
