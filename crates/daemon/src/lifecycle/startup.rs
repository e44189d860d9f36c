// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fs2::FileExt;
use parking_lot::Mutex;
use sc_core::{MsgId, SystemClock};
use sc_storage::{load_snapshot, Checkpointer, MaterializedState, Wal};
use tokio::net::{TcpListener, UnixListener};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{Config, DaemonState, LifecycleError};
use crate::broadcast::EventFanout;
use crate::engine::{Executor, RegistryLink, Runtime};
use crate::event_bus::{EventBus, EventReader};
use crate::listener::ListenCtx;
use crate::registry::ConnectionRegistry;
use crate::remote::LoggingRemoteExec;

/// Result of daemon startup: state for the engine loop plus the bound
/// listeners to spawn as tasks.
pub struct StartupResult {
    pub daemon: DaemonState,
    pub console_listener: UnixListener,
    pub agent_listener: TcpListener,
    pub event_reader: EventReader,
    pub listen_ctx: Arc<ListenCtx<SystemClock>>,
    pub shutdown: CancellationToken,
}

/// Start the daemon
pub async fn startup(config: Config) -> Result<StartupResult, LifecycleError> {
    // 1. State directory first (socket, lock, wal all live under it)
    std::fs::create_dir_all(&config.state_dir)?;
    if let Some(parent) = config.wal_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // 2. Acquire the lock file before touching anything shared. Open
    // without truncating so a failed lock leaves the running daemon's PID
    // intact.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Auth token: config/env wins; otherwise generate once and persist
    // so agents can be provisioned from the file
    let auth_token = match &config.auth_token {
        Some(token) => token.clone(),
        None => match std::fs::read_to_string(&config.token_path) {
            Ok(existing) if !existing.trim().is_empty() => existing.trim().to_string(),
            _ => {
                let token = MsgId::new().suffix().to_string();
                std::fs::write(&config.token_path, &token)?;
                info!(path = %config.token_path.display(), "generated agent auth token");
                token
            }
        },
    };

    // 4. Recover state: snapshot, then WAL replay
    let (mut state, processed_seq) = match load_snapshot(&config.snapshot_path)? {
        Some(snapshot) => {
            info!(
                seq = snapshot.seq,
                jobs = snapshot.state.jobs.len(),
                agents = snapshot.state.agents.len(),
                "loaded snapshot"
            );
            (snapshot.state, snapshot.seq)
        }
        None => {
            info!("no snapshot found, starting with empty state");
            (MaterializedState::default(), 0)
        }
    };

    let wal = Wal::open(&config.wal_path, processed_seq)?;
    let events_to_replay = wal.entries_after(processed_seq)?;
    let replay_count = events_to_replay.len();
    for entry in &events_to_replay {
        state.apply_event(&entry.event);
    }
    if replay_count > 0 {
        info!(replay_count, after_seq = processed_seq, "replayed WAL events");
    }
    info!(jobs = state.jobs.len(), agents = state.agents.len(), "recovered state");

    let non_terminal =
        state.jobs.values().filter(|job| !job.is_terminal()).count();
    if non_terminal > 0 {
        warn!(
            jobs = non_terminal,
            "non-terminal jobs recovered; agents have one heartbeat timeout to reconnect \
             before the restart policy applies"
        );
    }

    // 5. Wire the core together
    let (event_bus, event_reader) = EventBus::new(wal);
    let state = Arc::new(Mutex::new(state));
    let clock = SystemClock;
    let registry = ConnectionRegistry::new(
        clock.clone(),
        Duration::from_millis(config.settings.heartbeat_timeout_ms),
    );
    let fanout = EventFanout::new();
    let executor = Executor::new(
        RegistryLink::new(Arc::clone(&registry)),
        Arc::clone(&state),
        fanout.clone(),
        clock.clone(),
        event_bus.clone(),
    );
    let runtime = Arc::new(Runtime::new(executor, config.settings.clone()));

    // 6. Bind sockets last, after everything that can fail has
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let console_listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;
    let agent_listener = TcpListener::bind(&config.agent_bind)
        .await
        .map_err(|e| LifecycleError::BindFailed(config.agent_bind.clone().into(), e))?;
    info!(
        console = %config.socket_path.display(),
        agents = %config.agent_bind,
        "listening"
    );

    let shutdown = CancellationToken::new();
    let listen_ctx = Arc::new(ListenCtx {
        event_bus: event_bus.clone(),
        state: Arc::clone(&state),
        registry: Arc::clone(&registry),
        fanout: fanout.clone(),
        remote: Arc::new(LoggingRemoteExec),
        settings: config.settings.clone(),
        clock: clock.clone(),
        auth_token,
        state_dir: config.state_dir.clone(),
        start_time: Instant::now(),
        shutdown: shutdown.clone(),
    });

    let checkpointer = Checkpointer::new(config.snapshot_path.clone(), processed_seq);
    let daemon = DaemonState {
        config,
        lock_file,
        state,
        runtime,
        event_bus,
        registry,
        fanout,
        start_time: Instant::now(),
        checkpointer,
        clock,
    };

    Ok(StartupResult {
        daemon,
        console_listener,
        agent_listener,
        event_reader,
        listen_ctx,
        shutdown,
    })
}
