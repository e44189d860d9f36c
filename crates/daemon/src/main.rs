// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! scd: the stagecast orchestrator daemon.

use sc_daemon::lifecycle::{self, Config};
use sc_daemon::listener::Listener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("scd: {}", e);
            return 1;
        }
    };

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().unwrap_or(&config.state_dir),
        config
            .log_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "daemon.log".into()),
    );
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to build tokio runtime: {}", e);
            return 1;
        }
    };

    runtime.block_on(async move {
        let startup = match lifecycle::startup(config).await {
            Ok(startup) => startup,
            Err(e) => {
                error!("startup failed: {}", e);
                eprintln!("scd: startup failed: {}", e);
                return 1;
            }
        };

        let lifecycle::StartupResult {
            daemon,
            console_listener,
            agent_listener,
            event_reader,
            listen_ctx,
            shutdown,
        } = startup;

        // Listener runs alongside the engine loop; connection tasks only
        // ever emit events, the engine loop is the single writer
        let listener = Listener::new(console_listener, agent_listener, listen_ctx);
        let listener_task = tokio::spawn(listener.run());

        let signal_shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received");
                signal_shutdown.cancel();
            }
        });

        println!("READY");
        info!("scd ready");

        let result = lifecycle::run_engine(daemon, event_reader, shutdown).await;
        listener_task.abort();

        match result {
            Ok(daemon) => {
                // Remove the socket so the next start binds cleanly
                let _ = std::fs::remove_file(&daemon.config.socket_path);
                info!("scd stopped");
                0
            }
            Err(e) => {
                error!("engine loop failed: {}", e);
                1
            }
        }
    })
}
