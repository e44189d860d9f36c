// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sc: operator CLI for the stagecast orchestrator.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sc", about = "Coordinate the stagecast streaming fleet", version)]
struct Cli {
    /// Path to the daemon socket (default: the daemon's state dir)
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    /// Print raw JSON responses instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage stream jobs
    #[command(subcommand)]
    Job(commands::job::JobCommand),

    /// Manage streaming agents
    #[command(subcommand)]
    Agent(commands::agent::AgentCommand),

    /// Daemon status and control
    #[command(subcommand)]
    Daemon(commands::daemon::DaemonCommand),

    /// Follow the live event feed
    Events,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let socket = match cli.socket {
        Some(path) => path,
        None => client::default_socket_path()?,
    };
    let mode = output::Mode { json: cli.json };

    match cli.command {
        Command::Job(command) => commands::job::run(command, &socket, mode).await,
        Command::Agent(command) => commands::agent::run(command, &socket, mode).await,
        Command::Daemon(command) => commands::daemon::run(command, &socket, mode).await,
        Command::Events => commands::events::run(&socket, mode).await,
    }
}
