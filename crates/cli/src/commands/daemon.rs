// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sc daemon`: daemon status and control.

use crate::client::Client;
use crate::output::{self, Mode};
use anyhow::Result;
use clap::Subcommand;
use sc_wire::Request;
use std::path::Path;

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Health check
    Ping,

    /// Uptime and counters
    Status,

    /// Ask the daemon to shut down gracefully
    Stop,
}

pub async fn run(command: DaemonCommand, socket: &Path, mode: Mode) -> Result<()> {
    let mut client = Client::connect(socket).await?;
    let response = match command {
        DaemonCommand::Ping => client.expect_ok(Request::Ping).await?,
        DaemonCommand::Status => client.expect_ok(Request::Status).await?,
        DaemonCommand::Stop => client.expect_ok(Request::Shutdown).await?,
    };
    output::print_ack(mode, &response)
}
