// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sc agent`: fleet administration commands.

use crate::client::Client;
use crate::output::{self, Mode};
use anyhow::Result;
use clap::Subcommand;
use sc_wire::{Request, Response};
use std::path::Path;

#[derive(Subcommand)]
pub enum AgentCommand {
    /// List agents (one row per display name; offline duplicates hidden)
    List,

    /// Stop assigning new jobs to an agent; its current job keeps running
    Drain { id: String },

    /// Resume assignments to a drained agent
    Undrain { id: String },

    /// Reboot an agent host via its remote-admin credentials
    Reboot {
        id: String,
        #[arg(long, default_value = "operator requested")]
        reason: String,
    },
}

pub async fn run(command: AgentCommand, socket: &Path, mode: Mode) -> Result<()> {
    let mut client = Client::connect(socket).await?;
    match command {
        AgentCommand::List => {
            let response = client.expect_ok(Request::ListAgents).await?;
            match response {
                Response::Agents { agents } => output::print_agents(mode, &agents),
                other => output::print_ack(mode, &other),
            }
        }
        AgentCommand::Drain { id } => {
            let response = client.expect_ok(Request::SetAgentDrain { id, drain: true }).await?;
            output::print_ack(mode, &response)
        }
        AgentCommand::Undrain { id } => {
            let response = client.expect_ok(Request::SetAgentDrain { id, drain: false }).await?;
            output::print_ack(mode, &response)
        }
        AgentCommand::Reboot { id, reason } => {
            let response = client.expect_ok(Request::RebootAgent { id, reason }).await?;
            output::print_ack(mode, &response)
        }
    }
}
