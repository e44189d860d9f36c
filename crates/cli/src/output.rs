// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting: compact tables by default, raw JSON on demand.

use anyhow::Result;
use sc_wire::{AgentSummary, JobSummary, Response};
use serde::Serialize;

#[derive(Clone, Copy)]
pub struct Mode {
    pub json: bool,
}

impl Mode {
    /// Print a serializable value as JSON (the `--json` escape hatch).
    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

pub fn print_jobs(mode: Mode, jobs: &[JobSummary]) -> Result<()> {
    if mode.json {
        return mode.print_json(&jobs);
    }
    if jobs.is_empty() {
        println!("no jobs");
        return Ok(());
    }
    println!("{:<26} {:<10} {:<14} {:<8} TITLE", "ID", "STATUS", "AGENT", "VIEWERS");
    for job in jobs {
        println!(
            "{:<26} {:<10} {:<14} {:<8} {}",
            job.id,
            job.status.to_string(),
            job.agent_id.as_deref().unwrap_or("-"),
            job.viewer_count.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
            job.title.as_deref().unwrap_or(&job.name),
        );
    }
    Ok(())
}

pub fn print_agents(mode: Mode, agents: &[AgentSummary]) -> Result<()> {
    if mode.json {
        return mode.print_json(&agents);
    }
    if agents.is_empty() {
        println!("no agents");
        return Ok(());
    }
    println!("{:<16} {:<16} {:<9} {:<6} {:<26}", "ID", "NAME", "STATE", "DRAIN", "CURRENT JOB");
    for agent in agents {
        println!(
            "{:<16} {:<16} {:<9} {:<6} {:<26}",
            agent.id,
            agent.name,
            agent.state.to_string(),
            if agent.drain { "yes" } else { "no" },
            agent.current_job_id.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

/// Default rendering for simple acknowledgment responses.
pub fn print_ack(mode: Mode, response: &Response) -> Result<()> {
    if mode.json {
        return mode.print_json(response);
    }
    match response {
        Response::Ok => println!("ok"),
        Response::Pong => println!("pong"),
        Response::ShuttingDown => println!("daemon shutting down"),
        Response::JobCreated { id, created: true } => println!("created {}", id),
        Response::JobCreated { id, created: false } => {
            println!("{} (already exists for this idempotency key)", id)
        }
        Response::Status { uptime_secs, jobs_active, agents_online } => {
            println!(
                "up {}s, {} active job(s), {} agent(s) online",
                uptime_secs, jobs_active, agents_online
            );
        }
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}
