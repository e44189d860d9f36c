// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sc job`: stream job lifecycle commands.

use crate::client::Client;
use crate::output::{self, Mode};
use anyhow::Result;
use clap::Subcommand;
use sc_core::{MetadataPatch, RestartPolicy, StreamConfig};
use sc_wire::{Request, Response};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Subcommand)]
pub enum JobCommand {
    /// Create a stream job
    Create {
        /// Caller-supplied dedup token; retrying with the same key
        /// returns the existing job
        #[arg(long)]
        idempotency_key: String,

        /// Display name for the broadcast
        name: String,

        /// Platform ingest key
        #[arg(long)]
        stream_key: String,

        /// Initial broadcast title
        #[arg(long)]
        title: Option<String>,

        /// Initial broadcast description
        #[arg(long)]
        description: Option<String>,

        /// Extra config entries for the agent pipeline (key=value)
        #[arg(long = "set", value_parser = parse_key_value)]
        extra: Vec<(String, String)>,

        /// Reassign automatically if the agent disconnects
        #[arg(long)]
        restart_on_failure: bool,

        /// Cancel if not accepted by this epoch-ms deadline
        #[arg(long)]
        expires_at_ms: Option<u64>,
    },

    /// List jobs
    List {
        /// Include dismissed terminal jobs
        #[arg(long)]
        all: bool,
    },

    /// Show one job (unique id prefix accepted)
    Show { id: String },

    /// Stop a job (cancels it if no agent accepted it yet)
    Stop {
        id: String,
        #[arg(long)]
        reason: Option<String>,
    },

    /// Pause a running job
    Pause { id: String },
    /// Unpause a running job
    Unpause { id: String },
    /// Mute a running job
    Mute { id: String },
    /// Unmute a running job
    Unmute { id: String },

    /// Acknowledge a terminal job's outcome
    Dismiss { id: String },

    /// Remove a terminal job from the store
    Delete { id: String },

    /// Update broadcast title/description
    Meta {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
}

pub async fn run(command: JobCommand, socket: &Path, mode: Mode) -> Result<()> {
    let mut client = Client::connect(socket).await?;
    match command {
        JobCommand::Create {
            idempotency_key,
            name,
            stream_key,
            title,
            description,
            extra,
            restart_on_failure,
            expires_at_ms,
        } => {
            let stream = StreamConfig {
                stream_key,
                name: name.clone(),
                title,
                description,
                extra: extra.into_iter().collect::<BTreeMap<_, _>>(),
            };
            let response = client
                .expect_ok(Request::CreateJob {
                    idempotency_key,
                    name,
                    stream,
                    restart_policy: if restart_on_failure {
                        RestartPolicy::OnFailure
                    } else {
                        RestartPolicy::Never
                    },
                    expires_at_ms,
                })
                .await?;
            output::print_ack(mode, &response)
        }

        JobCommand::List { all } => {
            let response = client.expect_ok(Request::ListJobs { include_dismissed: all }).await?;
            match response {
                Response::Jobs { jobs } => output::print_jobs(mode, &jobs),
                other => output::print_ack(mode, &other),
            }
        }

        JobCommand::Show { id } => {
            let response = client.expect_ok(Request::GetJob { id: id.clone() }).await?;
            match response {
                Response::Job { job: Some(job) } => mode.print_json(&job),
                Response::Job { job: None } => {
                    anyhow::bail!("job not found: {}", id)
                }
                other => output::print_ack(mode, &other),
            }
        }

        JobCommand::Stop { id, reason } => {
            let response = client.expect_ok(Request::StopJob { id, reason }).await?;
            output::print_ack(mode, &response)
        }
        JobCommand::Pause { id } => {
            let response = client.expect_ok(Request::PauseJob { id }).await?;
            output::print_ack(mode, &response)
        }
        JobCommand::Unpause { id } => {
            let response = client.expect_ok(Request::UnpauseJob { id }).await?;
            output::print_ack(mode, &response)
        }
        JobCommand::Mute { id } => {
            let response = client.expect_ok(Request::MuteJob { id }).await?;
            output::print_ack(mode, &response)
        }
        JobCommand::Unmute { id } => {
            let response = client.expect_ok(Request::UnmuteJob { id }).await?;
            output::print_ack(mode, &response)
        }
        JobCommand::Dismiss { id } => {
            let response = client.expect_ok(Request::DismissJob { id }).await?;
            output::print_ack(mode, &response)
        }
        JobCommand::Delete { id } => {
            let response = client.expect_ok(Request::DeleteJob { id }).await?;
            output::print_ack(mode, &response)
        }

        JobCommand::Meta { id, title, description } => {
            let mut patch = MetadataPatch::default();
            if let Some(title) = title {
                patch = patch.title(title);
            }
            if let Some(description) = description {
                patch = patch.description(description);
            }
            if patch.is_empty() {
                anyhow::bail!("nothing to update: pass --title and/or --description");
            }
            let response = client.expect_ok(Request::UpdateJobMetadata { id, patch }).await?;
            output::print_ack(mode, &response)
        }
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_key_value_splits_on_first_equals() {
        assert_eq!(
            parse_key_value("obs.scene=Main Scene").unwrap(),
            ("obs.scene".to_string(), "Main Scene".to_string())
        );
        assert_eq!(
            parse_key_value("a=b=c").unwrap(),
            ("a".to_string(), "b=c".to_string())
        );
        assert!(parse_key_value("no-equals").is_err());
    }
}
