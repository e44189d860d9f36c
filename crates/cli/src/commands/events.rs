// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sc events`: follow the live event feed.

use crate::client::Client;
use crate::output::Mode;
use anyhow::Result;
use sc_wire::{Request, Response};
use std::path::Path;

pub async fn run(socket: &Path, mode: Mode) -> Result<()> {
    let mut client = Client::connect(socket).await?;
    let response = client.expect_ok(Request::Subscribe).await?;
    if !matches!(response, Response::Subscribed) {
        anyhow::bail!("unexpected response to subscribe: {:?}", response);
    }

    loop {
        match client.next_event().await {
            Ok(Response::Event { event }) => {
                if mode.json {
                    mode.print_json(&event)?;
                } else {
                    println!("{}", event.log_summary());
                }
            }
            Ok(other) => {
                anyhow::bail!("unexpected frame on event feed: {:?}", other);
            }
            // Daemon went away; the feed is over
            Err(_) => return Ok(()),
        }
    }
}
