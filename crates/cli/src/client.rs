// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket client for the console protocol.

use anyhow::{anyhow, bail, Context, Result};
use sc_wire::{decode, encode, read_message, write_message, Request, Response};
use std::path::{Path, PathBuf};
use tokio::net::UnixStream;

/// Connection to the daemon's console socket.
pub struct Client {
    stream: UnixStream,
}

impl Client {
    pub async fn connect(socket_path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(socket_path).await.with_context(|| {
            format!(
                "cannot reach the daemon at {} (is scd running?)",
                socket_path.display()
            )
        })?;
        Ok(Self { stream })
    }

    /// Send one request and wait for its response.
    pub async fn request(&mut self, request: Request) -> Result<Response> {
        write_message(&mut self.stream, &encode(&request)?).await?;
        let frame = read_message(&mut self.stream).await?;
        Ok(decode(&frame)?)
    }

    /// Send one request; treat an Error response as a failure.
    pub async fn expect_ok(&mut self, request: Request) -> Result<Response> {
        match self.request(request).await? {
            Response::Error { message } => bail!("{}", message),
            response => Ok(response),
        }
    }

    /// Read the next event frame on a subscribed connection.
    pub async fn next_event(&mut self) -> Result<Response> {
        let frame = read_message(&mut self.stream).await?;
        Ok(decode(&frame)?)
    }
}

/// Socket path from the daemon's own configuration (env-aware).
pub fn default_socket_path() -> Result<PathBuf> {
    let config = sc_daemon::Config::load()
        .map_err(|e| anyhow!("cannot locate daemon state dir: {}", e))?;
    Ok(config.socket_path)
}
