// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: state-dir layout, config file, env overrides.

use crate::engine::RuntimeSettings;
use crate::env::{ENV_AGENT_BIND, ENV_AUTH_TOKEN, ENV_STATE_DIR};
use serde::Deserialize;
use std::path::PathBuf;

use super::LifecycleError;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/stagecast)
    pub state_dir: PathBuf,
    /// Unix socket for console connections
    pub socket_path: PathBuf,
    /// Lock/PID file
    pub lock_path: PathBuf,
    /// Daemon log file
    pub log_path: PathBuf,
    /// WAL file
    pub wal_path: PathBuf,
    /// Snapshot file
    pub snapshot_path: PathBuf,
    /// File the generated agent token is written to
    pub token_path: PathBuf,
    /// TCP bind address for agent connections
    pub agent_bind: String,
    /// Shared secret agents present at hello
    pub auth_token: Option<String>,
    pub settings: RuntimeSettings,
}

/// Optional `config.toml` in the state directory.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    agent_bind: Option<String>,
    #[serde(default)]
    auth_token: Option<String>,
    #[serde(default)]
    heartbeat_interval_ms: Option<u64>,
    #[serde(default)]
    heartbeat_timeout_ms: Option<u64>,
    #[serde(default)]
    stop_grace_ms: Option<u64>,
    #[serde(default)]
    kill_after_ms: Option<u64>,
    #[serde(default)]
    metadata_debounce_ms: Option<u64>,
}

impl Config {
    /// Load configuration for the user-level daemon.
    ///
    /// Layout lives under `$SC_STATE_DIR`, else `$XDG_STATE_HOME/stagecast`,
    /// else `~/.local/state/stagecast`. One daemon serves the whole fleet.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = state_dir()?;
        Self::load_from(state_dir)
    }

    /// Load with an explicit state directory (tests, --state-dir flag).
    pub fn load_from(state_dir: PathBuf) -> Result<Self, LifecycleError> {
        let file = read_config_file(&state_dir)?;

        let mut settings = RuntimeSettings::default();
        if let Some(v) = file.heartbeat_interval_ms {
            settings.heartbeat_interval_ms = v;
        }
        if let Some(v) = file.heartbeat_timeout_ms {
            settings.heartbeat_timeout_ms = v;
        }
        if let Some(v) = file.stop_grace_ms {
            settings.stop_grace_ms = v;
        }
        if let Some(v) = file.kill_after_ms {
            settings.kill_after_ms = v;
        }
        if let Some(v) = file.metadata_debounce_ms {
            settings.metadata_debounce_ms = v;
        }
        if settings.heartbeat_timeout_ms <= settings.heartbeat_interval_ms {
            return Err(LifecycleError::Config(
                "heartbeat_timeout_ms must exceed heartbeat_interval_ms".to_string(),
            ));
        }

        let agent_bind = std::env::var(ENV_AGENT_BIND)
            .ok()
            .or(file.agent_bind)
            .unwrap_or_else(|| "127.0.0.1:7343".to_string());
        let auth_token = std::env::var(ENV_AUTH_TOKEN).ok().or(file.auth_token);

        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            wal_path: state_dir.join("wal").join("events.wal"),
            snapshot_path: state_dir.join("snapshot.zst"),
            token_path: state_dir.join("agent.token"),
            agent_bind,
            auth_token,
            settings,
            state_dir,
        })
    }
}

fn read_config_file(state_dir: &std::path::Path) -> Result<ConfigFile, LifecycleError> {
    let path = state_dir.join("config.toml");
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ConfigFile::default()),
        Err(e) => return Err(e.into()),
    };
    toml::from_str(&raw)
        .map_err(|e| LifecycleError::Config(format!("{}: {}", path.display(), e)))
}

fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var(ENV_STATE_DIR) {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::state_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| LifecycleError::Config("cannot determine state directory".to_string()))?;
    Ok(if base.ends_with(".local/state") || base.ends_with("state") {
        base.join("stagecast")
    } else {
        base.join(".local/state/stagecast")
    })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
