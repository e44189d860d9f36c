// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment knobs and protocol constants.

use std::time::Duration;

/// Console protocol version exchanged in the Hello handshake.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Override the state directory (default: `~/.local/state/stagecast`).
pub const ENV_STATE_DIR: &str = "SC_STATE_DIR";

/// Shared secret agents must present at hello (overrides the config file).
pub const ENV_AUTH_TOKEN: &str = "SC_AUTH_TOKEN";

/// Override the TCP bind address for agent connections.
pub const ENV_AGENT_BIND: &str = "SC_AGENT_BIND";

/// How long a console request handler may run before the connection is
/// considered wedged.
pub fn ipc_timeout() -> Duration {
    Duration::from_secs(30)
}
