// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types.

use thiserror::Error;

/// Errors surfaced by runtime event handling.
///
/// State errors (illegal command for the current status) are NOT here: they
/// are rejected synchronously at the listener with a structured response
/// and never reach the engine. A `RuntimeError` is an internal fault.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("agent not found: {0}")]
    AgentNotFound(String),

    #[error("effect execution failed: {0}")]
    Execute(#[from] super::ExecuteError),
}
