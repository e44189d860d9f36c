// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! stagecast orchestrator daemon library
//!
//! Exposes the console protocol types and daemon config for CLI clients
//! and integration tests; the `scd` binary wires everything together.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod broadcast;
pub mod engine;
pub mod env;
pub mod event_bus;
pub mod lifecycle;
pub mod listener;
pub mod registry;
pub mod remote;

pub use engine::{AgentLink, Executor, Runtime, RuntimeError, RuntimeSettings};
pub use lifecycle::{startup, Config, DaemonState, LifecycleError};
pub use sc_wire::{AgentSummary, JobDetail, JobSummary, Request, Response};
