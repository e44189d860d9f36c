// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage layer for the stagecast orchestrator.
//!
//! Durability model: every non-transient event is appended to the WAL and
//! flushed before the command that caused it is acknowledged. State is the
//! deterministic fold of those events; snapshots only shorten replay.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod checkpoint;
mod snapshot;
mod state;
mod wal;

pub use checkpoint::{CheckpointError, Checkpointer};
pub use snapshot::{load_snapshot, Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::MaterializedState;
pub use wal::{Wal, WalEntry, WalError};
