// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic snapshotting with WAL truncation.

use crate::snapshot::{Snapshot, SnapshotError};
use crate::state::MaterializedState;
use crate::wal::{Wal, WalError};
use std::path::PathBuf;
use thiserror::Error;

/// Snapshot after this many processed events since the last checkpoint.
const CHECKPOINT_EVERY: u64 = 500;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Wal(#[from] WalError),
}

/// Writes snapshots and truncates the WAL behind them.
pub struct Checkpointer {
    snapshot_path: PathBuf,
    last_checkpoint_seq: u64,
}

impl Checkpointer {
    pub fn new(snapshot_path: PathBuf, starting_seq: u64) -> Self {
        Self { snapshot_path, last_checkpoint_seq: starting_seq }
    }

    /// Checkpoint if enough events have been processed since the last one.
    ///
    /// Returns true when a snapshot was written.
    pub fn maybe_checkpoint(
        &mut self,
        wal: &mut Wal,
        state: &MaterializedState,
    ) -> Result<bool, CheckpointError> {
        let seq = wal.processed_seq();
        if seq < self.last_checkpoint_seq + CHECKPOINT_EVERY {
            return Ok(false);
        }
        self.checkpoint(wal, state)?;
        Ok(true)
    }

    /// Unconditionally snapshot the current state and truncate the WAL.
    pub fn checkpoint(
        &mut self,
        wal: &mut Wal,
        state: &MaterializedState,
    ) -> Result<(), CheckpointError> {
        let seq = wal.processed_seq();
        wal.flush()?;
        Snapshot::new(seq, state.clone()).save(&self.snapshot_path)?;
        wal.truncate_before(seq + 1)?;
        self.last_checkpoint_seq = seq;
        tracing::info!(seq, "checkpoint written, WAL truncated");
        Ok(())
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
