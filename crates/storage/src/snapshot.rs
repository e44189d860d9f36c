// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-in-time state snapshots.
//!
//! A snapshot is the materialized state at a WAL sequence number, stored as
//! zstd-compressed JSON. Recovery loads the snapshot and replays only the
//! WAL entries after its `seq`.

use crate::state::MaterializedState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

/// Bump when the snapshot schema changes incompatibly; older versions are
/// discarded and rebuilt from the WAL.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

const ZSTD_LEVEL: i32 = 3;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Materialized state captured at a WAL sequence number.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    /// WAL sequence this snapshot covers (entries <= seq are folded in)
    pub seq: u64,
    pub taken_at: DateTime<Utc>,
    pub state: MaterializedState,
}

impl Snapshot {
    pub fn new(seq: u64, state: MaterializedState) -> Self {
        Self { version: CURRENT_SNAPSHOT_VERSION, seq, taken_at: Utc::now(), state }
    }

    /// Write atomically: serialize to a sibling tmp file, then rename.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        {
            let file = File::create(&tmp)?;
            let encoder = zstd::stream::Encoder::new(BufWriter::new(file), ZSTD_LEVEL)?;
            let mut encoder = encoder.auto_finish();
            serde_json::to_writer(&mut encoder, self)?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Load a snapshot if one exists and its version is current.
///
/// A corrupt or version-mismatched snapshot is treated as absent (the WAL
/// is the source of truth); the broken file is left in place for debugging.
pub fn load_snapshot(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let decoder = match zstd::stream::Decoder::new(BufReader::new(file)) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable snapshot, rebuilding from WAL");
            return Ok(None);
        }
    };
    match serde_json::from_reader::<_, Snapshot>(decoder) {
        Ok(snapshot) if snapshot.version == CURRENT_SNAPSHOT_VERSION => Ok(Some(snapshot)),
        Ok(snapshot) => {
            tracing::warn!(
                version = snapshot.version,
                "snapshot version mismatch, rebuilding from WAL"
            );
            Ok(None)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "corrupt snapshot, rebuilding from WAL");
            Ok(None)
        }
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
