// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::snapshot::load_snapshot;
use sc_core::{Event, JobId};
use tempfile::tempdir;

fn queued(n: u64) -> Event {
    Event::JobQueued { id: JobId::from_string(format!("job-{}", n)), at_ms: n }
}

#[test]
fn checkpoint_snapshots_and_truncates() {
    let dir = tempdir().unwrap();
    let wal_path = dir.path().join("events.wal");
    let snapshot_path = dir.path().join("snapshot.zst");

    let mut wal = Wal::open(&wal_path, 0).unwrap();
    for n in 0..5 {
        let seq = wal.append(&queued(n)).unwrap();
        wal.mark_processed(seq);
    }
    wal.flush().unwrap();

    let mut checkpointer = Checkpointer::new(snapshot_path.clone(), 0);
    checkpointer.checkpoint(&mut wal, &MaterializedState::default()).unwrap();

    let snapshot = load_snapshot(&snapshot_path).unwrap().unwrap();
    assert_eq!(snapshot.seq, 5);

    // All covered entries are gone from the log
    assert!(wal.entries_after(0).unwrap().is_empty());
}

#[test]
fn maybe_checkpoint_waits_for_threshold() {
    let dir = tempdir().unwrap();
    let wal_path = dir.path().join("events.wal");
    let snapshot_path = dir.path().join("snapshot.zst");

    let mut wal = Wal::open(&wal_path, 0).unwrap();
    let seq = wal.append(&queued(1)).unwrap();
    wal.mark_processed(seq);

    let mut checkpointer = Checkpointer::new(snapshot_path.clone(), 0);
    assert!(!checkpointer.maybe_checkpoint(&mut wal, &MaterializedState::default()).unwrap());
    assert!(!snapshot_path.exists());
}

#[test]
fn unprocessed_tail_survives_checkpoint() {
    let dir = tempdir().unwrap();
    let wal_path = dir.path().join("events.wal");
    let snapshot_path = dir.path().join("snapshot.zst");

    let mut wal = Wal::open(&wal_path, 0).unwrap();
    let seq = wal.append(&queued(1)).unwrap();
    wal.mark_processed(seq);
    // Appended but not yet processed
    wal.append(&queued(2)).unwrap();
    wal.flush().unwrap();

    let mut checkpointer = Checkpointer::new(snapshot_path, 0);
    checkpointer.checkpoint(&mut wal, &MaterializedState::default()).unwrap();

    let remaining = wal.entries_after(0).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].seq, 2);
}
