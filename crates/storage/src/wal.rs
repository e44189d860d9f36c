// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only write-ahead log of events.
//!
//! One JSON object per line: `{"seq": N, "event": {...}}`. Sequence numbers
//! are assigned at append time and never reused. A corrupt tail (partial
//! write from a crash) must never take recovery down with it: on open the
//! valid prefix is preserved and the corrupt file rotated to `.bak`.

use sc_core::Event;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Flush after this many buffered entries even if the interval has not passed.
const FLUSH_THRESHOLD: usize = 100;

/// Flush at least this often while entries are buffered.
const FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// How many rotated `.bak` files to keep around after corruption.
const MAX_BACKUPS: u32 = 3;

/// Errors from WAL operations.
#[derive(Debug, Error)]
pub enum WalError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One persisted event with its sequence number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

/// Append-only event log.
pub struct Wal {
    path: PathBuf,
    writer: BufWriter<File>,
    /// All entries known this session (loaded at open + appended since)
    entries: Vec<WalEntry>,
    /// Highest sequence number ever assigned
    write_seq: u64,
    /// Highest sequence number the engine has fully processed
    processed_seq: u64,
    /// Read cursor for `next_unprocessed`
    read_seq: u64,
    /// Entries appended since the last flush
    unflushed: usize,
    last_flush: Instant,
}

impl Wal {
    /// Open (or create) a WAL, resuming after `processed_seq`.
    ///
    /// A corrupt file is rotated to `.bak` (keeping up to 3 backups) and
    /// rewritten with only its valid prefix.
    pub fn open(path: &Path, processed_seq: u64) -> Result<Self, WalError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let (entries, corrupt) = read_entries(path)?;
        if corrupt {
            rotate_backups(path)?;
            rewrite(path, &entries)?;
        }

        let write_seq = entries.last().map(|e| e.seq).unwrap_or(0);
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            entries,
            write_seq,
            processed_seq,
            read_seq: processed_seq,
            unflushed: 0,
            last_flush: Instant::now(),
        })
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    /// Append an event, assigning the next sequence number.
    ///
    /// The entry is buffered; call [`flush`](Self::flush) to make it
    /// durable before acknowledging the mutation to a caller.
    pub fn append(&mut self, event: &Event) -> Result<u64, WalError> {
        self.write_seq += 1;
        let entry = WalEntry { seq: self.write_seq, event: event.clone() };
        let line = serde_json::to_string(&entry)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.entries.push(entry);
        self.unflushed += 1;
        Ok(self.write_seq)
    }

    /// Flush buffered entries to the OS and fsync.
    pub fn flush(&mut self) -> Result<(), WalError> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.unflushed = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    /// Whether enough entries or time has accumulated to warrant a flush.
    pub fn needs_flush(&self) -> bool {
        self.unflushed > 0
            && (self.unflushed >= FLUSH_THRESHOLD || self.last_flush.elapsed() >= FLUSH_INTERVAL)
    }

    /// Next entry after the read cursor, advancing the cursor.
    ///
    /// Returns `Ok(None)` when caught up. Entries that never made it into
    /// this session's log (e.g. a corrupt tail written by another handle)
    /// are invisible here; recovery handles those via [`entries_after`].
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry>, WalError> {
        let next = self.entries.iter().find(|e| e.seq > self.read_seq).cloned();
        if let Some(ref entry) = next {
            self.read_seq = entry.seq;
        }
        Ok(next)
    }

    /// Record that the engine has fully processed up to `seq`.
    pub fn mark_processed(&mut self, seq: u64) {
        self.processed_seq = self.processed_seq.max(seq);
    }

    /// Read entries with seq > `after` from disk, stopping at the first
    /// corrupt line.
    pub fn entries_after(&self, after: u64) -> Result<Vec<WalEntry>, WalError> {
        let (entries, _corrupt) = read_entries(&self.path)?;
        Ok(entries.into_iter().filter(|e| e.seq > after).collect())
    }

    /// Drop entries with seq < `before` from the on-disk log (after a
    /// snapshot has made them redundant).
    pub fn truncate_before(&mut self, before: u64) -> Result<(), WalError> {
        self.writer.flush()?;
        self.entries.retain(|e| e.seq >= before);
        rewrite(&self.path, &self.entries)?;
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.writer = BufWriter::new(file);
        self.unflushed = 0;
        Ok(())
    }
}

/// Read all parseable entries from the start of the file.
///
/// Returns `(entries, corrupt)` where `corrupt` is true when a line failed
/// to parse (binary data, partial write); reading stops there.
fn read_entries(path: &Path) -> Result<(Vec<WalEntry>, bool), WalError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), false)),
        Err(e) => return Err(e.into()),
    };

    let mut entries = Vec::new();
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            break;
        }
        let line = match std::str::from_utf8(&buf) {
            Ok(s) => s.trim(),
            Err(_) => return Ok((entries, true)),
        };
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<WalEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(_) => return Ok((entries, true)),
        }
    }
    Ok((entries, false))
}

/// Rotate `path` into the `.bak` chain: .bak.2 -> .bak.3, .bak -> .bak.2,
/// path -> .bak. The oldest backup falls off the end.
fn rotate_backups(path: &Path) -> Result<(), WalError> {
    tracing::warn!(path = %path.display(), "corrupt WAL detected, rotating to .bak");
    for i in (2..=MAX_BACKUPS).rev() {
        let from = if i == 2 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{}", i - 1))
        };
        let to = path.with_extension(format!("bak.{}", i));
        if from.exists() {
            std::fs::rename(&from, &to)?;
        }
    }
    std::fs::rename(path, path.with_extension("bak"))?;
    Ok(())
}

/// Rewrite the log file to contain exactly `entries`.
fn rewrite(path: &Path, entries: &[WalEntry]) -> Result<(), WalError> {
    let tmp = path.with_extension("tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        for entry in entries {
            let line = serde_json::to_string(entry)?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        writer.get_ref().sync_data()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
