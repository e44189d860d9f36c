// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime stream metadata pushed up from agents.
//!
//! Each field carries its own last-writer-wins timestamp: updates from the
//! agent (viewer count, URLs) and from the operator console (title,
//! description) interleave, and a stale write must never clobber a newer one.

use serde::{Deserialize, Serialize};

/// A value with the epoch-ms timestamp of its last write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamped<T> {
    pub value: T,
    pub updated_at_ms: u64,
}

impl<T> Stamped<T> {
    pub fn new(value: T, updated_at_ms: u64) -> Self {
        Self { value, updated_at_ms }
    }
}

/// Merged view of a job's runtime metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Stamped<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Stamped<String>>,
    /// Public watch URL on the video platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<Stamped<String>>,
    /// Platform admin/dashboard URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_url: Option<Stamped<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer_count: Option<Stamped<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<Stamped<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<Stamped<bool>>,
    /// Epoch ms at which the agent will stop the stream on its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_stop_at_ms: Option<Stamped<u64>>,
}

/// Partial metadata update, timestamped as a whole.
///
/// `None` fields are "no change". Patches coalesce: merging two patches
/// keeps the newer timestamp and overlays the newer patch's set fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataPatch {
    pub ts_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_stop_at_ms: Option<u64>,
}

impl MetadataPatch {
    pub fn at(ts_ms: u64) -> Self {
        Self { ts_ms, ..Self::default() }
    }

    crate::setters! {
        option {
            title: String,
            description: String,
            public_url: String,
            admin_url: String,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.public_url.is_none()
            && self.admin_url.is_none()
            && self.viewer_count.is_none()
            && self.paused.is_none()
            && self.muted.is_none()
            && self.auto_stop_at_ms.is_none()
    }

    /// Overlay `newer` onto this patch (debounce coalescing).
    pub fn absorb(&mut self, newer: MetadataPatch) {
        self.ts_ms = self.ts_ms.max(newer.ts_ms);
        if newer.title.is_some() {
            self.title = newer.title;
        }
        if newer.description.is_some() {
            self.description = newer.description;
        }
        if newer.public_url.is_some() {
            self.public_url = newer.public_url;
        }
        if newer.admin_url.is_some() {
            self.admin_url = newer.admin_url;
        }
        if newer.viewer_count.is_some() {
            self.viewer_count = newer.viewer_count;
        }
        if newer.paused.is_some() {
            self.paused = newer.paused;
        }
        if newer.muted.is_some() {
            self.muted = newer.muted;
        }
        if newer.auto_stop_at_ms.is_some() {
            self.auto_stop_at_ms = newer.auto_stop_at_ms;
        }
    }
}

fn apply_field<T>(slot: &mut Option<Stamped<T>>, incoming: Option<T>, ts_ms: u64) {
    if let Some(value) = incoming {
        match slot {
            Some(current) if current.updated_at_ms > ts_ms => {}
            _ => *slot = Some(Stamped::new(value, ts_ms)),
        }
    }
}

impl StreamMetadata {
    /// Apply a patch, last-writer-wins per field.
    ///
    /// A field only moves if the patch timestamp is >= the field's current
    /// timestamp; equal timestamps favor the incoming write so replays of
    /// the same event stay idempotent.
    pub fn apply(&mut self, patch: &MetadataPatch) {
        let ts = patch.ts_ms;
        apply_field(&mut self.title, patch.title.clone(), ts);
        apply_field(&mut self.description, patch.description.clone(), ts);
        apply_field(&mut self.public_url, patch.public_url.clone(), ts);
        apply_field(&mut self.admin_url, patch.admin_url.clone(), ts);
        apply_field(&mut self.viewer_count, patch.viewer_count, ts);
        apply_field(&mut self.paused, patch.paused, ts);
        apply_field(&mut self.muted, patch.muted, ts);
        apply_field(&mut self.auto_stop_at_ms, patch.auto_stop_at_ms, ts);
    }

    /// Flatten into a patch carrying every set field, stamped with the
    /// newest per-field timestamp (used to seed an agent at assignment).
    pub fn to_patch(&self) -> MetadataPatch {
        let mut patch = MetadataPatch::default();
        let mut ts = 0;
        macro_rules! take {
            ($field:ident, $clone:expr) => {
                if let Some(ref stamped) = self.$field {
                    patch.$field = Some($clone(stamped));
                    ts = ts.max(stamped.updated_at_ms);
                }
            };
        }
        take!(title, |s: &Stamped<String>| s.value.clone());
        take!(description, |s: &Stamped<String>| s.value.clone());
        take!(public_url, |s: &Stamped<String>| s.value.clone());
        take!(admin_url, |s: &Stamped<String>| s.value.clone());
        take!(viewer_count, |s: &Stamped<u64>| s.value);
        take!(paused, |s: &Stamped<bool>| s.value);
        take!(muted, |s: &Stamped<bool>| s.value);
        take!(auto_stop_at_ms, |s: &Stamped<u64>| s.value);
        patch.ts_ms = ts;
        patch
    }

    pub fn is_paused(&self) -> bool {
        self.paused.as_ref().map(|s| s.value).unwrap_or(false)
    }

    pub fn is_muted(&self) -> bool {
        self.muted.as_ref().map(|s| s.value).unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
