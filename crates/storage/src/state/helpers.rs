// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared lookup helpers for materialized state.

use std::collections::HashMap;

/// Find a value by exact key or unique key prefix.
///
/// Exact matches win; a prefix that matches more than one key is ambiguous
/// and returns `None`.
pub(crate) fn find_by_prefix<'a, V>(map: &'a HashMap<String, V>, id: &str) -> Option<&'a V> {
    if let Some(value) = map.get(id) {
        return Some(value);
    }
    let mut matches = map.iter().filter(|(key, _)| key.starts_with(id));
    let (_, first) = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    Some(first)
}
