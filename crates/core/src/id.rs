// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subject keys and snapshot identifiers

use chrono::{DateTime, Utc};

/// Separator between display name and identity in a composite key
pub const COMPOSITE_SEPARATOR: char = '|';

/// Normalize a display name for use as a key
///
/// Trims whitespace. An empty name falls back to the identity's digits.
pub fn normalize_name(name: &str, id: u64) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        id.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Composite key used when the bare name belongs to another identity
pub fn composite_key(name: &str, id: u64) -> String {
    format!("{}{}{}", normalize_name(name, id), COMPOSITE_SEPARATOR, id)
}

/// Build a snapshot identifier: `<yyyyMMddHHmmssfff>_<name>_<id>`
pub fn snapshot_id(name: &str, id: u64, at: DateTime<Utc>) -> String {
    let safe = normalize_name(name, id).replace(COMPOSITE_SEPARATOR, "_");
    format!("{}_{}_{}", at.format("%Y%m%d%H%M%S%3f"), safe, id)
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
