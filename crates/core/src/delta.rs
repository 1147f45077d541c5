// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delta computation between two captures
//!
//! Pure functions. Outputs are ordered deterministically: component rows by
//! qualified type, tech rows by identifier, object rows by `(index, version)`.

use crate::payload;
use crate::row::{BaselineRow, DeltaOp, DeltaRow, OwnedObject, RowHeader};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Property-name fragments whose integer values count as identifiers
pub const IDENTIFIER_HINTS: &[&str] = &["guid", "prefab", "tech", "unlock"];

fn index_by_type(rows: &[BaselineRow]) -> BTreeMap<&str, &BaselineRow> {
    rows.iter()
        .filter(|r| !r.qualified_type.trim().is_empty())
        .map(|r| (r.qualified_type.as_str(), r))
        .collect()
}

/// One `changed` row per qualified type whose existence or payload differs
pub fn component_delta(pre: &[BaselineRow], post: &[BaselineRow]) -> Vec<DeltaRow> {
    let before = index_by_type(pre);
    let after = index_by_type(post);
    let keys: BTreeSet<&str> = before.keys().chain(after.keys()).copied().collect();

    let mut rows = Vec::new();
    for key in keys {
        let b = before.get(key);
        let a = after.get(key);
        let b_payload = b.map(|r| r.payload.as_str()).unwrap_or_default();
        let a_payload = a.map(|r| r.payload.as_str()).unwrap_or_default();
        let b_existed = b.is_some_and(|r| r.existed);
        let a_existed = a.is_some_and(|r| r.existed);
        if b_existed == a_existed && b_payload == a_payload {
            continue;
        }

        let type_name = [a, b]
            .into_iter()
            .flatten()
            .map(|r| r.type_name.as_str())
            .find(|n| !n.is_empty())
            .unwrap_or(key);
        rows.push(DeltaRow::changed(type_name, b_payload, a_payload));
    }
    rows
}

/// One `opened` row per identifier present after but not before
///
/// Identifiers are integer JSON values under a property whose name contains
/// one of [`IDENTIFIER_HINTS`]. Array elements inherit the enclosing
/// property's name. Payloads that fail to decode contribute nothing.
pub fn opened_tech(pre: &[BaselineRow], post: &[BaselineRow]) -> Vec<DeltaRow> {
    let before = identifier_set(pre);
    identifier_set(post)
        .difference(&before)
        .map(|&id| DeltaRow::opened(id))
        .collect()
}

fn identifier_set(rows: &[BaselineRow]) -> BTreeSet<i64> {
    let mut ids = BTreeSet::new();
    for row in rows {
        let json = payload::decode(&row.payload);
        if json.is_empty() {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(&json) {
            collect_identifiers(&value, "", &mut ids);
        }
    }
    ids
}

fn collect_identifiers(value: &Value, property: &str, ids: &mut BTreeSet<i64>) {
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                collect_identifiers(child, name, ids);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_identifiers(item, property, ids);
            }
        }
        Value::Number(n) => {
            let name = property.to_lowercase();
            if IDENTIFIER_HINTS.iter().any(|h| name.contains(h)) {
                if let Some(id) = n.as_i64() {
                    ids.insert(id);
                }
            }
        }
        _ => {}
    }
}

fn index_objects(objects: &[OwnedObject]) -> BTreeMap<(i32, i32), &OwnedObject> {
    objects.iter().map(|o| (o.identity(), o)).collect()
}

/// Created, removed and prefab-changed rows for owned objects
pub fn entity_delta(pre: &[OwnedObject], post: &[OwnedObject]) -> Vec<DeltaRow> {
    let before = index_objects(pre);
    let after = index_objects(post);

    let mut rows = Vec::new();
    for (key, current) in &after {
        match before.get(key) {
            None => rows.push(DeltaRow::owned(DeltaOp::Created, current)),
            Some(previous) if previous.prefab_id != current.prefab_id => {
                let mut row = DeltaRow::owned(DeltaOp::PrefabChanged, current);
                row.before_payload = payload::encode(&previous.prefab_id.to_string());
                row.after_payload = payload::encode(&current.prefab_id.to_string());
                rows.push(row);
            }
            Some(_) => {}
        }
    }
    for (key, previous) in &before {
        if !after.contains_key(key) {
            rows.push(DeltaRow::owned(DeltaOp::Removed, previous));
        }
    }
    rows
}

/// Copy the shared header onto every row
pub fn stamp(rows: &mut [DeltaRow], header: &RowHeader) {
    for row in rows {
        row.header = header.clone();
    }
}

#[cfg(test)]
#[path = "delta_tests.rs"]
mod tests;
